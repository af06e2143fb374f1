//! SQLite job store.
//!
//! Every operation runs on the connection's dedicated thread, so mutations
//! are serialized with respect to each other and to reads.

use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row, params};
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use persistq_protocols::{FilterAction, FilterPredicate, Job, JobId, JobStore, StorageError};

use crate::codec::{StoredJob, decode_payload, encode_payload};
use crate::schema::init_schema;

#[cfg(test)]
#[path = "store_sqlite_tests.rs"]
mod tests;

const SELECT_COLUMNS: &str = "SELECT id, task, data, attempts, stamp FROM queue";

fn db_err(err: tokio_rusqlite::Error) -> StorageError {
    match err {
        tokio_rusqlite::Error::ConnectionClosed => StorageError::ConnectionClosed,
        other => StorageError::Database(other.to_string()),
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StoredJob> {
    Ok(StoredJob {
        id: row.get(0)?,
        task: row.get(1)?,
        data: row.get(2)?,
        attempts: row.get(3)?,
        stamp: row.get(4)?,
    })
}

/// SQLite-backed job store.
pub struct SqliteJobStore {
    conn: Connection,
}

impl SqliteJobStore {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().await.map_err(db_err)?;
        Self::init(conn).await
    }

    /// Open (or create) a file-backed database, creating parent directories.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        debug!("Opening job database at {:?}", path);
        let conn = Connection::open(path).await.map_err(db_err)?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(db_err)?;
        Ok(Self { conn })
    }

    async fn fetch_one(
        &self,
        sql: &'static str,
        task: Option<String>,
    ) -> Result<Option<Job>, StorageError> {
        let stored = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(sql)?;
                let row = match task {
                    Some(task) => stmt.query_row(params![task], read_row).optional()?,
                    None => stmt.query_row([], read_row).optional()?,
                };
                Ok(row)
            })
            .await
            .map_err(db_err)?;

        stored.map(StoredJob::into_job).transpose()
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn create_job(&self, data: &serde_json::Value, task: &str) -> Result<JobId, StorageError> {
        let bytes = encode_payload(data)?;
        let task = task.to_string();

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO queue (task, data) VALUES (?1, ?2)",
                    params![task, bytes],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(db_err)?;

        debug!("Created job {}", id);
        Ok(JobId(id))
    }

    async fn job_exists_for_task(&self, task: &str) -> Result<bool, StorageError> {
        let task = task.to_string();
        self.conn
            .call(move |conn| {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM queue WHERE task = ?1)",
                    params![task],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(db_err)
    }

    async fn fetch_job(&self) -> Result<Option<Job>, StorageError> {
        self.fetch_one(
            "SELECT id, task, data, attempts, stamp FROM queue ORDER BY id ASC LIMIT 1",
            None,
        )
        .await
    }

    async fn fetch_job_for_task(&self, task: &str) -> Result<Option<Job>, StorageError> {
        self.fetch_one(
            "SELECT id, task, data, attempts, stamp FROM queue WHERE task = ?1 ORDER BY id ASC LIMIT 1",
            Some(task.to_string()),
        )
        .await
    }

    async fn increment_attempt_for_job(&self, id: JobId) -> Result<(), StorageError> {
        let changed = self
            .conn
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE queue SET attempts = attempts + 1 WHERE id = ?1",
                    params![id.as_i64()],
                )?)
            })
            .await
            .map_err(db_err)?;

        if changed == 0 {
            warn!("Cannot increment attempts for job {}: not found", id);
        }
        Ok(())
    }

    async fn remove_job(&self, id: JobId) -> Result<(), StorageError> {
        let changed = self
            .conn
            .call(move |conn| {
                Ok(conn.execute("DELETE FROM queue WHERE id = ?1", params![id.as_i64()])?)
            })
            .await
            .map_err(db_err)?;

        debug!("Removed job {} ({} rows)", id, changed);
        Ok(())
    }

    async fn remove_all_jobs(&self) -> Result<(), StorageError> {
        let changed = self
            .conn
            .call(|conn| Ok(conn.execute("DELETE FROM queue", [])?))
            .await
            .map_err(db_err)?;

        debug!("Removed all jobs ({} rows)", changed);
        Ok(())
    }

    async fn fetch_job_count(&self) -> Result<usize, StorageError> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM queue", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
            .map_err(db_err)?;

        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn filter_queue(&self, predicate: FilterPredicate) -> Result<usize, StorageError> {
        let removed = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let doomed = {
                    let mut stmt = tx.prepare(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))?;
                    let rows = stmt.query_map([], read_row)?;

                    let mut doomed = Vec::new();
                    for row in rows {
                        let row = row?;
                        match decode_payload(JobId(row.id), &row.data) {
                            Ok(data) => {
                                if predicate(&data) == FilterAction::Delete {
                                    doomed.push(row.id);
                                }
                            }
                            Err(e) => warn!("Keeping undecodable job during filter: {}", e),
                        }
                    }
                    doomed
                };

                for id in &doomed {
                    tx.execute("DELETE FROM queue WHERE id = ?1", params![id])?;
                }
                tx.commit()?;
                Ok(doomed.len())
            })
            .await
            .map_err(db_err)?;

        debug!("Filter removed {} jobs", removed);
        Ok(removed)
    }
}
