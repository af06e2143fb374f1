//! In-memory job store.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use persistq_protocols::{FilterAction, FilterPredicate, Job, JobId, JobStore, StorageError};

use crate::codec::{StoredJob, decode_payload, encode_payload};

#[derive(Default)]
struct MemoryTable {
    last_id: i64,
    rows: BTreeMap<i64, StoredJob>,
}

/// Non-durable job store for tests and ephemeral queues.
///
/// Payloads are kept encoded, exactly as a durable store would hold them.
#[derive(Default)]
pub struct MemoryJobStore {
    table: RwLock<MemoryTable>,
}

impl MemoryJobStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create_job(&self, data: &serde_json::Value, task: &str) -> Result<JobId, StorageError> {
        let bytes = encode_payload(data)?;
        let mut table = self.table.write().await;
        table.last_id += 1;
        let id = table.last_id;
        table.rows.insert(
            id,
            StoredJob {
                id,
                task: task.to_string(),
                data: bytes,
                attempts: 0,
                stamp: chrono::Utc::now().timestamp(),
            },
        );
        debug!("Created job {}", id);
        Ok(JobId(id))
    }

    async fn job_exists_for_task(&self, task: &str) -> Result<bool, StorageError> {
        let table = self.table.read().await;
        Ok(table.rows.values().any(|row| row.task == task))
    }

    async fn fetch_job(&self) -> Result<Option<Job>, StorageError> {
        let table = self.table.read().await;
        table
            .rows
            .values()
            .next()
            .cloned()
            .map(StoredJob::into_job)
            .transpose()
    }

    async fn fetch_job_for_task(&self, task: &str) -> Result<Option<Job>, StorageError> {
        let table = self.table.read().await;
        table
            .rows
            .values()
            .find(|row| row.task == task)
            .cloned()
            .map(StoredJob::into_job)
            .transpose()
    }

    async fn increment_attempt_for_job(&self, id: JobId) -> Result<(), StorageError> {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&id.as_i64()) {
            Some(row) => row.attempts += 1,
            None => warn!("Cannot increment attempts for job {}: not found", id),
        }
        Ok(())
    }

    async fn remove_job(&self, id: JobId) -> Result<(), StorageError> {
        let mut table = self.table.write().await;
        table.rows.remove(&id.as_i64());
        Ok(())
    }

    async fn remove_all_jobs(&self) -> Result<(), StorageError> {
        let mut table = self.table.write().await;
        table.rows.clear();
        Ok(())
    }

    async fn fetch_job_count(&self) -> Result<usize, StorageError> {
        Ok(self.table.read().await.rows.len())
    }

    async fn filter_queue(&self, predicate: FilterPredicate) -> Result<usize, StorageError> {
        let mut table = self.table.write().await;

        let doomed: Vec<i64> = table
            .rows
            .values()
            .filter(|row| match decode_payload(JobId(row.id), &row.data) {
                Ok(data) => predicate(&data) == FilterAction::Delete,
                Err(e) => {
                    warn!("Keeping undecodable job during filter: {}", e);
                    false
                }
            })
            .map(|row| row.id)
            .collect();

        for id in &doomed {
            table.rows.remove(id);
        }
        Ok(doomed.len())
    }
}
