//! Job record and handler outcome types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Storage-assigned job identifier.
///
/// Identifiers increase strictly in insertion order and are never reused,
/// so ordering by id is FIFO order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl JobId {
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A persisted unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Identifier assigned on insert.
    pub id: JobId,

    /// Label grouping related jobs. Not unique.
    pub task: String,

    /// Opaque payload supplied at enqueue time.
    pub data: serde_json::Value,

    /// Number of soft failures recorded so far.
    pub attempts: u32,

    /// When the job was inserted.
    pub stamp: DateTime<Utc>,
}

impl Job {
    /// Decode the payload into a typed value.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }

    /// Whether the job carries the given task label.
    pub fn is_for_task(&self, task: &str) -> bool {
        self.task == task
    }
}

/// Outcome reported by a handler for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobResult {
    /// Job finished; it is removed.
    Success,
    /// Transient connectivity failure; the job is left untouched.
    Offline,
    /// Soft failure; retried until the retry limit is reached.
    Fail,
    /// Hard failure; the job is removed.
    Critical,
    /// Job is removed without announcing anything.
    RemoveSilently,
    /// Job was cancelled by the handler; it is removed.
    Cancel,
}

impl JobResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Offline => "offline",
            Self::Fail => "fail",
            Self::Critical => "critical",
            Self::RemoveSilently => "remove_silently",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of a filter predicate for one job payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterAction {
    /// Remove the job from storage.
    Delete,
    /// Leave the job in place.
    Keep,
}
