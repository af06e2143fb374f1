//! Storage engine protocol.
//!
//! A job store owns the durable table of pending jobs. Implementations must
//! serialize all mutations with respect to each other.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::job::{FilterAction, Job, JobId};

/// Predicate evaluated against each stored payload by [`JobStore::filter_queue`].
pub type FilterPredicate = Box<dyn Fn(&serde_json::Value) -> FilterAction + Send + 'static>;

/// Durable storage of pending jobs.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new job with zero attempts and return its id.
    async fn create_job(&self, data: &serde_json::Value, task: &str) -> Result<JobId, StorageError>;

    /// Whether any stored job carries the task label.
    async fn job_exists_for_task(&self, task: &str) -> Result<bool, StorageError>;

    /// The oldest stored job.
    async fn fetch_job(&self) -> Result<Option<Job>, StorageError>;

    /// The oldest stored job carrying the task label.
    async fn fetch_job_for_task(&self, task: &str) -> Result<Option<Job>, StorageError>;

    /// Increment the attempt count. A missing id is not an error.
    async fn increment_attempt_for_job(&self, id: JobId) -> Result<(), StorageError>;

    /// Delete a job. A missing id is not an error.
    async fn remove_job(&self, id: JobId) -> Result<(), StorageError>;

    /// Delete every job.
    async fn remove_all_jobs(&self) -> Result<(), StorageError>;

    /// Number of stored jobs.
    async fn fetch_job_count(&self) -> Result<usize, StorageError>;

    /// Visit every stored payload once and delete those the predicate rejects.
    ///
    /// Returns the number of deleted jobs. The whole pass is atomic with
    /// respect to other operations on the same store.
    async fn filter_queue(&self, predicate: FilterPredicate) -> Result<usize, StorageError>;
}
