//! Job handler protocol.
//!
//! A handler processes one job at a time and reports a [`JobResult`]. Two
//! shapes exist: [`JobHandler`] returns the result directly, while
//! [`CallbackJobHandler`] receives a [`Completion`] and reports later, from
//! any thread or task.

use tokio::sync::oneshot;

use crate::job::{Job, JobId, JobResult};

/// Handler that processes a job and returns its outcome immediately.
///
/// Runs on the queue's processing task, so it should not block for long.
pub trait JobHandler: Send + Sync {
    fn process_job(&self, job: &Job) -> JobResult;
}

/// Handler that reports its outcome through a [`Completion`].
///
/// The queue waits for the completion without blocking a thread. Dropping the
/// completion without calling [`Completion::complete`] is a contract violation.
pub trait CallbackJobHandler: Send + Sync {
    fn process_job(&self, job: Job, completion: Completion);
}

/// One-shot completion for a dispatched job.
///
/// Consumed on use, so the result can be delivered at most once.
#[derive(Debug)]
pub struct Completion {
    job_id: JobId,
    tx: oneshot::Sender<JobResult>,
}

impl Completion {
    /// Create a completion and the receiver the dispatcher waits on.
    pub fn channel(job_id: JobId) -> (Self, oneshot::Receiver<JobResult>) {
        let (tx, rx) = oneshot::channel();
        (Self { job_id, tx }, rx)
    }

    /// The job this completion belongs to.
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Deliver the result. Returns `false` if nobody is waiting any more.
    pub fn complete(self, result: JobResult) -> bool {
        self.tx.send(result).is_ok()
    }
}
