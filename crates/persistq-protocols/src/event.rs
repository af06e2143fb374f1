//! Queue lifecycle events.

use crate::job::Job;

/// An event announced by the queue controller.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    QueueDidStart,
    QueueDidStop,
    /// Storage went from non-empty to empty during a processing pass.
    QueueDidDrain,
    JobDidSucceed(Job),
    JobDidFailOffline(Job),
    /// The job could not be processed and was left in storage.
    JobDidFail(Job),
    JobDidFailCritical(Job),
    /// Carries the job with its attempt count already incremented.
    JobDidFailWillRetry(Job),
    JobDidCancel(Job),
}

impl QueueEvent {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::QueueDidStart => "queue.did_start",
            Self::QueueDidStop => "queue.did_stop",
            Self::QueueDidDrain => "queue.did_drain",
            Self::JobDidSucceed(_) => "job.did_succeed",
            Self::JobDidFailOffline(_) => "job.did_fail_offline",
            Self::JobDidFail(_) => "job.did_fail",
            Self::JobDidFailCritical(_) => "job.did_fail_critical",
            Self::JobDidFailWillRetry(_) => "job.did_fail_will_retry",
            Self::JobDidCancel(_) => "job.did_cancel",
        }
    }

    /// The job this event refers to, if any.
    pub fn job(&self) -> Option<&Job> {
        match self {
            Self::QueueDidStart | Self::QueueDidStop | Self::QueueDidDrain => None,
            Self::JobDidSucceed(job)
            | Self::JobDidFailOffline(job)
            | Self::JobDidFail(job)
            | Self::JobDidFailCritical(job)
            | Self::JobDidFailWillRetry(job)
            | Self::JobDidCancel(job) => Some(job),
        }
    }
}

/// Receiver of queue events.
///
/// Called synchronously from the controller, in emission order. Implementations
/// must not block and must not call back into the queue in a way that waits on
/// the processing loop.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &QueueEvent);
}
