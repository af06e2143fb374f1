//! Processing loop.
//!
//! At most one loop task exists per queue. It dispatches jobs back to back
//! until storage is empty, the queue is stopped, or something forces a pause.
//! Wake-ups that arrive while the loop is busy are remembered and re-checked
//! whenever a pass ends, whether it ended on empty storage, an error or an
//! offline result, so an enqueue can never be stranded.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use persistq_protocols::{
    CallbackJobHandler, Completion, Job, JobHandler, JobResult, QueueError, QueueEvent,
    StorageError,
};

use crate::queue::QueueInner;

/// Registered handler, held without ownership.
pub(crate) enum HandlerSlot {
    Sync(Weak<dyn JobHandler>),
    Callback(Weak<dyn CallbackJobHandler>),
}

enum LiveHandler {
    Sync(Arc<dyn JobHandler>),
    Callback(Arc<dyn CallbackJobHandler>),
}

impl HandlerSlot {
    fn upgrade(&self) -> Option<LiveHandler> {
        match self {
            Self::Sync(weak) => weak.upgrade().map(LiveHandler::Sync),
            Self::Callback(weak) => weak.upgrade().map(LiveHandler::Callback),
        }
    }
}

impl LiveHandler {
    /// Hand the job over and wait for its result. `None` means the completion
    /// was dropped without a result.
    async fn dispatch(self, job: &Job) -> Option<JobResult> {
        match self {
            Self::Sync(handler) => Some(handler.process_job(job)),
            Self::Callback(handler) => {
                let (completion, rx) = Completion::channel(job.id);
                handler.process_job(job.clone(), completion);
                // The queue must not keep the handler alive while waiting.
                drop(handler);
                rx.await.ok()
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct LoopState {
    pub(crate) running: bool,
    pub(crate) active: Option<Job>,
    /// A loop task exists.
    pub(crate) loop_active: bool,
    /// A trigger arrived while the loop task existed.
    pub(crate) wake_pending: bool,
    pub(crate) backoff_scheduled: bool,
}

enum Flow {
    Continue,
    Offline,
    Violation(QueueError),
}

/// Resets loop bookkeeping when the loop task unwinds mid-pass.
struct LoopGuard {
    inner: Arc<QueueInner>,
    armed: bool,
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let job = self.inner.state.lock().active.take();
        let reason = match job {
            Some(job) => format!("handler panicked while processing job {}", job.id),
            None => "processing loop unwound outside a job".to_string(),
        };

        if self.inner.halt(QueueError::HandlerViolation(reason)) {
            match Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(Arc::clone(&self.inner).run_loop());
                }
                Err(_) => self.inner.state.lock().loop_active = false,
            }
        }
    }
}

impl QueueInner {
    /// Make sure a loop task will look at storage soon.
    pub(crate) fn trigger(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            if !state.running {
                return;
            }
            if state.loop_active {
                state.wake_pending = true;
                return;
            }
            state.loop_active = true;
        }

        tokio::spawn(Arc::clone(self).run_loop());
    }

    async fn run_loop(self: Arc<Self>) {
        let mut guard = LoopGuard {
            inner: Arc::clone(&self),
            armed: true,
        };
        self.run_passes().await;
        guard.armed = false;
    }

    async fn run_passes(self: &Arc<Self>) {
        debug!("Processing loop started");
        let mut dispatched = 0usize;

        loop {
            if !self.begin_pass() {
                debug!("Processing loop stopped");
                return;
            }

            let job = match self.store.fetch_job().await {
                Ok(Some(job)) => job,
                Ok(None) => {
                    if dispatched > 0 {
                        dispatched = 0;
                        info!("Queue drained");
                        self.publish(&QueueEvent::QueueDidDrain);
                    }
                    if !self.resume_pending() {
                        debug!("Processing loop idle");
                        return;
                    }
                    continue;
                }
                Err(StorageError::Corrupt { id, reason }) => {
                    error!("Dropping corrupt job {}: {}", id, reason);
                    if let Err(e) = self.store.remove_job(id).await {
                        if !self.halt(e.into()) {
                            return;
                        }
                    }
                    continue;
                }
                Err(e) => {
                    if !self.halt(e.into()) {
                        return;
                    }
                    continue;
                }
            };

            let handler = self.handler.read().as_ref().and_then(HandlerSlot::upgrade);
            let Some(handler) = handler else {
                if !self.halt(QueueError::HandlerUnavailable) {
                    return;
                }
                continue;
            };

            self.state.lock().active = Some(job.clone());
            dispatched += 1;
            debug!(job_id = %job.id, task = %job.task, attempts = job.attempts, "Dispatching job");

            let flow = match handler.dispatch(&job).await {
                Some(result) => self.apply(job, result).await,
                None => {
                    warn!("Handler dropped the completion for job {}", job.id);
                    let id = job.id;
                    self.publish(&QueueEvent::JobDidFail(job));
                    Ok(Flow::Violation(QueueError::HandlerViolation(format!(
                        "completion for job {} was dropped without a result",
                        id
                    ))))
                }
            };

            self.state.lock().active = None;

            let keep_going = match flow {
                Ok(Flow::Continue) => true,
                Ok(Flow::Offline) => self.pause_offline(),
                Ok(Flow::Violation(err)) => self.halt(err),
                Err(e) => self.halt(e.into()),
            };
            if !keep_going {
                return;
            }
        }
    }

    /// Translate a handler result into storage changes and events.
    async fn apply(&self, job: Job, result: JobResult) -> Result<Flow, StorageError> {
        debug!(job_id = %job.id, result = %result, "Job finished");

        match result {
            JobResult::Success => {
                self.store.remove_job(job.id).await?;
                self.publish(&QueueEvent::JobDidSucceed(job));
            }
            JobResult::Offline => {
                self.publish(&QueueEvent::JobDidFailOffline(job));
                return Ok(Flow::Offline);
            }
            JobResult::Fail => {
                let limit = self.retry_limit.load(Ordering::SeqCst);
                if job.attempts.saturating_add(1) >= limit {
                    warn!("Job {} exhausted {} attempts", job.id, limit);
                    self.store.remove_job(job.id).await?;
                    self.publish(&QueueEvent::JobDidFailCritical(job));
                } else {
                    self.store.increment_attempt_for_job(job.id).await?;
                    let mut job = job;
                    job.attempts += 1;
                    self.publish(&QueueEvent::JobDidFailWillRetry(job));
                }
            }
            JobResult::Critical => {
                self.store.remove_job(job.id).await?;
                self.publish(&QueueEvent::JobDidFailCritical(job));
            }
            JobResult::RemoveSilently => {
                self.store.remove_job(job.id).await?;
            }
            JobResult::Cancel => {
                self.store.remove_job(job.id).await?;
                self.publish(&QueueEvent::JobDidCancel(job));
            }
        }

        Ok(Flow::Continue)
    }

    fn begin_pass(&self) -> bool {
        let mut state = self.state.lock();
        state.wake_pending = false;
        if state.running && state.active.is_none() {
            true
        } else {
            state.loop_active = false;
            false
        }
    }

    /// End of a pass. Returns `true` when a trigger arrived during the pass
    /// and the loop should take another one; otherwise the loop task is
    /// released.
    fn resume_pending(&self) -> bool {
        let mut state = self.state.lock();
        let resume = state.running && state.wake_pending;
        state.wake_pending = false;
        if !resume {
            state.loop_active = false;
        }
        resume
    }

    /// Record the error that stopped the pass. Returns `true` when a trigger
    /// that arrived during the pass keeps the loop going.
    fn halt(&self, err: QueueError) -> bool {
        error!("Processing loop halted: {}", err);
        *self.last_error.lock() = Some(err);

        let resume = self.resume_pending();
        if resume {
            debug!("Trigger arrived during the failed pass, resuming");
        }
        resume
    }

    /// End the pass after an offline result. A trigger that arrived during the
    /// pass resumes at once; otherwise one delayed retry is scheduled.
    fn pause_offline(self: &Arc<Self>) -> bool {
        let schedule = {
            let mut state = self.state.lock();
            if state.running && state.wake_pending {
                state.wake_pending = false;
                debug!("Trigger arrived during the offline pass, resuming");
                return true;
            }
            state.loop_active = false;
            state.wake_pending = false;
            let schedule = self.offline_backoff.is_some() && !state.backoff_scheduled;
            if schedule {
                state.backoff_scheduled = true;
            }
            schedule
        };

        let Some(delay) = self.offline_backoff.filter(|_| schedule) else {
            info!("Queue paused after offline result");
            return false;
        };

        info!("Queue paused after offline result, retrying in {:?}", delay);
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.state.lock().backoff_scheduled = false;
                inner.trigger();
            }
        });
        false
    }
}
