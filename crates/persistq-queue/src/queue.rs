//! Queue controller.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use persistq_config::{Config, QueueConfig, StorageBackend};
use persistq_protocols::{
    CallbackJobHandler, EventSink, FilterAction, Job, JobHandler, JobId, JobStore, QueueError,
    QueueEvent, StorageError,
};

use crate::processor::{HandlerSlot, LoopState};
use crate::sink::{NoopEventSink, TracingEventSink};
use crate::store_memory::MemoryJobStore;
use crate::store_sqlite::SqliteJobStore;

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

/// State shared between the public handle and the processing loop.
pub(crate) struct QueueInner {
    pub(crate) store: Arc<dyn JobStore>,
    pub(crate) events: RwLock<Arc<dyn EventSink>>,
    pub(crate) handler: RwLock<Option<HandlerSlot>>,
    pub(crate) retry_limit: AtomicU32,
    pub(crate) offline_backoff: Option<Duration>,
    pub(crate) state: Mutex<LoopState>,
    pub(crate) last_error: Mutex<Option<QueueError>>,
}

impl QueueInner {
    pub(crate) fn publish(&self, event: &QueueEvent) {
        let sink = Arc::clone(&*self.events.read());
        sink.publish(event);
    }
}

/// Durable serial job queue.
///
/// Jobs are persisted on [`enqueue`](Self::enqueue) and handed to the
/// registered handler one at a time, oldest first, while the queue is running.
/// The handler's [`JobResult`](persistq_protocols::JobResult) decides whether
/// a job is removed, retried or left in place.
///
/// Cloning yields another handle to the same queue. Methods that start
/// processing spawn onto the current Tokio runtime.
#[derive(Clone)]
pub struct JobQueue {
    pub(crate) inner: Arc<QueueInner>,
}

impl JobQueue {
    /// Create a queue over `store`. The queue starts stopped.
    pub fn new(store: Arc<dyn JobStore>, config: &QueueConfig) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                store,
                events: RwLock::new(Arc::new(NoopEventSink)),
                handler: RwLock::new(None),
                retry_limit: AtomicU32::new(config.retry_limit),
                offline_backoff: config.offline_backoff(),
                state: Mutex::new(LoopState::default()),
                last_error: Mutex::new(None),
            }),
        }
    }

    /// Open a queue with the configured storage backend, logging events.
    pub async fn open(config: &Config) -> Result<Self, QueueError> {
        let store: Arc<dyn JobStore> = match config.storage.backend {
            StorageBackend::Sqlite => {
                Arc::new(SqliteJobStore::open(config.storage.resolved_path()).await?)
            }
            StorageBackend::Memory => Arc::new(MemoryJobStore::new()),
        };

        Ok(Self::new(store, &config.queue).with_event_sink(Arc::new(TracingEventSink)))
    }

    pub fn with_event_sink(self, sink: Arc<dyn EventSink>) -> Self {
        self.set_event_sink(sink);
        self
    }

    /// Replace the event sink.
    pub fn set_event_sink(&self, sink: Arc<dyn EventSink>) {
        *self.inner.events.write() = sink;
    }

    /// Register a synchronous handler.
    ///
    /// Only a weak reference is kept; the caller owns the handler. Replaces any
    /// previously registered handler of either shape.
    pub fn set_handler<H: JobHandler + 'static>(&self, handler: &Arc<H>) {
        let weak: Weak<H> = Arc::downgrade(handler);
        let weak: Weak<dyn JobHandler> = weak;
        *self.inner.handler.write() = Some(HandlerSlot::Sync(weak));
        debug!("Registered synchronous job handler");
        self.inner.trigger();
    }

    /// Register a handler that reports through a completion.
    ///
    /// Same ownership and replacement rules as [`set_handler`](Self::set_handler).
    pub fn set_callback_handler<H: CallbackJobHandler + 'static>(&self, handler: &Arc<H>) {
        let weak: Weak<H> = Arc::downgrade(handler);
        let weak: Weak<dyn CallbackJobHandler> = weak;
        *self.inner.handler.write() = Some(HandlerSlot::Callback(weak));
        debug!("Registered callback job handler");
        self.inner.trigger();
    }

    pub fn clear_handler(&self) {
        *self.inner.handler.write() = None;
    }

    /// Persist a job and wake the loop if it is running and idle.
    pub async fn enqueue<T: Serialize + ?Sized>(
        &self,
        data: &T,
        task: &str,
    ) -> Result<JobId, QueueError> {
        let value =
            serde_json::to_value(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let id = self.inner.store.create_job(&value, task).await?;
        debug!("Enqueued job {} for task {}", id, task);
        self.inner.trigger();
        Ok(id)
    }

    /// Start processing. Emits `QueueDidStart` when the queue was stopped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self) {
        let started = {
            let mut state = self.inner.state.lock();
            !std::mem::replace(&mut state.running, true)
        };
        if started {
            info!("Queue started");
            self.inner.publish(&QueueEvent::QueueDidStart);
        }
        self.inner.trigger();
    }

    /// Stop dispatching new jobs. An in-flight job still completes.
    pub fn stop(&self) {
        let stopped = {
            let mut state = self.inner.state.lock();
            std::mem::replace(&mut state.running, false)
        };
        if stopped {
            info!("Queue stopped");
            self.inner.publish(&QueueEvent::QueueDidStop);
        }
    }

    /// Remove every pending job. Does not affect the in-flight job.
    pub async fn empty(&self) -> Result<(), QueueError> {
        self.inner.store.remove_all_jobs().await?;
        info!("Queue emptied");
        Ok(())
    }

    /// Delete every pending job whose payload the predicate rejects.
    pub async fn filter_using_predicate<F>(&self, predicate: F) -> Result<usize, QueueError>
    where
        F: Fn(&serde_json::Value) -> FilterAction + Send + 'static,
    {
        Ok(self.inner.store.filter_queue(Box::new(predicate)).await?)
    }

    pub fn is_idle(&self) -> bool {
        self.inner.state.lock().active.is_none()
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// The job currently dispatched to the handler.
    pub fn active_job(&self) -> Option<Job> {
        self.inner.state.lock().active.clone()
    }

    pub async fn job_exists_for_task(&self, task: &str) -> Result<bool, QueueError> {
        Ok(self.inner.store.job_exists_for_task(task).await?)
    }

    /// Whether the in-flight job carries the task label.
    pub fn job_is_active_for_task(&self, task: &str) -> bool {
        self.inner
            .state
            .lock()
            .active
            .as_ref()
            .is_some_and(|job| job.is_for_task(task))
    }

    /// Oldest pending job.
    pub async fn next_job(&self) -> Result<Option<Job>, QueueError> {
        Ok(self.inner.store.fetch_job().await?)
    }

    /// Oldest pending job for the task.
    pub async fn next_job_for_task(&self, task: &str) -> Result<Option<Job>, QueueError> {
        Ok(self.inner.store.fetch_job_for_task(task).await?)
    }

    pub async fn job_count(&self) -> Result<usize, QueueError> {
        Ok(self.inner.store.fetch_job_count().await?)
    }

    pub fn retry_limit(&self) -> u32 {
        self.inner.retry_limit.load(Ordering::SeqCst)
    }

    pub fn set_retry_limit(&self, limit: u32) {
        self.inner.retry_limit.store(limit, Ordering::SeqCst);
    }

    /// The error that most recently halted the processing loop.
    pub fn last_error(&self) -> Option<QueueError> {
        self.inner.last_error.lock().clone()
    }
}
