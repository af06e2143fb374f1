//! # persistq Queue
//!
//! Durable serial job queue.
//!
//! ## Features
//!
//! - FIFO job storage that survives restarts (SQLite)
//! - One job in flight at a time, dispatched to a sync or callback handler
//! - Retry counting with escalation to critical removal
//! - Lifecycle events through a pluggable sink
//! - Predicate-based filtering of pending jobs

mod codec;
pub mod queue;
mod processor;
mod schema;
mod shared;
pub mod sink;
pub mod store_memory;
pub mod store_sqlite;

pub use queue::JobQueue;
pub use sink::{BroadcastEventSink, NoopEventSink, TracingEventSink};
pub use store_memory::MemoryJobStore;
pub use store_sqlite::SqliteJobStore;

pub use persistq_protocols::{
    CallbackJobHandler, Completion, EventSink, FilterAction, Job, JobHandler, JobId, JobResult,
    JobStore, QueueError, QueueEvent, StorageError,
};
