//! # persistq Protocols
//!
//! Core types and traits shared by the queue controller and its storage
//! backends. Contains only interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`JobStore`] - Durable storage of pending jobs
//! - [`JobHandler`] - Synchronous job processing
//! - [`CallbackJobHandler`] - Job processing that reports through a [`Completion`]
//! - [`EventSink`] - Receiver of queue lifecycle events

pub mod error;
pub mod event;
pub mod handler;
pub mod job;
pub mod store;

pub use error::{QueueError, StorageError};
pub use event::{EventSink, QueueEvent};
pub use handler::{CallbackJobHandler, Completion, JobHandler};
pub use job::{FilterAction, Job, JobId, JobResult};
pub use store::{FilterPredicate, JobStore};
