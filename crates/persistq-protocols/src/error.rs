//! Error types for the persistq protocol layer.

use thiserror::Error;

use crate::job::JobId;

/// Storage engine errors.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Payload could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored row could not be decoded.
    #[error("Corrupt job {id}: {reason}")]
    Corrupt { id: JobId, reason: String },

    /// The underlying database rejected an operation.
    #[error("Database error: {0}")]
    Database(String),

    /// The database connection has been closed.
    #[error("Database connection closed")]
    ConnectionClosed,

    /// Filesystem error while preparing storage.
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Queue controller errors.
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// No live handler is registered.
    #[error("No job handler is registered")]
    HandlerUnavailable,

    /// The handler broke its contract, e.g. dropped its completion.
    #[error("Handler contract violation: {0}")]
    HandlerViolation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_error() {
        let err = StorageError::Corrupt {
            id: JobId(3),
            reason: "expected value".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("Corrupt job 3"));
        assert!(display.contains("expected value"));
    }

    #[test]
    fn test_database_error() {
        let err = StorageError::Database("disk I/O error".to_string());
        assert!(err.to_string().contains("Database error"));
        assert!(err.to_string().contains("disk I/O error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StorageError = io.into();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_queue_error_wraps_storage_transparently() {
        let err: QueueError = StorageError::ConnectionClosed.into();
        assert_eq!(err.to_string(), "Database connection closed");
    }

    #[test]
    fn test_handler_violation_error() {
        let err = QueueError::HandlerViolation("completion dropped for job 9".to_string());
        let display = err.to_string();
        assert!(display.contains("contract violation"));
        assert!(display.contains("job 9"));
    }
}
