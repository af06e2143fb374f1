//! Payload encoding and row decoding shared by the storage engines.

use chrono::{DateTime, Utc};

use persistq_protocols::{Job, JobId, StorageError};

/// Encode a payload for storage.
pub(crate) fn encode_payload(data: &serde_json::Value) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Decode a stored payload.
pub(crate) fn decode_payload(id: JobId, bytes: &[u8]) -> Result<serde_json::Value, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::Corrupt {
        id,
        reason: e.to_string(),
    })
}

/// A job row as it sits in storage.
#[derive(Debug, Clone)]
pub(crate) struct StoredJob {
    pub id: i64,
    pub task: String,
    pub data: Vec<u8>,
    pub attempts: i64,
    pub stamp: i64,
}

impl StoredJob {
    pub fn into_job(self) -> Result<Job, StorageError> {
        let id = JobId(self.id);
        let data = decode_payload(id, &self.data)?;
        let attempts = u32::try_from(self.attempts).map_err(|_| StorageError::Corrupt {
            id,
            reason: format!("invalid attempt count {}", self.attempts),
        })?;
        let stamp = DateTime::<Utc>::from_timestamp(self.stamp, 0).unwrap_or_default();

        Ok(Job {
            id,
            task: self.task,
            data,
            attempts,
            stamp,
        })
    }
}
