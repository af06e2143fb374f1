//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::loader::ConfigLoader;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Queue controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Soft failures allowed before a job is removed as critical.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Delay before re-attempting after an offline result. Zero waits for
    /// the next `start` or `enqueue`.
    #[serde(default = "default_offline_backoff_ms")]
    pub offline_backoff_ms: u64,

    /// Capacity of the broadcast event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl QueueConfig {
    pub fn offline_backoff(&self) -> Option<Duration> {
        if self.offline_backoff_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.offline_backoff_ms))
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            retry_limit: default_retry_limit(),
            offline_backoff_ms: default_offline_backoff_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_retry_limit() -> u32 {
    4
}

fn default_offline_backoff_ms() -> u64 {
    5000
}

fn default_event_buffer() -> usize {
    64
}

/// Storage backend kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database file. Defaults to `<data dir>/persistq/queue.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StorageConfig {
    /// Database path with `~` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => PathBuf::from(ConfigLoader::expand_path(path)),
            None => default_database_path(),
        }
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("persistq")
        .join("queue.db")
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Directory for daily rolling log files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl LoggingConfig {
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir
            .as_deref()
            .map(|dir| PathBuf::from(ConfigLoader::expand_path(dir)))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
