//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{Config, StorageBackend};

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_queue(config, &mut result);
        Self::validate_storage(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_queue(config: &Config, result: &mut ValidationResult) {
        if config.queue.retry_limit == 0 {
            result.add_error(ValidationError::new(
                "queue.retry_limit",
                "retry_limit must be greater than 0",
            ));
        }

        if config.queue.event_buffer == 0 {
            result.add_error(ValidationError::new(
                "queue.event_buffer",
                "event_buffer must be greater than 0",
            ));
        }

        if config.queue.offline_backoff_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "queue.offline_backoff_ms",
                "offline jobs are only retried on the next start or enqueue",
            ));
        }
    }

    fn validate_storage(config: &Config, result: &mut ValidationResult) {
        match config.storage.backend {
            StorageBackend::Sqlite => {
                if config.storage.path.as_deref().is_some_and(|p| p.trim().is_empty()) {
                    result.add_error(ValidationError::new(
                        "storage.path",
                        "path cannot be empty",
                    ));
                }
            }
            StorageBackend::Memory => {
                result.add_warning(ValidationWarning::new(
                    "storage.backend",
                    "memory backend does not survive restarts",
                ));
            }
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.to_ascii_lowercase();
        if level.is_empty() {
            result.add_error(ValidationError::new(
                "logging.level",
                "level cannot be empty",
            ));
        } else if !LOG_LEVELS.contains(&level.as_str()) && !level.contains('=') {
            result.add_error(ValidationError::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    config.logging.level, LOG_LEVELS
                ),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
