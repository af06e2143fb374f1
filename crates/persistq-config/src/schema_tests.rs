
use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.queue.retry_limit, 4);
    assert_eq!(config.queue.offline_backoff_ms, 5000);
    assert_eq!(config.queue.event_buffer, 64);
    assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    assert!(config.storage.path.is_none());
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Text);
}

#[test]
fn test_offline_backoff() {
    let mut queue = QueueConfig::default();
    assert_eq!(queue.offline_backoff(), Some(Duration::from_millis(5000)));

    queue.offline_backoff_ms = 0;
    assert_eq!(queue.offline_backoff(), None);
}

#[test]
fn test_default_database_path() {
    let storage = StorageConfig::default();
    let path = storage.resolved_path();
    assert!(path.ends_with("persistq/queue.db"));
}

#[test]
fn test_resolved_path_expands_tilde() {
    let storage = StorageConfig {
        backend: StorageBackend::Sqlite,
        path: Some("~/jobs/queue.db".to_string()),
    };
    let path = storage.resolved_path();
    assert!(!path.to_string_lossy().starts_with('~'));
    assert!(path.ends_with("jobs/queue.db"));
}

#[test]
fn test_logging_dir_resolution() {
    let mut logging = LoggingConfig::default();
    assert!(logging.resolved_dir().is_none());

    logging.dir = Some("/var/log/persistq".to_string());
    assert_eq!(logging.resolved_dir(), Some(PathBuf::from("/var/log/persistq")));
}

#[test]
fn test_backend_deserialize() {
    let storage: StorageConfig = toml::from_str("backend = \"memory\"").unwrap();
    assert_eq!(storage.backend, StorageBackend::Memory);

    let result: Result<StorageConfig, _> = toml::from_str("backend = \"postgres\"");
    assert!(result.is_err());
}

#[test]
fn test_config_serialize_roundtrip() {
    let config = Config::default();
    let encoded = toml::to_string(&config).unwrap();
    let decoded: Config = toml::from_str(&encoded).unwrap();
    assert_eq!(decoded.queue.retry_limit, config.queue.retry_limit);
    assert_eq!(decoded.logging.format, config.logging.format);
}
