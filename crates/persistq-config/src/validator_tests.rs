
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_zero_retry_limit() {
        let mut config = Config::default();
        config.queue.retry_limit = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "queue.retry_limit"));
    }

    #[test]
    fn test_validate_zero_event_buffer() {
        let mut config = Config::default();
        config.queue.event_buffer = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "queue.event_buffer"));
    }

    #[test]
    fn test_validate_zero_backoff_warns() {
        let mut config = Config::default();
        config.queue.offline_backoff_ms = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "queue.offline_backoff_ms"));
    }

    #[test]
    fn test_validate_empty_storage_path() {
        let mut config = Config::default();
        config.storage.path = Some("  ".to_string());

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "storage.path"));
    }

    #[test]
    fn test_validate_memory_backend_warns() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "storage.backend"));
    }

    #[test]
    fn test_validate_log_levels() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "logging.level"));

        config.logging.level = "WARN".to_string();
        assert!(ConfigValidator::validate(&config).unwrap().is_valid());

        config.logging.level = "persistq_queue=debug".to_string();
        assert!(ConfigValidator::validate(&config).unwrap().is_valid());
    }
