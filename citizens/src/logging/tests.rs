use crate::config::{LogFormat, LogLevel, LoggingConfig};
use crate::logging::{create_non_blocking_file, parse_log_level};
use std::sync::Once;
use tempfile::tempdir;

// Use this to ensure init is only called once across all tests
static INIT: Once = Once::new();

#[test]
fn test_init_console_logging() {
    INIT.call_once(|| {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            format: LogFormat::Compact,
            file: None,
            stdout: true,
        };

        let guard = crate::logging::init(&config).unwrap();
        assert!(guard.is_none());
    });
}

#[test]
fn test_file_writer_creates_directory() {
    let temp_dir = tempdir().unwrap();
    let log_path = temp_dir.path().join("logs").join("citizens.log");

    let (_writer, _guard) = create_non_blocking_file(&log_path).unwrap();

    assert!(temp_dir.path().join("logs").is_dir());
}

#[test]
fn test_file_writer_rejects_path_without_name() {
    assert!(create_non_blocking_file("/").is_err());
}

#[test]
fn test_level_conversion() {
    assert_eq!(parse_log_level("trace").unwrap(), LogLevel::Trace);
    assert_eq!(parse_log_level("DEBUG").unwrap(), LogLevel::Debug);
    assert!(parse_log_level("info").is_ok());
    assert!(parse_log_level("warn").is_ok());
    assert!(parse_log_level("error").is_ok());
    assert!(parse_log_level("invalid").is_err());
}
