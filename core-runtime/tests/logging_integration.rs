//! Integration tests for logging system

use bridge_traits::time::{ConsoleLogger, LogLevel};
use core_runtime::logging::{init_logging, strip_path, LogFormat, LoggingConfig};
use std::sync::Arc;

#[test]
fn test_logging_config_builder() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_filter("core_sync=trace")
        .with_spans(false)
        .with_target(true)
        .with_thread_info(true)
        .with_logger_sink(Arc::new(ConsoleLogger::default()));

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.filter.as_deref(), Some("core_sync=trace"));
    assert!(!config.enable_spans);
    assert!(config.display_target);
    assert!(config.display_thread_info);
    assert!(config.logger_sink.is_some());
}

#[test]
fn test_database_path_stripping() {
    assert_eq!(strip_path("/home/ana/.local/share/favorites.db"), "favorites.db");
    assert_eq!(strip_path("C:\\Users\\Ana\\AppData\\favorites.db"), "favorites.db");
    assert_eq!(strip_path("favorites.db"), "favorites.db");
    assert_eq!(strip_path("/var/lib/"), "");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LogFormat::default(), LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LogFormat::default(), LogFormat::Json);
}

#[test]
fn test_init_logging_only_once() {
    let first = init_logging(LoggingConfig::default().with_format(LogFormat::Compact));
    assert!(first.is_ok());

    let second = init_logging(LoggingConfig::default());
    assert!(second.is_err(), "a global subscriber is already installed");
}
