//! Unit tests for log.rs

use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use std::time::SystemTime;

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_u8_roundtrip() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(LogSeverity::from_u8(severity as u8), severity);
    }
}

#[test]
fn test_log_severity_from_out_of_range_saturates() {
    assert_eq!(LogSeverity::from_u8(200), LogSeverity::Error);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "galaxy3d::gpu::Test".to_string(),
        message: "texture released".to_string(),
        file,
        line,
    }
}

#[test]
fn test_default_logger_format_without_location() {
    colored::control::set_override(false);
    let line = DefaultLogger::format_entry(&entry(LogSeverity::Info, None, None));
    assert!(line.contains("[INFO ]"));
    assert!(line.contains("[galaxy3d::gpu::Test]"));
    assert!(line.ends_with("texture released"));
}

#[test]
fn test_default_logger_format_with_location() {
    colored::control::set_override(false);
    let line = DefaultLogger::format_entry(&entry(LogSeverity::Error, Some("cache.rs"), Some(42)));
    assert!(line.contains("[ERROR]"));
    assert!(line.ends_with("texture released (cache.rs:42)"));
}

#[test]
fn test_default_logger_all_severities_do_not_panic() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&entry(severity, None, None));
    }
}
