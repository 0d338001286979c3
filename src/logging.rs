// src/logging.rs
// Simple timestamped logging shared by the server and the clients

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;

// Full-screen clients redraw stdout, so they route log lines to stderr
static LOG_TO_STDERR: AtomicBool = AtomicBool::new(false);

/// Log level enum
#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    Info,
    Error,
    Warning,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
        }
    }
}

/// Send every following log line to stderr instead of stdout
pub fn log_to_stderr(enabled: bool) {
    LOG_TO_STDERR.store(enabled, Ordering::Relaxed);
}

fn format_line(level: LogLevel, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("{} - {} - {}", timestamp, level.as_str(), message)
}

/// Format and print a log message with timestamp
pub fn log_message(level: LogLevel, message: &str) {
    let line = format_line(level, message);
    if LOG_TO_STDERR.load(Ordering::Relaxed) {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

/// Log an info message
pub fn log_info(message: &str) {
    log_message(LogLevel::Info, message);
}

/// Log an error message
pub fn log_error(message: &str) {
    log_message(LogLevel::Error, message);
}

/// Log a warning message
pub fn log_warning(message: &str) {
    log_message(LogLevel::Warning, message);
}

/// Format and print an error log message to stderr with timestamp
pub fn log_error_stderr(message: &str) {
    eprintln!("{}", format_line(LogLevel::Error, message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        let line = format_line(LogLevel::Warning, "card rejected");
        assert!(line.ends_with(" - WARNING - card rejected"));
        // "YYYY-MM-DD HH:MM:SS"
        assert_eq!(line.split(" - ").next().map(str::len), Some(19));
    }
}
