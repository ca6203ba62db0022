use crate::core::types::SimEvent;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Structure for a single log line
#[derive(Debug, Serialize)]
pub struct LogEntry<'a> {
    /// The structured event
    #[serde(flatten)]
    pub event: &'a SimEvent,
    /// Seconds since the Unix epoch with microsecond precision
    pub timestamp: f64,
}

/// Determines how the logger should operate
#[derive(Debug)]
enum LoggerMode {
    /// Logging is disabled entirely
    Disabled,
    /// Log to the specified file
    ToFile(File),
}

/// Logger writing one JSON object per event to a log file
pub struct EventLogger {
    mode: LoggerMode,
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLogger {
    /// Create a new logger with logging disabled
    pub fn new() -> Self {
        EventLogger {
            mode: LoggerMode::Disabled,
        }
    }

    /// Create a new logger that appends to the specified file
    pub fn with_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context("Failed to open log file")?;

        Ok(EventLogger {
            mode: LoggerMode::ToFile(file),
        })
    }

    /// Append one event as a JSON line, stamped with the current time
    pub fn log_event(&self, event: &SimEvent) {
        let LoggerMode::ToFile(ref file) = self.mode else {
            return;
        };

        let now = Utc::now();
        let timestamp = now.timestamp() as f64 + now.timestamp_subsec_micros() as f64 / 1_000_000.0;
        let entry = LogEntry { event, timestamp };

        let mut file = file;
        if let Ok(json) = serde_json::to_string(&entry) {
            let _ = writeln!(file, "{}", json);
            let _ = file.flush();
        }
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        !matches!(self.mode, LoggerMode::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_disabled_logger_is_inert() {
        let logger = EventLogger::new();
        assert!(!logger.is_enabled());
        logger.log_event(&SimEvent::Releasing { agent: 0 });
    }

    #[test]
    fn test_file_logger_writes_parseable_lines() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let logger = EventLogger::with_file(file.path()).unwrap();
        assert!(logger.is_enabled());

        logger.log_event(&SimEvent::Thinking {
            agent: 2,
            duration_ms: 7,
        });
        logger.log_event(&SimEvent::Releasing { agent: 2 });

        let mut contents = String::new();
        File::open(file.path())
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value["timestamp"].as_f64().unwrap() > 0.0);
            assert_eq!(value["agent"], 2);
        }
    }
}
