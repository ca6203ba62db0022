//! Logging functionality for forkwatch
//!
//! Serializes the structured event stream to a JSON-lines log file. The
//! logger runs on the dispatcher thread only, so file writes never contend
//! with the agent threads.

mod event_logger;

pub use event_logger::{EventLogger, LogEntry};
