//! Conversion log streaming via Server-Sent Events (SSE).
//!
//! Upload handlers report progress through a process-wide broadcast
//! channel. Every entry is echoed to stdout and fanned out to SSE clients.
//! The transcoder itself never logs.

use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Conversion job this entry belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// RFC 3339 timestamp
    pub timestamp: String,
    /// Nesting level for sub-steps
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            job_id: None,
            timestamp: Utc::now().to_rfc3339(),
            indent: 0,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to all connected SSE clients
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Print an entry and send it to all subscribers
    pub fn log(&self, entry: LogEntry) {
        let prefix = match entry.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(entry.indent as usize);
        match &entry.job_id {
            Some(job) => println!("{}{} [{}] {}", indent, prefix, short_job(job), entry.message),
            None => println!("{}{} {}", indent, prefix, entry.message),
        }

        // No receivers is not an error
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for SSE streaming
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

fn short_job(job: &str) -> &str {
    job.get(..8).unwrap_or(job)
}

/// Log lines tagged with one conversion job
#[derive(Debug, Clone)]
pub struct JobLog {
    job_id: String,
}

impl JobLog {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn info(&self, msg: impl Into<String>) {
        LOG_BROADCASTER.log(LogEntry::info(msg).with_job(&self.job_id));
    }

    pub fn info_indent(&self, msg: impl Into<String>, indent: u8) {
        LOG_BROADCASTER.log(LogEntry::info(msg).with_job(&self.job_id).with_indent(indent));
    }

    pub fn success(&self, msg: impl Into<String>) {
        LOG_BROADCASTER.log(LogEntry::success(msg).with_job(&self.job_id));
    }

    pub fn warning(&self, msg: impl Into<String>) {
        LOG_BROADCASTER.log(LogEntry::warning(msg).with_job(&self.job_id));
    }

    pub fn error(&self, msg: impl Into<String>) {
        LOG_BROADCASTER.log(LogEntry::error(msg).with_job(&self.job_id));
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::success(msg));
}
