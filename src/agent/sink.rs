//! Progress log sinks for agents.
//!
//! Agents report human-readable progress through a [`LogSink`]. The default
//! sink forwards records to `tracing`; [`CallbackSink`] hands them to a closure,
//! e.g. to stream progress to a UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Success => "success",
        };
        f.write_str(s)
    }
}

/// One progress message emitted by an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub agent: String,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    pub fn new(agent: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

pub trait LogSink: Send + Sync {
    fn log(&self, record: &LogRecord);
}

/// Forwards records to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, record: &LogRecord) {
        match record.level {
            LogLevel::Info | LogLevel::Success => {
                tracing::info!(agent = %record.agent, level = %record.level, "{}", record.message)
            }
            LogLevel::Warning => {
                tracing::warn!(agent = %record.agent, "{}", record.message)
            }
            LogLevel::Error => {
                tracing::error!(agent = %record.agent, "{}", record.message)
            }
        }
    }
}

/// Hands every record to a closure.
pub struct CallbackSink<F>
where
    F: Fn(&LogRecord) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackSink<F>
where
    F: Fn(&LogRecord) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> LogSink for CallbackSink<F>
where
    F: Fn(&LogRecord) + Send + Sync,
{
    fn log(&self, record: &LogRecord) {
        (self.callback)(record)
    }
}
