//! Log entry — an append-only protocol line emitted by a device or plugin.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id::LogEntryId;
use crate::time::{self, Timestamp};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "WARN")]
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored level string is not a known [`LogLevel`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level {0:?}")]
pub struct UnknownLogLevel(pub String);

impl FromStr for LogLevel {
    type Err = UnknownLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(UnknownLogLevel(other.to_string())),
        }
    }
}

/// Payload of a `LOG` event: a log line not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLogEntry {
    #[serde(
        default = "time::now",
        deserialize_with = "time::deserialize_lenient"
    )]
    pub timestamp: Timestamp,
    pub message: String,
    /// Source tag, e.g. `"SIM"` or `"MEROSS"`.
    pub protocol: String,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub ref_id: Option<String>,
}

impl NewLogEntry {
    /// Attach the store-assigned id.
    #[must_use]
    pub fn into_entry(self, id: LogEntryId) -> LogEntry {
        LogEntry {
            id,
            timestamp: self.timestamp,
            message: self.message,
            protocol: self.protocol,
            level: self.level,
            ref_id: self.ref_id,
        }
    }
}

/// A persisted log entry. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogEntryId,
    pub timestamp: Timestamp,
    pub message: String,
    pub protocol: String,
    pub level: LogLevel,
    pub ref_id: Option<String>,
}
