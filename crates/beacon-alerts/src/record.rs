//! Structured log records consumed by the alert router.
//!
//! This module provides:
//! - [`LogLevel`]: numeric severities, ordered from least to most severe
//! - [`LogRecord`]: one log event with its origin, trace id and call stack

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AlertError;

/// Log severity levels with their numeric codes.
///
/// Codes follow the common PHP/Monolog scale so that records produced by
/// other services can be consumed as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "LevelRepr", into = "String")]
#[repr(u16)]
pub enum LogLevel {
    /// Detailed debugging information
    Debug = 100,
    /// Interesting events
    Info = 200,
    /// Normal but significant events
    Notice = 250,
    /// Exceptional occurrences that are not errors
    Warning = 300,
    /// Runtime errors
    Error = 400,
    /// Critical conditions
    Critical = 500,
    /// Action must be taken immediately
    Alert = 550,
    /// The system is unusable
    Emergency = 600,
}

impl LogLevel {
    /// All levels, least severe first.
    pub const ALL: [Self; 8] = [
        Self::Debug,
        Self::Info,
        Self::Notice,
        Self::Warning,
        Self::Error,
        Self::Critical,
        Self::Alert,
        Self::Emergency,
    ];

    /// Returns the numeric severity code.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Returns the level with exactly this numeric code.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.code() == code)
    }

    /// Returns the uppercase level name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Notice => "NOTICE",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Alert => "ALERT",
            Self::Emergency => "EMERGENCY",
        }
    }

    /// Returns true if this level is at least as severe as the given level.
    #[must_use]
    pub fn is_at_least(&self, level: Self) -> bool {
        *self >= level
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "NOTICE" => Ok(Self::Notice),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" | "FATAL" => Ok(Self::Critical),
            "ALERT" | "PANIC" => Ok(Self::Alert),
            "EMERGENCY" => Ok(Self::Emergency),
            _ => Err(AlertError::InvalidLevel {
                level: s.to_string(),
            }),
        }
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

/// Wire form of a level: either its name or its numeric code.
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Code(u16),
    Name(String),
}

impl TryFrom<LevelRepr> for LogLevel {
    type Error = AlertError;

    fn try_from(repr: LevelRepr) -> Result<Self, AlertError> {
        match repr {
            LevelRepr::Code(code) => Self::from_code(code).ok_or(AlertError::InvalidLevel {
                level: code.to_string(),
            }),
            LevelRepr::Name(name) => name.parse(),
        }
    }
}

/// A single log event as seen by the alert router.
///
/// Every field except `level` and `message` is optional on the wire and
/// defaults to empty. A missing `timestamp` is filled with the time of
/// deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Severity
    pub level: LogLevel,
    /// Human-readable message
    pub message: String,
    /// Command line that produced the event
    #[serde(default)]
    pub command: String,
    /// Request URL that produced the event, empty outside request handling
    #[serde(default)]
    pub url: String,
    /// Trace or correlation id, empty if none
    #[serde(default)]
    pub trace: String,
    /// Deployment environment name
    #[serde(default)]
    pub env: String,
    /// Source host address
    #[serde(default)]
    pub ip: String,
    /// When the event happened
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Pre-formatted time string, rendered from `timestamp` when empty
    #[serde(default)]
    pub datetime: String,
    /// Call-stack lines, innermost first
    #[serde(default)]
    pub extra: Vec<String>,
}

impl LogRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            command: String::new(),
            url: String::new(),
            trace: String::new(),
            env: String::new(),
            ip: String::new(),
            timestamp: Utc::now(),
            datetime: String::new(),
            extra: Vec::new(),
        }
    }

    /// Sets the command line.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Sets the request URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the trace id.
    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }

    /// Sets the environment name.
    #[must_use]
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }

    /// Sets the source address.
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = ip.into();
        self
    }

    /// Sets the event time.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the pre-formatted time string.
    #[must_use]
    pub fn with_datetime(mut self, datetime: impl Into<String>) -> Self {
        self.datetime = datetime.into();
        self
    }

    /// Appends a call-stack line.
    #[must_use]
    pub fn with_extra(mut self, line: impl Into<String>) -> Self {
        self.extra.push(line.into());
        self
    }

    /// Returns the request URL if set, otherwise the command line.
    #[must_use]
    pub fn origin(&self) -> &str {
        if self.url.is_empty() {
            &self.command
        } else {
            &self.url
        }
    }

    /// Returns true if the record came from request handling.
    #[must_use]
    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }

    /// Returns the time string shown in alerts.
    #[must_use]
    pub fn display_time(&self) -> String {
        if self.datetime.is_empty() {
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
        } else {
            self.datetime.clone()
        }
    }
}
