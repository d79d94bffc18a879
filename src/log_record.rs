//! Log record representation for the percy logger.
//!
//! This module defines [`LogRecord`], the immutable entry retained by the log
//! store and replayed to remote peers, along with [`Message`], the payload a
//! caller hands to a log call.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::level::LogLevel;

/// Free-form metadata attached to a record.
pub type Meta = Map<String, Value>;

/// A single stored log entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Namespace of the group that produced the record.
    #[serde(alias = "debug")]
    pub namespace: String,
    /// The level as received. Unknown strings are kept but never displayed.
    pub level: String,
    /// The message text after normalisation.
    pub message: String,
    /// Caller supplied metadata.
    #[serde(default)]
    pub meta: Meta,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl LogRecord {
    /// Construct a record stamped with the current time.
    pub fn new(namespace: &str, level: &str, message: impl Into<String>, meta: Meta) -> Self {
        Self {
            namespace: namespace.to_owned(),
            level: level.to_owned(),
            message: message.into(),
            meta,
            timestamp: now_millis(),
        }
    }

    /// Parsed representation of [`LogRecord::level`], if it is a known level.
    pub fn parsed_level(&self) -> Option<LogLevel> {
        LogLevel::parse_opt(&self.level)
    }

    /// Return `true` when the record was forwarded by a remote peer.
    pub fn is_remote(&self) -> bool {
        self.meta.get("remote").and_then(Value::as_bool).unwrap_or(false)
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.namespace, self.level, self.message)
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// An error captured for logging, with an optional rendered stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Capture an error and its `source()` chain.
    ///
    /// The stack is only populated when the error has at least one source; it
    /// lists the top-level message followed by one `Caused by:` line per cause.
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let message = err.to_string();
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("Caused by: {cause}"));
            source = cause.source();
        }
        let payload = Self::new(message.clone());
        if causes.is_empty() {
            payload
        } else {
            payload.with_stack(format!("{message}\n{}", causes.join("\n")))
        }
    }

    /// One-line rendering shown in place of the stack: `Error: <message>`.
    pub fn summary(&self) -> String {
        if self.message.is_empty() {
            "Error".to_owned()
        } else {
            format!("Error: {}", self.message)
        }
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Payload of a log call: plain text or a captured error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Text(String),
    Error(ErrorPayload),
}

impl Message {
    /// Capture any error value.
    pub fn error(err: &(dyn StdError + 'static)) -> Self {
        Self::Error(ErrorPayload::from_error(err))
    }

    pub fn as_error(&self) -> Option<&ErrorPayload> {
        match self {
            Message::Error(payload) => Some(payload),
            Message::Text(_) => None,
        }
    }
}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Message {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Message {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<ErrorPayload> for Message {
    fn from(value: ErrorPayload) -> Self {
        Self::Error(value)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(text) => f.write_str(text),
            Message::Error(payload) => payload.fmt(f),
        }
    }
}
