use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Kind of entry recorded in a session timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    UserInteraction,
    NetworkRequest,
    Snapshot,
    Console,
    ConsoleError,
    PerformanceSummary,
}

impl EventType {
    /// Name as written to `timeline.json`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserInteraction => "USER_INTERACTION",
            Self::NetworkRequest => "NETWORK_REQUEST",
            Self::Snapshot => "SNAPSHOT",
            Self::Console => "CONSOLE",
            Self::ConsoleError => "CONSOLE_ERROR",
            Self::PerformanceSummary => "PERFORMANCE_SUMMARY",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable, already-redacted timeline entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub data: Value,
}

/// Lifecycle state of the [`SessionManager`](super::SessionManager)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Recording = 1,
    Stopping = 2,
}

impl SessionState {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Recording,
            2 => Self::Stopping,
            _ => Self::Idle,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// A console line reported by the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    /// Console level (`log`, `info`, `warning`, `error`, ...)
    pub level: String,
    pub text: String,
    /// Script location or origin of the message
    #[serde(default = "default_console_source")]
    pub source: String,
}

fn default_console_source() -> String {
    "unknown".to_string()
}

impl ConsoleMessage {
    pub fn new(level: impl Into<String>, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            text: text.into(),
            source: source.into(),
        }
    }

    /// Timeline type for this message: errors are kept apart from chatter
    pub fn event_type(&self) -> EventType {
        if self.level.eq_ignore_ascii_case("error") {
            EventType::ConsoleError
        } else {
            EventType::Console
        }
    }

    /// Timeline payload for this message
    pub fn payload(&self) -> Value {
        json!({
            "level": self.level,
            "text": self.text,
            "source": self.source,
        })
    }

    /// `console_dump.log` line: `[<timestamp>] [<LEVEL>] <message> (<source>)`
    pub fn dump_line(&self, timestamp: &DateTime<Utc>) -> String {
        format!(
            "[{}] [{}] {} ({})",
            timestamp.to_rfc3339(),
            self.level.to_uppercase(),
            self.text,
            self.source
        )
    }
}
