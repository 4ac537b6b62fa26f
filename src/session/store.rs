//! In-memory timeline buffer for one session and its persistence
//!
//! The store owns every [`TimelineEvent`] of the session until [`SessionStore::flush`]
//! hands them over to `timeline.json`.

use super::types::{ConsoleMessage, EventType, TimelineEvent};
use crate::error::{Result, WebtrailError};
use crate::redact::sanitize;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Name of the persisted timeline inside a session folder
pub const TIMELINE_FILE: &str = "timeline.json";

/// Name of the optional console dump inside a session folder
pub const CONSOLE_DUMP_FILE: &str = "console_dump.log";

/// Append-only event buffer bound to a session folder
#[derive(Debug)]
pub struct SessionStore {
    folder: PathBuf,
    events: Vec<TimelineEvent>,
    console_lines: Vec<String>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl SessionStore {
    /// Create an empty store writing into `folder`
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            events: Vec::new(),
            console_lines: Vec::new(),
            last_timestamp: None,
        }
    }

    /// Session folder this store flushes into
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Buffered events, in insertion order
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Number of buffered timeline events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no timeline events are buffered
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Timestamp, redact and buffer an event
    pub fn append(&mut self, event_type: EventType, data: &Value) -> &TimelineEvent {
        let timestamp = self.next_timestamp();
        self.events.push(TimelineEvent {
            timestamp,
            event_type,
            data: sanitize(data),
        });
        &self.events[self.events.len() - 1]
    }

    /// Buffer a line for `console_dump.log`
    pub fn append_console_line(&mut self, message: &ConsoleMessage) {
        let timestamp = self.next_timestamp();
        self.console_lines.push(message.dump_line(&timestamp));
    }

    /// Wall clock, clamped so timestamps never go backwards within a session
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }

    /// Persist the buffer, consuming the store.
    ///
    /// Writes `timeline.json` (always, even when empty) and `console_dump.log`
    /// when console lines were captured. A failed console dump is logged and
    /// does not fail the flush.
    ///
    /// # Errors
    ///
    /// Returns [`WebtrailError::Storage`] if the timeline cannot be written.
    pub fn flush(self) -> Result<PathBuf> {
        let timeline_path = self.folder.join(TIMELINE_FILE);

        if !self.console_lines.is_empty() {
            let dump_path = self.folder.join(CONSOLE_DUMP_FILE);
            let mut contents = self.console_lines.join("\n");
            contents.push('\n');
            if let Err(e) = std::fs::write(&dump_path, contents) {
                tracing::warn!(path = %dump_path.display(), error = %e, "Failed to write console dump");
            }
        }

        let serialized = serde_json::to_string_pretty(&self.events)
            .map_err(|e| WebtrailError::Storage(format!("Failed to serialize timeline: {}", e)))?;
        std::fs::write(&timeline_path, serialized).map_err(|e| {
            WebtrailError::Storage(format!(
                "Failed to write {}: {}",
                timeline_path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %timeline_path.display(),
            events = self.events.len(),
            console_lines = self.console_lines.len(),
            "Timeline flushed"
        );

        Ok(timeline_path)
    }
}
