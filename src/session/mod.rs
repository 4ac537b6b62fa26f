//! Recording sessions
//!
//! A session is one bounded recording interval that produces exactly one
//! `timeline.json` artifact in its own folder.
//!
//! # Modules
//!
//! - [`manager`]: lifecycle state machine (`Idle → Recording → Stopping → Idle`)
//! - [`store`]: in-memory timeline buffer and flush to disk
//! - [`capture`]: trace-capture collaborator trait and a file-backed capture
//! - [`types`]: timeline event and console message types
//!
//! # Artifact layout
//!
//! ```text
//! session_<ISO8601 with ':' and '.' replaced by '-'>/
//!   timeline.json       redacted events, in arrival order
//!   snap_<ts>.html      zero or more DOM snapshots
//!   console_dump.log    only when console output is kept out of the timeline
//! ```

pub mod capture;
pub mod manager;
pub mod store;
pub mod types;

pub use capture::{FileTraceCapture, TraceCapture, RAW_TRACE_FILE};
pub use manager::{folder_timestamp, SessionManager};
pub use store::{SessionStore, CONSOLE_DUMP_FILE, TIMELINE_FILE};
pub use types::{ConsoleMessage, EventType, SessionState, TimelineEvent};
