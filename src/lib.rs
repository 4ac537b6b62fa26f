//! Webtrail - browser session telemetry reducer
//!
//! This library turns the raw telemetry of a browsing session (clicks,
//! console output, network responses, DOM snapshots and a Chrome performance
//! trace) into one compact, redacted, chronologically ordered timeline per
//! recording session.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Session lifecycle, timeline buffer and persistence
//! - `ingest`: Typed ingestion channel and the pipeline feeding the session
//! - `filter`: Network noise filter deciding which responses are kept
//! - `redact`: Masking of sensitive fields before anything is buffered
//! - `trace`: Reduction of a raw performance trace to a metrics summary
//! - `config`: Configuration management and validation
//! - `logging`: Tracing subscriber setup
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use webtrail::{Config, EventType, SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/webtrail.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let manager = SessionManager::new(config.session.clone())?;
//!     manager.init(&config.session.output_dir).await?;
//!     manager.log_event(EventType::UserInteraction, &json!({"action": "click"}));
//!     manager.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod logging;
pub mod redact;
pub mod session;
pub mod trace;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, WebtrailError};
pub use filter::{FilterVerdict, NetworkCandidate, NoiseFilter, ResourceType};
pub use ingest::{BrowserBridge, IngestEvent, NullBridge, Pipeline};
pub use session::{ConsoleMessage, EventType, SessionManager, SessionState, TimelineEvent};
pub use trace::{PerformanceSummary, TraceReport};

#[cfg(test)]
pub mod test_utils;
