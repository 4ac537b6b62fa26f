//! Error types for Webtrail
//!
//! This module defines the error types used across the telemetry pipeline,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Webtrail operations
///
/// Most pipeline failures are downgraded to warnings at the boundary of the
/// operation that can tolerate them; the variants here cover what is still
/// surfaced to callers (configuration, session lifecycle, persistence).
#[derive(Error, Debug)]
pub enum WebtrailError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A lifecycle operation collided with a session in an incompatible state
    #[error("Session busy: {0}")]
    SessionBusy(String),

    /// Snapshot capture or write failures
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Trace capture or summarization failures
    #[error("Trace error: {0}")]
    Trace(String),

    /// Timeline persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Webtrail operations
///
/// Uses `anyhow::Error` so call sites can attach context while still
/// being able to downcast to [`WebtrailError`].
pub type Result<T> = anyhow::Result<T>;
