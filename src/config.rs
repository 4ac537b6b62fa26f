//! Configuration management for Webtrail
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, WebtrailError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Webtrail
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Recording session behavior
    #[serde(default)]
    pub session: SessionConfig,

    /// Network noise filter rules
    #[serde(default)]
    pub filter: FilterConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Recording session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory under which `session_*` folders are created
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Upper bound on waiting for the trace capture to stop (seconds)
    #[serde(default = "default_trace_stop_timeout")]
    pub trace_stop_timeout_secs: u64,

    /// Write console output to `console_dump.log` instead of the timeline
    #[serde(default)]
    pub console_dump: bool,

    /// Remove `<script>` and `<style>` blocks from DOM snapshots
    #[serde(default = "default_strip_snapshot_scripts")]
    pub strip_snapshot_scripts: bool,

    /// Capacity of the ingestion channel between the browser layer and the pipeline
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_output_dir() -> PathBuf {
    ProjectDirs::from("com", "webtrail", "webtrail")
        .map(|dirs| dirs.data_dir().join("sessions"))
        .unwrap_or_else(|| PathBuf::from("sessions"))
}

fn default_trace_stop_timeout() -> u64 {
    5
}

fn default_strip_snapshot_scripts() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            trace_stop_timeout_secs: default_trace_stop_timeout(),
            console_dump: false,
            strip_snapshot_scripts: default_strip_snapshot_scripts(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Network noise filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// URL substrings of tracking and analytics hosts
    #[serde(default = "default_blocked_domains")]
    pub blocked_domains: Vec<String>,

    /// Resource classes never worth keeping
    #[serde(default = "default_blocked_resource_types")]
    pub blocked_resource_types: Vec<String>,

    /// Static asset file extensions (without the leading dot)
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Resource classes that trigger a UI notification when kept
    #[serde(default = "default_notify_resource_types")]
    pub notify_resource_types: Vec<String>,

    /// Maximum size of a captured response snippet (bytes)
    #[serde(default = "default_snippet_max_bytes")]
    pub snippet_max_bytes: usize,
}

fn default_blocked_domains() -> Vec<String> {
    [
        "google-analytics.com",
        "googletagmanager.com",
        "doubleclick.net",
        "googlesyndication.com",
        "facebook.net",
        "connect.facebook.com",
        "hotjar.com",
        "segment.io",
        "segment.com/v1",
        "mixpanel.com",
        "amplitude.com",
        "clarity.ms",
        "newrelic.com",
        "nr-data.net",
        "sentry.io",
        "intercom.io",
        "fullstory.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_blocked_resource_types() -> Vec<String> {
    ["image", "font", "media", "stylesheet"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_static_extensions() -> Vec<String> {
    [
        "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "bmp", "woff", "woff2", "ttf",
        "otf", "eot", "css", "map", "mp4", "webm", "mp3", "wav", "ogg",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_notify_resource_types() -> Vec<String> {
    ["xhr", "fetch", "document"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_snippet_max_bytes() -> usize {
    1024
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blocked_domains: default_blocked_domains(),
            blocked_resource_types: default_blocked_resource_types(),
            static_extensions: default_static_extensions(),
            notify_resource_types: default_notify_resource_types(),
            snippet_max_bytes: default_snippet_max_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable JSON-formatted logs
    #[serde(default)]
    pub json_format: bool,

    /// Log file path (if None, STDERR only)
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WebtrailError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| WebtrailError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(dir) = std::env::var("WEBTRAIL_OUTPUT_DIR") {
            self.session.output_dir = PathBuf::from(dir);
        }

        if let Ok(timeout) = std::env::var("WEBTRAIL_TRACE_TIMEOUT_SECS") {
            if let Ok(value) = timeout.parse() {
                self.session.trace_stop_timeout_secs = value;
            } else {
                tracing::warn!("Invalid WEBTRAIL_TRACE_TIMEOUT_SECS: {}", timeout);
            }
        }

        if let Ok(dump) = std::env::var("WEBTRAIL_CONSOLE_DUMP") {
            if let Ok(value) = dump.parse() {
                self.session.console_dump = value;
            } else {
                tracing::warn!("Invalid WEBTRAIL_CONSOLE_DUMP: {}", dump);
            }
        }

        if let Ok(cap) = std::env::var("WEBTRAIL_SNIPPET_MAX_BYTES") {
            if let Ok(value) = cap.parse() {
                self.filter.snippet_max_bytes = value;
            } else {
                tracing::warn!("Invalid WEBTRAIL_SNIPPET_MAX_BYTES: {}", cap);
            }
        }

        if let Ok(level) = std::env::var("WEBTRAIL_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(json) = std::env::var("WEBTRAIL_JSON_LOGS") {
            if let Ok(value) = json.parse() {
                self.logging.json_format = value;
            } else {
                tracing::warn!("Invalid WEBTRAIL_JSON_LOGS: {}", json);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(dir) = &cli.output_dir {
            self.session.output_dir = dir.clone();
        }

        if cli.verbose {
            self.logging.level = "debug".to_string();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.session.trace_stop_timeout_secs == 0 {
            return Err(WebtrailError::Config(
                "session.trace_stop_timeout_secs must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.trace_stop_timeout_secs > 300 {
            return Err(WebtrailError::Config(
                "session.trace_stop_timeout_secs must be less than or equal to 300".to_string(),
            )
            .into());
        }

        if self.session.channel_capacity == 0 {
            return Err(WebtrailError::Config(
                "session.channel_capacity must be greater than 0".to_string(),
            )
            .into());
        }

        if self.filter.snippet_max_bytes == 0 {
            return Err(WebtrailError::Config(
                "filter.snippet_max_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        if self.logging.level.trim().is_empty() {
            return Err(
                WebtrailError::Config("logging.level cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}
