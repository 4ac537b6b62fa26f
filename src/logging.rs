//! Structured logging setup
//!
//! Provides JSON-formatted and human-readable logging with optional file output.
//! Integrates with the tracing ecosystem for structured event logging.

use crate::config::LoggingConfig;
use anyhow::Result;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging based on configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Console output goes
/// to STDERR so command output on STDOUT stays machine readable.
///
/// # Errors
///
/// Returns an error if the level directive is invalid, the log file cannot be
/// opened, or a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use webtrail::config::LoggingConfig;
/// use webtrail::logging::init_logging;
///
/// let config = LoggingConfig::default();
/// init_logging(&config).expect("logging initialized");
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| build_filter(&config.level))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json_format {
        let stderr_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr);

        if let Some(file_path) = &config.file_path {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)?;

            let file_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(Arc::new(file));

            registry.with(stderr_layer).with(file_layer).try_init()?;
        } else {
            registry.with(stderr_layer).try_init()?;
        }
    } else {
        let stderr_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr);

        if let Some(file_path) = &config.file_path {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)?;

            let file_layer = fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_writer(Arc::new(file));

            registry.with(stderr_layer).with(file_layer).try_init()?;
        } else {
            registry.with(stderr_layer).try_init()?;
        }
    }

    Ok(())
}

/// Run `f` with a plain STDERR subscriber that shows warnings.
///
/// Used while the configuration that [`init_logging`] needs is still being
/// loaded. The subscriber is scoped to the call and never installed globally.
pub fn with_startup_logging<T>(f: impl FnOnce() -> T) -> T {
    let subscriber = fmt()
        .with_max_level(tracing::Level::WARN)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// Build an env filter scoped to this crate from a bare level such as `debug`.
///
/// Full directives (`webtrail=trace,tokio=warn`) are passed through unchanged.
fn build_filter(level: &str) -> Result<EnvFilter> {
    let directive = if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("webtrail={}", level)
    };
    Ok(EnvFilter::try_new(directive)?)
}
