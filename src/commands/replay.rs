//! `replay` command: run a recorded event feed through a full session
//!
//! The feed is a JSON-lines file with one [`IngestEvent`] per line. Blank
//! lines and lines starting with `#` are ignored. Malformed lines are logged
//! and skipped so one bad record does not sink the whole replay.

use crate::config::Config;
use crate::error::{Result, WebtrailError};
use crate::filter::NoiseFilter;
use crate::ingest::{self, IngestEvent, NullBridge, Pipeline};
use crate::session::{FileTraceCapture, SessionManager};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parse a JSON-lines feed into ingestion events
///
/// # Returns
///
/// The parsed events in file order and the number of skipped malformed lines
///
/// # Errors
///
/// Returns an error if the feed cannot be read
pub fn read_feed(path: &Path) -> Result<(Vec<IngestEvent>, usize)> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        WebtrailError::Config(format!("Failed to read feed {}: {}", path.display(), e))
    })?;

    let mut events = Vec::new();
    let mut skipped = 0;
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<IngestEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "Skipping malformed feed line");
                skipped += 1;
            }
        }
    }

    Ok((events, skipped))
}

/// Replay `feed` into a new session and return the session folder
///
/// # Arguments
///
/// * `config` - Loaded configuration; sessions land in `session.output_dir`
/// * `feed` - JSON-lines feed of ingestion events
/// * `trace` - Optional pre-recorded trace summarized when the session stops
///
/// # Errors
///
/// Returns an error if the feed cannot be read, the session cannot be
/// started, or the timeline cannot be written
pub async fn replay_feed(config: &Config, feed: &Path, trace: Option<&Path>) -> Result<PathBuf> {
    let (events, skipped) = read_feed(feed)?;
    tracing::info!(events = events.len(), skipped, "Loaded feed {}", feed.display());

    let manager = Arc::new(SessionManager::new(config.session.clone())?);
    let folder = manager.init(&config.session.output_dir).await?;

    if let (Some(trace), Some(raw_path)) = (trace, manager.raw_trace_path()) {
        manager.attach_trace_capture(Arc::new(FileTraceCapture::new(trace, raw_path)));
    }

    let pipeline = Pipeline::new(
        manager.clone(),
        NoiseFilter::new(config.filter.clone()),
        Arc::new(NullBridge),
    );
    let (sender, receiver) = ingest::channel(config.session.channel_capacity);
    let consumer = tokio::spawn(pipeline.run(receiver));

    for event in events {
        if sender.send(event).await.is_err() {
            tracing::warn!("Ingestion pipeline closed early");
            break;
        }
    }
    drop(sender);

    let handled = consumer
        .await
        .map_err(|e| anyhow::anyhow!("Ingestion pipeline task failed: {}", e))?;
    tracing::debug!(handled, "Feed delivered");

    manager.stop().await?;
    Ok(folder)
}

/// Run the replay command and print where the session was written
pub async fn run_replay(config: Config, feed: PathBuf, trace: Option<PathBuf>) -> Result<()> {
    let folder = replay_feed(&config, &feed, trace.as_deref()).await?;
    println!("{} {}", "Session written to".green(), folder.display());
    Ok(())
}
