//! `show` command: print the timeline of a finished session

use crate::error::{Result, WebtrailError};
use crate::session::{EventType, TimelineEvent, TIMELINE_FILE};
use colored::{ColoredString, Colorize};
use prettytable::{format, Table};
use serde_json::Value;
use std::path::Path;

const DETAIL_WIDTH: usize = 80;

/// Load `timeline.json` from a session folder
///
/// # Errors
///
/// Returns [`WebtrailError::Storage`] if the file is missing or is not a
/// timeline
pub fn load_timeline(session_dir: &Path) -> Result<Vec<TimelineEvent>> {
    let path = session_dir.join(TIMELINE_FILE);
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| WebtrailError::Storage(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&contents).map_err(|e| {
        WebtrailError::Storage(format!("Invalid timeline {}: {}", path.display(), e)).into()
    })
}

/// Print a session timeline as a table, or as JSON when `json` is set
pub fn run_show(session_dir: &Path, json: bool) -> Result<()> {
    let events = load_timeline(session_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("{}", "Timeline is empty.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "#".bold(),
        "Time".bold(),
        "Type".bold(),
        "Details".bold()
    ]);

    for (index, event) in events.iter().enumerate() {
        table.add_row(prettytable::row![
            index + 1,
            event.timestamp.format("%H:%M:%S%.3f"),
            colorize(event.event_type),
            describe(event)
        ]);
    }

    println!("\nTimeline of {}:", session_dir.display());
    table.printstd();
    println!();
    Ok(())
}

fn colorize(event_type: EventType) -> ColoredString {
    let label = event_type.as_str();
    match event_type {
        EventType::ConsoleError => label.red(),
        EventType::Console => label.normal(),
        EventType::NetworkRequest => label.cyan(),
        EventType::UserInteraction => label.green(),
        EventType::Snapshot => label.magenta(),
        EventType::PerformanceSummary => label.yellow(),
    }
}

/// One-line description of an event for the table view
pub fn describe(event: &TimelineEvent) -> String {
    let data = &event.data;
    let text = match event.event_type {
        EventType::UserInteraction => format!(
            "{} {} at ({}, {})",
            field(data, "action"),
            field(data, "selector"),
            field(data, "x"),
            field(data, "y")
        ),
        EventType::NetworkRequest => format!(
            "{} {} {}",
            field(data, "method"),
            field(data, "status"),
            field(data, "url")
        ),
        EventType::Console | EventType::ConsoleError => format!(
            "[{}] {}",
            field(data, "level"),
            field(data, "text")
        ),
        EventType::Snapshot => format!(
            "{} ({})",
            field(data, "filename"),
            field(data, "trigger")
        ),
        EventType::PerformanceSummary => format!(
            "TBT {}ms, {} long tasks",
            field(&data["metrics"], "total_blocking_time"),
            field(&data["metrics"], "long_tasks_count")
        ),
    };
    truncate(&text, DETAIL_WIDTH)
}

fn field(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let head: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", head)
}
