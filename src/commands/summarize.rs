//! `summarize` command: reduce a trace file to its metrics summary

use crate::error::{Result, WebtrailError};
use crate::trace::{self, TraceReport};
use std::path::Path;

/// Summarize `trace_path` and print the report as JSON.
///
/// The report is printed even when it is the error shape, so callers that
/// parse stdout always get a JSON document.
///
/// # Errors
///
/// Returns [`WebtrailError::Trace`] after printing if the trace could not be
/// read or parsed.
pub fn run_summarize(trace_path: &Path, compact: bool) -> Result<()> {
    tracing::debug!("Summarizing trace {}", trace_path.display());

    let report = trace::summarize_file(trace_path);
    println!("{}", render_report(&report, compact)?);

    match report {
        TraceReport::Summary(summary) => {
            tracing::info!(
                long_tasks = summary.metrics.long_tasks_count,
                blocking_ms = summary.metrics.total_blocking_time,
                "Trace summarized"
            );
            Ok(())
        }
        TraceReport::Error { error } => Err(WebtrailError::Trace(error).into()),
    }
}

/// Serialize a report as pretty or single-line JSON
pub fn render_report(report: &TraceReport, compact: bool) -> Result<String> {
    let rendered = if compact {
        serde_json::to_string(report)?
    } else {
        serde_json::to_string_pretty(report)?
    };
    Ok(rendered)
}
