//! Performance trace reduction
//!
//! Converts a raw Chrome Trace Event file (routinely 50MB and up) into a
//! few hundred bytes of categorized main-thread metrics. The reduction is a
//! single pass over events that carry both a name and a duration; instant
//! events are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Discriminator written into every summary
pub const SUMMARY_TYPE: &str = "performance_trace";

/// Main-thread tasks longer than this block input handling (ms)
pub const LONG_TASK_THRESHOLD_MS: f64 = 50.0;

/// Scripting events longer than this are offender candidates (ms)
pub const OFFENDER_THRESHOLD_MS: f64 = 10.0;

/// Number of offenders surfaced in a summary
pub const MAX_OFFENDERS: usize = 5;

const HINT_BLOCKED: &str =
    "Main thread was blocked by long tasks; start with the listed offenders to reduce blocking time.";
const HINT_RESPONSIVE: &str =
    "No long tasks detected; the main thread stayed responsive during the session.";

const SCRIPTING_EVENTS: &[&str] = &["EvaluateScript", "FunctionCall", "v8.compile"];
const RENDERING_EVENTS: &[&str] = &["UpdateLayoutTree", "Layout", "RecalculateStyles"];
const PAINTING_EVENTS: &[&str] = &["Paint", "CompositeLayers"];
const LONG_TASK_EVENT: &str = "RunTask";

/// One entry of a trace file, reduced to the fields the summary needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTraceEvent {
    #[serde(default)]
    pub name: Option<String>,
    /// Duration in microseconds
    #[serde(default)]
    pub dur: Option<f64>,
    #[serde(default)]
    pub args: Option<Value>,
}

impl RawTraceEvent {
    /// Build a complete event; mostly useful for tests and fixtures
    pub fn complete(name: impl Into<String>, dur_us: f64, args: Option<Value>) -> Self {
        Self {
            name: Some(name.into()),
            dur: Some(dur_us),
            args,
        }
    }

    /// Offender label: embedded function name, then URL, then a generic label
    fn offender_name(&self) -> String {
        let data = self.args.as_ref().and_then(|args| args.get("data"));
        let field = |key: &str| {
            data.and_then(|d| d.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        field("functionName")
            .or_else(|| field("url"))
            .unwrap_or_else(|| "Inline Script".to_string())
    }
}

/// Time spent per work category (ms, rounded to 2 decimals)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTimes {
    pub scripting: f64,
    pub rendering: f64,
    pub painting: f64,
}

/// Metrics block of a summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceMetrics {
    /// Sum of each long task's time beyond the threshold (ms)
    pub total_blocking_time: f64,
    pub long_tasks_count: u64,
    pub categories: CategoryTimes,
}

/// Compact summary of a performance trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub summary_type: String,
    pub metrics: TraceMetrics,
    /// Up to five `"<name> (<duration>ms)"` entries, longest first
    pub offenders: Vec<String>,
    pub analysis_hint: String,
}

/// Result of summarizing a trace file
///
/// Serialized untagged, so failures look like `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceReport {
    Summary(PerformanceSummary),
    Error { error: String },
}

impl TraceReport {
    /// Whether this report is the error shape
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Extract trace events from a parsed trace document.
///
/// Accepts a bare array or an object with a `traceEvents` array; any other
/// shape yields no events. Elements that are not event objects are skipped.
pub fn parse_events(document: Value) -> Vec<RawTraceEvent> {
    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("traceEvents") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

/// Reduce trace events to a [`PerformanceSummary`].
///
/// # Examples
///
/// ```
/// use webtrail::trace::{summarize, RawTraceEvent};
///
/// let summary = summarize(&[RawTraceEvent::complete("RunTask", 120_000.0, None)]);
/// assert_eq!(summary.metrics.long_tasks_count, 1);
/// assert_eq!(summary.metrics.total_blocking_time, 70.0);
/// ```
pub fn summarize(events: &[RawTraceEvent]) -> PerformanceSummary {
    let mut categories = CategoryTimes::default();
    let mut total_blocking_time = 0.0;
    let mut long_tasks_count = 0u64;
    let mut candidates: Vec<(String, f64)> = Vec::new();

    for event in events {
        let (Some(name), Some(dur)) = (event.name.as_deref(), event.dur) else {
            continue;
        };
        let duration_ms = dur / 1000.0;

        if SCRIPTING_EVENTS.contains(&name) {
            categories.scripting += duration_ms;
            if duration_ms > OFFENDER_THRESHOLD_MS {
                candidates.push((event.offender_name(), duration_ms));
            }
        } else if RENDERING_EVENTS.contains(&name) {
            categories.rendering += duration_ms;
        } else if PAINTING_EVENTS.contains(&name) {
            categories.painting += duration_ms;
        } else if name == LONG_TASK_EVENT && duration_ms > LONG_TASK_THRESHOLD_MS {
            long_tasks_count += 1;
            total_blocking_time += duration_ms - LONG_TASK_THRESHOLD_MS;
        }
    }

    // Stable sort keeps encounter order among equal durations.
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    let offenders = candidates
        .into_iter()
        .take(MAX_OFFENDERS)
        .map(|(name, duration)| format!("{} ({:.1}ms)", name, duration))
        .collect();

    let analysis_hint = if long_tasks_count > 0 {
        HINT_BLOCKED
    } else {
        HINT_RESPONSIVE
    };

    PerformanceSummary {
        summary_type: SUMMARY_TYPE.to_string(),
        metrics: TraceMetrics {
            total_blocking_time: round2(total_blocking_time),
            long_tasks_count,
            categories: CategoryTimes {
                scripting: round2(categories.scripting),
                rendering: round2(categories.rendering),
                painting: round2(categories.painting),
            },
        },
        offenders,
        analysis_hint: analysis_hint.to_string(),
    }
}

/// Read, parse and summarize a trace file.
///
/// Never fails: a missing or unparsable file yields [`TraceReport::Error`].
pub fn summarize_file(path: &Path) -> TraceReport {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            return TraceReport::Error {
                error: format!("failed to read trace {}: {}", path.display(), e),
            }
        }
    };

    let document: Value = match serde_json::from_str(&contents) {
        Ok(document) => document,
        Err(e) => {
            return TraceReport::Error {
                error: format!("failed to parse trace {}: {}", path.display(), e),
            }
        }
    };

    let events = parse_events(document);
    tracing::debug!(path = %path.display(), events = events.len(), "Parsed trace events");
    TraceReport::Summary(summarize(&events))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
