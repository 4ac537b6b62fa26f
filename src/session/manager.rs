//! Recording session lifecycle
//!
//! [`SessionManager`] owns at most one [`Session`] at a time and moves it
//! through `Idle → Recording → Stopping → Idle`. State transitions are
//! atomic so a duplicated stop request performs the irreversible steps
//! (trace deletion, timeline flush) exactly once.
//!
//! Once a stop has begun it runs to completion on its own task: dropping the
//! future returned by [`SessionManager::stop`] does not cancel the flush.

use super::capture::{TraceCapture, RAW_TRACE_FILE};
use super::store::SessionStore;
use super::types::{ConsoleMessage, EventType, SessionState};
use crate::config::SessionConfig;
use crate::error::{Result, WebtrailError};
use crate::trace::{self, TraceReport};
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use regex::Regex;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Matches `<script>` and `<style>` blocks, including their content
const SCRIPT_BLOCK_PATTERN: &str = r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>";

/// One bounded recording interval
#[derive(Debug)]
struct Session {
    id: String,
    started_at: DateTime<Utc>,
    store: SessionStore,
}

/// State shared between the manager and an in-flight stop task
#[derive(Debug)]
struct Shared {
    config: SessionConfig,
    state: AtomicU8,
    session: Mutex<Option<Session>>,
    trace_capture: Mutex<Option<Arc<dyn TraceCapture>>>,
}

/// Orchestrates the recording session lifecycle
///
/// # Examples
///
/// ```no_run
/// use serde_json::json;
/// use webtrail::config::SessionConfig;
/// use webtrail::session::{EventType, SessionManager};
///
/// # async fn example() -> anyhow::Result<()> {
/// let manager = SessionManager::new(SessionConfig::default())?;
/// let folder = manager.init(std::path::Path::new("/tmp/sessions")).await?;
/// manager.log_event(EventType::UserInteraction, &json!({"action": "click"}));
/// let flushed = manager.stop().await?;
/// assert_eq!(flushed, Some(folder));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionManager {
    shared: Arc<Shared>,
    script_blocks: Regex,
}

impl SessionManager {
    /// Create an idle manager
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot scrubbing pattern fails to compile
    pub fn new(config: SessionConfig) -> Result<Self> {
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                state: AtomicU8::new(SessionState::Idle as u8),
                session: Mutex::new(None),
                trace_capture: Mutex::new(None),
            }),
            script_blocks: Regex::new(SCRIPT_BLOCK_PATTERN)?,
        })
    }

    /// Session configuration in use
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Whether events are currently being recorded
    pub fn is_recording(&self) -> bool {
        self.state() == SessionState::Recording
    }

    /// Folder of the active session, if any
    pub fn current_folder(&self) -> Option<PathBuf> {
        self.shared
            .session
            .lock()
            .as_ref()
            .map(|s| s.store.folder().to_path_buf())
    }

    /// Identifier of the active session, derived from its start instant
    pub fn session_id(&self) -> Option<String> {
        self.shared.session.lock().as_ref().map(|s| s.id.clone())
    }

    /// Where a trace capture for the active session should write its raw file
    pub fn raw_trace_path(&self) -> Option<PathBuf> {
        self.current_folder().map(|folder| folder.join(RAW_TRACE_FILE))
    }

    /// Start a new session under `output_dir` and return its folder.
    ///
    /// A session that is still recording is stopped and flushed first so its
    /// buffer is never silently discarded.
    ///
    /// # Errors
    ///
    /// Returns [`WebtrailError::SessionBusy`] while a stop is in progress, or
    /// an IO error if the session folder cannot be created.
    pub async fn init(&self, output_dir: &Path) -> Result<PathBuf> {
        match self.state() {
            SessionState::Stopping => {
                return Err(WebtrailError::SessionBusy(
                    "previous session is still stopping".to_string(),
                )
                .into());
            }
            SessionState::Recording => {
                warn!("Session start requested while recording; flushing the current session first");
                if let Err(e) = self.stop().await {
                    warn!(error = %e, "Previous session could not be flushed");
                }
            }
            SessionState::Idle => {}
        }

        let started_at = Utc::now();
        let id = folder_timestamp(&started_at);

        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
        let folder = unique_path(output_dir, &format!("session_{}", id), "");
        tokio::fs::create_dir(&folder)
            .await
            .with_context(|| format!("Failed to create session folder {}", folder.display()))?;

        let started = {
            let mut slot = self.shared.session.lock();
            if self.state() == SessionState::Idle {
                *slot = Some(Session {
                    id: id.clone(),
                    started_at,
                    store: SessionStore::new(&folder),
                });
                *self.shared.trace_capture.lock() = None;
                self.shared
                    .state
                    .store(SessionState::Recording as u8, Ordering::SeqCst);
                true
            } else {
                false
            }
        };

        if !started {
            let _ = tokio::fs::remove_dir(&folder).await;
            return Err(WebtrailError::SessionBusy(
                "another session started concurrently".to_string(),
            )
            .into());
        }

        info!(session_id = %id, folder = %folder.display(), "Session started");
        Ok(folder)
    }

    /// Timestamp, redact and buffer an event. Dropped unless recording.
    pub fn log_event(&self, event_type: EventType, data: &Value) {
        if !self.is_recording() {
            return;
        }

        let mut slot = self.shared.session.lock();
        // Re-check under the lock: a stop may have begun since the fast path.
        if !self.is_recording() {
            return;
        }
        if let Some(session) = slot.as_mut() {
            session.store.append(event_type, data);
        }
    }

    /// Record a click on the page
    pub fn record_click(&self, x: f64, y: f64, selector: &str, tag: &str) {
        self.log_event(
            EventType::UserInteraction,
            &json!({
                "action": "click",
                "x": x,
                "y": y,
                "selector": selector,
                "tag": tag,
            }),
        );
    }

    /// Record a console message, either in the timeline or in the console dump
    pub fn log_console(&self, message: &ConsoleMessage) {
        if !self.shared.config.console_dump {
            self.log_event(message.event_type(), &message.payload());
            return;
        }

        if !self.is_recording() {
            return;
        }
        let mut slot = self.shared.session.lock();
        if !self.is_recording() {
            return;
        }
        if let Some(session) = slot.as_mut() {
            session.store.append_console_line(message);
        }
    }

    /// Write a DOM snapshot into the session folder and reference it in the timeline.
    ///
    /// Returns `Ok(None)` when no session is recording. A stop that begins
    /// while the file is being written wins: the file is removed and no
    /// event is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`WebtrailError::Snapshot`] if the file cannot be written.
    pub fn save_snapshot(&self, html: &str, trigger: &str) -> Result<Option<String>> {
        if !self.is_recording() {
            return Ok(None);
        }
        let Some(folder) = self.current_folder() else {
            return Ok(None);
        };

        let content = if self.shared.config.strip_snapshot_scripts {
            self.script_blocks.replace_all(html, "").into_owned()
        } else {
            html.to_string()
        };

        let stem = format!("snap_{}", folder_timestamp(&Utc::now()));
        let path = unique_path(&folder, &stem, ".html");
        std::fs::write(&path, content).map_err(|e| {
            WebtrailError::Snapshot(format!("Failed to write {}: {}", path.display(), e))
        })?;

        Ok(self.commit_snapshot(&folder, &path, trigger))
    }

    /// Reference a written snapshot in the timeline, or remove the file if
    /// the session it was written for is no longer recording.
    fn commit_snapshot(&self, folder: &Path, path: &Path, trigger: &str) -> Option<String> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let recorded = {
            let mut slot = self.shared.session.lock();
            match slot.as_mut() {
                Some(session) if self.is_recording() && session.store.folder() == folder => {
                    session.store.append(
                        EventType::Snapshot,
                        &json!({"filename": filename, "trigger": trigger}),
                    );
                    true
                }
                _ => false,
            }
        };

        if !recorded {
            debug!(filename = %filename, "Session stopped while saving snapshot; discarding file");
            if let Err(e) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "Failed to remove orphaned snapshot");
            }
            return None;
        }

        debug!(filename = %filename, trigger = %trigger, "Snapshot saved");
        Some(filename)
    }

    /// Register the trace capture running for the active session.
    ///
    /// Returns `false` (and ignores the capture) when no session is recording.
    pub fn attach_trace_capture(&self, capture: Arc<dyn TraceCapture>) -> bool {
        if !self.is_recording() {
            return false;
        }
        debug!(path = %capture.output_path().display(), "Trace capture attached");
        *self.shared.trace_capture.lock() = Some(capture);
        true
    }

    /// Stop the active session and persist its timeline.
    ///
    /// At most one call performs the stop; concurrent or repeated calls
    /// return `Ok(None)` immediately. Events arriving once stopping has begun
    /// are dropped. The timeline is flushed even when every trace step fails,
    /// and even when the caller stops awaiting this future.
    ///
    /// # Returns
    ///
    /// The session folder, or `None` if no session was recording.
    ///
    /// # Errors
    ///
    /// Returns [`WebtrailError::Storage`] if `timeline.json` cannot be written.
    pub async fn stop(&self) -> Result<Option<PathBuf>> {
        if let Err(current) = self.shared.state.compare_exchange(
            SessionState::Recording as u8,
            SessionState::Stopping as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            match SessionState::from_u8(current) {
                SessionState::Stopping => debug!("Stop already in progress; ignoring"),
                _ => debug!("Stop requested with no active session"),
            }
            return Ok(None);
        }

        info!("Stopping session");

        let shared = self.shared.clone();
        let stopper = tokio::spawn(async move { shared.finish_stop().await });
        match stopper.await {
            Ok(result) => result,
            Err(e) => {
                self.shared.mark_idle();
                Err(WebtrailError::Storage(format!("Session stop task failed: {}", e)).into())
            }
        }
    }
}

impl Shared {
    fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn mark_idle(&self) {
        self.state.store(SessionState::Idle as u8, Ordering::SeqCst);
    }

    /// Everything after the `Recording → Stopping` transition. Idle is restored last.
    async fn finish_stop(self: Arc<Self>) -> Result<Option<PathBuf>> {
        let capture = self.trace_capture.lock().take();
        if let Some(capture) = capture {
            self.finish_trace(capture).await;
        }

        let session = self.session.lock().take();
        let result = match session {
            Some(session) => Self::flush(session).await,
            None => Ok(None),
        };

        self.mark_idle();
        result
    }

    async fn flush(session: Session) -> Result<Option<PathBuf>> {
        let Session {
            id,
            started_at,
            store,
        } = session;
        let folder = store.folder().to_path_buf();
        let events = store.len();

        tokio::task::spawn_blocking(move || store.flush())
            .await
            .map_err(|e| WebtrailError::Storage(format!("Timeline flush task failed: {}", e)))??;

        let elapsed = Utc::now() - started_at;
        info!(
            session_id = %id,
            events,
            duration_ms = elapsed.num_milliseconds(),
            "Session stopped"
        );
        Ok(Some(folder))
    }

    /// Stop the trace capture within the configured bound and summarize its output.
    ///
    /// On timeout the capture task is left running detached; it may still
    /// write the raw file afterwards, which is then left in place.
    async fn finish_trace(&self, capture: Arc<dyn TraceCapture>) {
        let raw_path = capture.output_path().to_path_buf();
        let bound = Duration::from_secs(self.config.trace_stop_timeout_secs);
        let stopper = tokio::spawn(async move { capture.stop().await });

        match tokio::time::timeout(bound, stopper).await {
            Ok(Ok(Ok(()))) => debug!("Trace capture stopped"),
            Ok(Ok(Err(e))) => warn!(error = %e, "Trace capture failed to stop cleanly"),
            Ok(Err(e)) => warn!(error = %e, "Trace capture task failed"),
            Err(_) => {
                warn!(
                    timeout_secs = self.config.trace_stop_timeout_secs,
                    "Trace capture did not stop in time; skipping performance summary"
                );
                return;
            }
        }

        if !raw_path.exists() {
            debug!(path = %raw_path.display(), "No raw trace file; skipping performance summary");
            return;
        }

        let path = raw_path.clone();
        match tokio::task::spawn_blocking(move || trace::summarize_file(&path)).await {
            Ok(TraceReport::Summary(summary)) => match serde_json::to_value(&summary) {
                Ok(data) => self.append_while_stopping(EventType::PerformanceSummary, &data),
                Err(e) => warn!(error = %e, "Failed to encode performance summary"),
            },
            Ok(TraceReport::Error { error }) => {
                warn!(error = %error, "Trace could not be summarized; timeline will not include it")
            }
            Err(e) => warn!(error = %e, "Trace summarization task failed"),
        }

        if let Err(e) = tokio::fs::remove_file(&raw_path).await {
            warn!(path = %raw_path.display(), error = %e, "Failed to delete raw trace file");
        }
    }

    fn append_while_stopping(&self, event_type: EventType, data: &Value) {
        if let Some(session) = self.session.lock().as_mut() {
            session.store.append(event_type, data);
        }
    }
}

/// ISO-8601 instant with `:` and `.` replaced so it is safe in file names
pub fn folder_timestamp(instant: &DateTime<Utc>) -> String {
    instant
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// `dir/<stem><ext>`, or `dir/<stem>_<n><ext>` for the first unused `n`
fn unique_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let candidate = dir.join(format!("{}{}", stem, ext));
    if !candidate.exists() {
        return candidate;
    }

    let mut n = 1;
    loop {
        let candidate = dir.join(format!("{}_{}{}", stem, n, ext));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
