//! End-to-end tests of the recording session lifecycle through the public API.

use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use webtrail::session::{
    EventType, SessionManager, SessionState, TraceCapture, CONSOLE_DUMP_FILE, RAW_TRACE_FILE,
};
use webtrail::ConsoleMessage;

mod common;

/// Capture that writes fixed contents to the raw trace path after a delay
#[derive(Debug)]
struct DelayedCapture {
    output: PathBuf,
    contents: &'static str,
    delay: Duration,
}

#[async_trait]
impl TraceCapture for DelayedCapture {
    async fn stop(&self) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        tokio::fs::write(&self.output, self.contents).await?;
        Ok(())
    }

    fn output_path(&self) -> &Path {
        &self.output
    }
}

fn attach(manager: &SessionManager, contents: &'static str, delay: Duration) {
    let output = manager.raw_trace_path().expect("session is recording");
    assert!(manager.attach_trace_capture(Arc::new(DelayedCapture {
        output,
        contents,
        delay,
    })));
}

#[tokio::test]
async fn test_click_and_login_are_recorded_redacted() {
    let dir = TempDir::new().unwrap();
    let config = common::config_in(dir.path());
    let manager = SessionManager::new(config.session.clone()).unwrap();

    let folder = manager.init(&config.session.output_dir).await.unwrap();
    assert_eq!(manager.state(), SessionState::Recording);

    manager.record_click(100.0, 200.0, "form > button", "BUTTON");
    manager.log_event(
        EventType::NetworkRequest,
        &json!({"url": "https://app.example/login", "password": "hunter2", "user": "ada"}),
    );

    assert_eq!(manager.stop().await.unwrap(), Some(folder.clone()));
    assert_eq!(manager.state(), SessionState::Idle);

    let timeline = common::read_timeline(&folder);
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].event_type, EventType::UserInteraction);
    assert_eq!(timeline[0].data["selector"], "form > button");
    assert_eq!(timeline[1].data["password"], "[REDACTED]");
    assert_eq!(timeline[1].data["user"], "ada");
    assert!(timeline[0].timestamp <= timeline[1].timestamp);

    let raw = std::fs::read_to_string(folder.join("timeline.json")).unwrap();
    assert!(!raw.contains("hunter2"));
}

#[tokio::test]
async fn test_trace_summary_is_last_and_raw_trace_removed() {
    let dir = TempDir::new().unwrap();
    let config = common::config_in(dir.path());
    let manager = SessionManager::new(config.session.clone()).unwrap();

    let folder = manager.init(&config.session.output_dir).await.unwrap();
    attach(&manager, common::LONG_TASK_TRACE, Duration::from_millis(10));
    manager.record_click(1.0, 1.0, "a", "A");

    manager.stop().await.unwrap();

    let timeline = common::read_timeline(&folder);
    assert_eq!(timeline.len(), 2);
    let summary = &timeline[1];
    assert_eq!(summary.event_type, EventType::PerformanceSummary);
    assert_eq!(summary.data["summary_type"], "performance_trace");
    assert_eq!(summary.data["metrics"]["total_blocking_time"], 70.0);
    assert_eq!(summary.data["offenders"][0], "https://app.example/bundle.js (25.0ms)");
    assert!(!folder.join(RAW_TRACE_FILE).exists());
}

#[tokio::test]
async fn test_corrupted_trace_still_flushes_timeline() {
    let dir = TempDir::new().unwrap();
    let config = common::config_in(dir.path());
    let manager = SessionManager::new(config.session.clone()).unwrap();

    let folder = manager.init(&config.session.output_dir).await.unwrap();
    attach(&manager, "{ this is not json", Duration::ZERO);
    manager.record_click(5.0, 5.0, "#x", "DIV");

    manager.stop().await.unwrap();

    let timeline = common::read_timeline(&folder);
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].event_type, EventType::UserInteraction);
}

#[tokio::test]
async fn test_hung_trace_stop_is_bounded() {
    let dir = TempDir::new().unwrap();
    let config = common::config_in(dir.path());
    let manager = SessionManager::new(config.session.clone()).unwrap();

    let folder = manager.init(&config.session.output_dir).await.unwrap();
    attach(&manager, common::LONG_TASK_TRACE, Duration::from_secs(30));
    manager.record_click(5.0, 5.0, "#x", "DIV");

    let started = std::time::Instant::now();
    manager.stop().await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));

    let timeline = common::read_timeline(&folder);
    assert_eq!(timeline.len(), 1);
    assert_eq!(manager.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_concurrent_stops_flush_once() {
    let dir = TempDir::new().unwrap();
    let config = common::config_in(dir.path());
    let manager = Arc::new(SessionManager::new(config.session.clone()).unwrap());

    let folder = manager.init(&config.session.output_dir).await.unwrap();
    attach(&manager, common::LONG_TASK_TRACE, Duration::from_millis(200));

    let first = tokio::spawn({
        let manager = manager.clone();
        async move { manager.stop().await.unwrap() }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(manager.state(), SessionState::Stopping);

    manager.record_click(9.0, 9.0, "late", "A");
    assert_eq!(manager.stop().await.unwrap(), None);
    assert_eq!(first.await.unwrap(), Some(folder.clone()));

    let timeline = common::read_timeline(&folder);
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].event_type, EventType::PerformanceSummary);
}

#[tokio::test]
async fn test_events_outside_a_session_are_dropped() {
    let dir = TempDir::new().unwrap();
    let config = common::config_in(dir.path());
    let manager = SessionManager::new(config.session.clone()).unwrap();

    manager.record_click(1.0, 1.0, "before", "A");
    assert_eq!(manager.stop().await.unwrap(), None);

    let folder = manager.init(&config.session.output_dir).await.unwrap();
    manager.record_click(1.0, 1.0, "during", "A");
    manager.stop().await.unwrap();
    manager.record_click(1.0, 1.0, "after", "A");

    let timeline = common::read_timeline(&folder);
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].data["selector"], "during");
}

#[tokio::test]
async fn test_reinit_flushes_previous_session() {
    let dir = TempDir::new().unwrap();
    let config = common::config_in(dir.path());
    let manager = SessionManager::new(config.session.clone()).unwrap();

    let first = manager.init(&config.session.output_dir).await.unwrap();
    manager.record_click(1.0, 1.0, "first", "A");
    let second = manager.init(&config.session.output_dir).await.unwrap();
    manager.record_click(2.0, 2.0, "second", "A");
    manager.stop().await.unwrap();

    assert_ne!(first, second);
    assert_eq!(common::session_folders(&config.session.output_dir).len(), 2);
    assert_eq!(common::read_timeline(&first)[0].data["selector"], "first");
    assert_eq!(common::read_timeline(&second)[0].data["selector"], "second");
}

#[tokio::test]
async fn test_console_dump_mode() {
    let dir = TempDir::new().unwrap();
    let mut config = common::config_in(dir.path());
    config.session.console_dump = true;
    let manager = SessionManager::new(config.session.clone()).unwrap();

    let folder = manager.init(&config.session.output_dir).await.unwrap();
    manager.log_console(&ConsoleMessage::new("error", "Uncaught TypeError", "app.js:3"));
    manager.stop().await.unwrap();

    assert!(common::read_timeline(&folder).is_empty());
    let dump = std::fs::read_to_string(folder.join(CONSOLE_DUMP_FILE)).unwrap();
    assert!(dump.contains("[ERROR] Uncaught TypeError (app.js:3)"));
}
