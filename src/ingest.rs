//! Ingestion of raw browser telemetry
//!
//! The browser-control layer delivers clicks, console lines, network
//! responses and snapshot requests as callbacks. They are pushed onto a
//! bounded channel of [`IngestEvent`]s and consumed by a [`Pipeline`] in
//! arrival order, which keeps the timeline ordering identical to delivery
//! order without the pipeline knowing how events are produced.
//!
//! ```text
//! browser layer ──► IngestSender ──► Pipeline::run ──► NoiseFilter (network)
//!                                        │
//!                                        └──► SessionManager ──► Redactor ──► SessionStore
//! ```

use crate::error::{Result, WebtrailError};
use crate::filter::{FilterVerdict, NetworkCandidate, NoiseFilter};
use crate::session::{ConsoleMessage, EventType, SessionManager};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Sending half handed to the browser layer
pub type IngestSender = mpsc::Sender<IngestEvent>;

/// Receiving half consumed by [`Pipeline::run`]
pub type IngestReceiver = mpsc::Receiver<IngestEvent>;

/// Create the bounded ingestion channel
pub fn channel(capacity: usize) -> (IngestSender, IngestReceiver) {
    mpsc::channel(capacity)
}

/// A typed raw event from the browser layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestEvent {
    /// The user clicked an element
    Click {
        x: f64,
        y: f64,
        selector: String,
        #[serde(default)]
        tag: String,
    },
    /// The page wrote to the console
    Console(ConsoleMessage),
    /// A network response was observed
    Network(NetworkCandidate),
    /// The UI asked for a DOM snapshot
    Snapshot {
        html: String,
        #[serde(default = "default_snapshot_trigger")]
        trigger: String,
    },
}

fn default_snapshot_trigger() -> String {
    "manual".to_string()
}

/// Services the pipeline needs from the live browser page
#[async_trait]
pub trait BrowserBridge: Send + Sync {
    /// Show a lightweight notification in the in-page widget
    async fn notify(&self, message: &str) -> Result<()>;

    /// Serialize the current DOM
    async fn capture_dom(&self) -> Result<String>;
}

/// Bridge for runs without a live page: notifications are logged, DOM capture fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBridge;

#[async_trait]
impl BrowserBridge for NullBridge {
    async fn notify(&self, message: &str) -> Result<()> {
        debug!(message = %message, "Notification (no page attached)");
        Ok(())
    }

    async fn capture_dom(&self) -> Result<String> {
        Err(WebtrailError::Snapshot("no live page attached".to_string()).into())
    }
}

/// Routes ingested events into the active session
pub struct Pipeline {
    manager: Arc<SessionManager>,
    filter: NoiseFilter,
    bridge: Arc<dyn BrowserBridge>,
}

impl Pipeline {
    /// Create a pipeline feeding `manager`
    pub fn new(manager: Arc<SessionManager>, filter: NoiseFilter, bridge: Arc<dyn BrowserBridge>) -> Self {
        Self {
            manager,
            filter,
            bridge,
        }
    }

    /// Consume events until every sender is dropped; returns how many were handled
    pub async fn run(self, mut receiver: IngestReceiver) -> usize {
        info!(filters = %self.filter.summary(), "Ingestion pipeline started");

        let mut handled = 0;
        while let Some(event) = receiver.recv().await {
            self.handle(event).await;
            handled += 1;
        }

        info!(events = handled, "Ingestion pipeline drained");
        handled
    }

    /// Handle a single event. Never fails; problems are logged.
    pub async fn handle(&self, event: IngestEvent) {
        match event {
            IngestEvent::Click { x, y, selector, tag } => {
                self.manager.record_click(x, y, &selector, &tag);
            }
            IngestEvent::Console(message) => self.manager.log_console(&message),
            IngestEvent::Network(candidate) => self.handle_network(candidate).await,
            IngestEvent::Snapshot { html, trigger } => {
                if let Err(e) = self.manager.save_snapshot(&html, &trigger) {
                    warn!(error = %e, trigger = %trigger, "Snapshot not saved");
                }
            }
        }
    }

    async fn handle_network(&self, candidate: NetworkCandidate) {
        let plan = match self.filter.evaluate(&candidate) {
            FilterVerdict::Drop(reason) => {
                trace!(url = %candidate.url, reason = ?reason, "Network response dropped");
                return;
            }
            FilterVerdict::Keep(plan) => plan,
        };

        if plan.notify {
            let message = format!("{} {} {}", candidate.method, candidate.status, candidate.url);
            if let Err(e) = self.bridge.notify(&message).await {
                debug!(error = %e, "Notification failed");
            }
        }

        if !self.manager.is_recording() {
            return;
        }

        self.manager.log_event(
            EventType::NetworkRequest,
            &self.filter.network_payload(&candidate, &plan),
        );

        if let Some(trigger) = plan.snapshot_trigger {
            match self.bridge.capture_dom().await {
                Ok(html) => {
                    if let Err(e) = self.manager.save_snapshot(&html, &trigger) {
                        warn!(error = %e, trigger = %trigger, "Error snapshot not saved");
                    }
                }
                Err(e) => warn!(error = %e, trigger = %trigger, "DOM unavailable for error snapshot"),
            }
        }
    }
}
