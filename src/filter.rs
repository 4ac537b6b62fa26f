//! Noise filtering for observed network responses
//!
//! A page load produces hundreds of responses; only a handful say anything
//! about application behavior. [`NoiseFilter`] runs a fixed, short-circuiting
//! chain of drop rules and, for the survivors, plans what else to do with
//! them (notify the UI, snapshot the DOM on errors).

use crate::config::FilterConfig;
use crate::redact::sanitize;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use url::Url;

/// Suffix appended to truncated response snippets
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Resource class reported by the browser for a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    Xhr,
    Fetch,
    Websocket,
    #[serde(other)]
    Other,
}

impl ResourceType {
    /// Parse the browser's resource-type string, case-insensitively
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "document" => Self::Document,
            "stylesheet" => Self::Stylesheet,
            "image" => Self::Image,
            "media" => Self::Media,
            "font" => Self::Font,
            "script" => Self::Script,
            "xhr" => Self::Xhr,
            "fetch" => Self::Fetch,
            "websocket" => Self::Websocket,
            _ => Self::Other,
        }
    }

    /// Lower-case name as used in configuration and payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Stylesheet => "stylesheet",
            Self::Image => "image",
            Self::Media => "media",
            Self::Font => "font",
            Self::Script => "script",
            Self::Xhr => "xhr",
            Self::Fetch => "fetch",
            Self::Websocket => "websocket",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network response as observed by the browser layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkCandidate {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    pub status: u16,
    pub resource_type: ResourceType,
    /// Response `Content-Type` header, if known
    #[serde(default)]
    pub content_type: Option<String>,
    /// Response body text, if the browser layer read it
    #[serde(default)]
    pub body: Option<String>,
    /// Request body (post data), if any
    #[serde(default)]
    pub request_body: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl NetworkCandidate {
    /// Create a candidate with no bodies attached
    pub fn new(url: impl Into<String>, status: u16, resource_type: ResourceType) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            status,
            resource_type,
            content_type: None,
            body: None,
            request_body: None,
        }
    }

    /// Whether the response carries a JSON content type
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false)
    }

    /// Whether the response status is an error
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Why a candidate was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// URL matched a tracking/analytics blocklist entry
    BlockedDomain(String),
    /// Resource class is never interesting
    ResourceType(ResourceType),
    /// URL points at a static asset
    StaticAsset(String),
    /// Script loaded fine; only failed script loads are kept
    SuccessfulScript,
}

/// What to do with a candidate that survived the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepPlan {
    /// Emit a lightweight UI notification
    pub notify: bool,
    /// Attach a response snippet to the timeline event
    pub capture_snippet: bool,
    /// Request a DOM snapshot with this trigger label
    pub snapshot_trigger: Option<String>,
}

/// Outcome of running the filter chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    Drop(DropReason),
    Keep(KeepPlan),
}

impl FilterVerdict {
    /// Whether the candidate survived the chain
    pub fn is_kept(&self) -> bool {
        matches!(self, Self::Keep(_))
    }
}

/// Network noise filter
///
/// # Examples
///
/// ```
/// use webtrail::config::FilterConfig;
/// use webtrail::filter::{NetworkCandidate, NoiseFilter, ResourceType};
///
/// let filter = NoiseFilter::new(FilterConfig::default());
/// let ga = NetworkCandidate::new("https://www.google-analytics.com/collect", 200, ResourceType::Xhr);
/// assert!(!filter.evaluate(&ga).is_kept());
///
/// let api = NetworkCandidate::new("https://app.example/api/cart", 500, ResourceType::Fetch);
/// assert!(filter.evaluate(&api).is_kept());
/// ```
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    config: FilterConfig,
    blocked_types: Vec<ResourceType>,
    notify_types: Vec<ResourceType>,
    extensions: Vec<String>,
}

impl NoiseFilter {
    /// Create a filter from configuration
    pub fn new(config: FilterConfig) -> Self {
        let blocked_types = config
            .blocked_resource_types
            .iter()
            .map(|t| ResourceType::parse(t))
            .collect();
        let notify_types = config
            .notify_resource_types
            .iter()
            .map(|t| ResourceType::parse(t))
            .collect();
        let extensions = config
            .static_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        Self {
            config,
            blocked_types,
            notify_types,
            extensions,
        }
    }

    /// Run the drop chain in its fixed order and plan the follow-up for survivors
    pub fn evaluate(&self, candidate: &NetworkCandidate) -> FilterVerdict {
        if let Some(domain) = self
            .config
            .blocked_domains
            .iter()
            .find(|d| candidate.url.contains(d.as_str()))
        {
            return FilterVerdict::Drop(DropReason::BlockedDomain(domain.clone()));
        }

        if self.blocked_types.contains(&candidate.resource_type) {
            return FilterVerdict::Drop(DropReason::ResourceType(candidate.resource_type));
        }

        if let Some(ext) = url_extension(&candidate.url) {
            if self.extensions.contains(&ext) {
                return FilterVerdict::Drop(DropReason::StaticAsset(ext));
            }
        }

        if candidate.resource_type == ResourceType::Script && !candidate.is_error() {
            return FilterVerdict::Drop(DropReason::SuccessfulScript);
        }

        FilterVerdict::Keep(KeepPlan {
            notify: self.notify_types.contains(&candidate.resource_type),
            capture_snippet: candidate.is_json() && candidate.body.is_some(),
            snapshot_trigger: candidate
                .is_error()
                .then(|| format!("network_error_{}", candidate.status)),
        })
    }

    /// Build the `NETWORK_REQUEST` payload for a kept candidate
    ///
    /// JSON bodies that fit within the snippet cap are embedded as parsed JSON
    /// so the redactor can reach their fields; larger ones are truncated text.
    pub fn network_payload(&self, candidate: &NetworkCandidate, plan: &KeepPlan) -> Value {
        let mut payload = Map::new();
        payload.insert("method".into(), json!(candidate.method));
        payload.insert("url".into(), json!(candidate.url));
        payload.insert("status".into(), json!(candidate.status));
        payload.insert(
            "resource_type".into(),
            json!(candidate.resource_type.as_str()),
        );

        if plan.capture_snippet {
            if let Some(body) = &candidate.body {
                payload.insert("response_snippet".into(), self.snippet(body));
            }
        }

        if let Some(request_body) = &candidate.request_body {
            let value = serde_json::from_str::<Value>(request_body)
                .unwrap_or_else(|_| Value::String(request_body.clone()));
            payload.insert("request_body".into(), value);
        }

        Value::Object(payload)
    }

    fn snippet(&self, body: &str) -> Value {
        let cap = self.config.snippet_max_bytes;
        let text = match serde_json::from_str::<Value>(body) {
            Ok(parsed) => {
                // Truncated text is opaque to the redactor, so mask before cutting.
                let clean = sanitize(&parsed);
                let serialized = clean.to_string();
                if serialized.len() <= cap {
                    return clean;
                }
                serialized
            }
            Err(_) if body.len() <= cap => return Value::String(body.to_string()),
            Err(_) => body.to_string(),
        };
        Value::String(truncate_at(&text, cap))
    }

    /// Human-readable summary of the active rules
    pub fn summary(&self) -> String {
        format!(
            "blocked_domains={}, blocked_types={}, static_extensions={}, snippet_max_bytes={}",
            self.config.blocked_domains.len(),
            self.config.blocked_resource_types.join(","),
            self.extensions.len(),
            self.config.snippet_max_bytes
        )
    }
}

/// First `cap` bytes of `text`, backed off to a char boundary, plus the marker
fn truncate_at(text: &str, cap: usize) -> String {
    let mut end = cap.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &text[..end], TRUNCATION_MARKER)
}

/// Lower-cased file extension of the URL path, ignoring query and fragment
fn url_extension(raw: &str) -> Option<String> {
    let path = match Url::parse(raw) {
        Ok(url) => url.path().to_string(),
        Err(_) => raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let last_segment = path.rsplit('/').next()?;
    let (stem, ext) = last_segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
