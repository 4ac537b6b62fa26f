//! Redaction of sensitive fields in event payloads
//!
//! Every payload passes through [`sanitize`] before it is buffered, so the
//! persisted timeline never carries credentials captured from the page.

use serde_json::{Map, Value};

/// Marker written in place of a sensitive value
pub const REDACTED: &str = "[REDACTED]";

/// Substrings that mark a key as sensitive (matched against the lower-cased key)
const SENSITIVE_KEY_PARTS: &[&str] = &[
    "password",
    "token",
    "auth",
    "secret",
    "key",
    "credential",
    "authorization",
    "apikey",
    "api_key",
];

/// Subtrees nested deeper than this are replaced by the marker.
const MAX_DEPTH: usize = 64;

/// Return a copy of `value` with sensitive fields masked.
///
/// Scalars are returned unchanged, arrays are mapped element-wise and objects
/// are rebuilt key by key. A key is sensitive when its lower-cased form
/// contains any of the fixed sensitive substrings; its value is replaced by
/// [`REDACTED`] unless it is `null`.
///
/// Masking is a fixed point: `sanitize(&sanitize(v)) == sanitize(v)`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use webtrail::redact::{sanitize, REDACTED};
///
/// let clean = sanitize(&json!({"user": "ada", "Password": "hunter2"}));
/// assert_eq!(clean["user"], "ada");
/// assert_eq!(clean["Password"], REDACTED);
/// ```
pub fn sanitize(value: &Value) -> Value {
    sanitize_at(value, 0)
}

fn sanitize_at(value: &Value, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::String(REDACTED.to_string());
    }

    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_at(item, depth + 1))
                .collect(),
        ),
        Value::Object(map) => {
            let mut clean = Map::with_capacity(map.len());
            for (key, val) in map {
                let masked = if is_sensitive_key(key) && !val.is_null() {
                    Value::String(REDACTED.to_string())
                } else {
                    sanitize_at(val, depth + 1)
                };
                clean.insert(key.clone(), masked);
            }
            Value::Object(clean)
        }
        _ => value.clone(),
    }
}

/// Whether a record key names a sensitive field
pub fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_lowercase();
    SENSITIVE_KEY_PARTS
        .iter()
        .any(|part| lowered.contains(part))
}
