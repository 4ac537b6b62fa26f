//! Test utilities for Webtrail
//!
//! Temporary directories, fixture files, canned traces and feeds, and
//! assertion helpers shared by the unit tests.

use crate::config::Config;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: crate::error::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Default configuration writing sessions under `dir/sessions`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.session.output_dir = dir.join("sessions");
    config
}

/// A trace with one 120ms long task and one 30ms scripting offender
pub fn sample_trace_json() -> &'static str {
    r#"{"traceEvents": [
        {"name": "RunTask", "ph": "X", "dur": 120000},
        {"name": "FunctionCall", "ph": "X", "dur": 30000, "args": {"data": {"functionName": "checkout"}}},
        {"name": "Layout", "ph": "X", "dur": 4000},
        {"name": "Paint", "ph": "X", "dur": 1500},
        {"name": "navigationStart", "ph": "I"}
    ]}"#
}

/// A JSON-lines feed: a click and a login request carrying a password
pub fn sample_feed() -> String {
    [
        r#"{"kind":"click","x":10,"y":20,"selector":"form > button","tag":"BUTTON"}"#,
        r#"{"kind":"network","url":"https://app.example/login","method":"POST","status":200,"resource_type":"fetch","request_body":"{\"user\":\"ada\",\"password\":\"hunter2\"}"}"#,
        r#"{"kind":"network","url":"https://app.example/logo.png","status":200,"resource_type":"image"}"#,
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WebtrailError;

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "trace.json", sample_trace_json());
        assert!(path.exists());
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed["traceEvents"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_assert_error_contains() {
        let result: crate::error::Result<()> =
            Err(WebtrailError::Config("invalid timeout".to_string()).into());
        assert_error_contains(result, "invalid timeout");
    }

    #[test]
    #[should_panic(expected = "but got Ok")]
    fn test_assert_error_contains_panics_on_ok() {
        assert_error_contains(Ok(()), "anything");
    }

    #[test]
    fn test_sample_feed_has_three_lines() {
        assert_eq!(sample_feed().lines().count(), 3);
    }
}
