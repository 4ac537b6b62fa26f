//! Trace capture collaborators
//!
//! The browser layer records the raw performance trace; the session only
//! needs to tell it to stop and to know where the file lands.

use crate::error::{Result, WebtrailError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// File name the raw trace is written to inside the session folder
pub const RAW_TRACE_FILE: &str = "trace_raw.json";

/// A running performance-trace capture
#[async_trait]
pub trait TraceCapture: Send + Sync + std::fmt::Debug {
    /// Stop capturing and finish writing the raw trace file
    async fn stop(&self) -> Result<()>;

    /// Where the raw trace file is (or will be) written
    fn output_path(&self) -> &Path;
}

/// A capture backed by an already recorded trace file.
///
/// Stopping copies the recording to the output path, which lets offline
/// replays exercise the same stop path as a live browser capture.
#[derive(Debug, Clone)]
pub struct FileTraceCapture {
    source: PathBuf,
    output: PathBuf,
}

impl FileTraceCapture {
    /// Create a capture that will place `source` at `output` when stopped
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
        }
    }
}

#[async_trait]
impl TraceCapture for FileTraceCapture {
    async fn stop(&self) -> Result<()> {
        tokio::fs::copy(&self.source, &self.output)
            .await
            .map_err(|e| {
                WebtrailError::Trace(format!(
                    "Failed to copy trace {} to {}: {}",
                    self.source.display(),
                    self.output.display(),
                    e
                ))
            })?;
        Ok(())
    }

    fn output_path(&self) -> &Path {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_error_contains;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_capture_copies_on_stop() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("recorded.json");
        std::fs::write(&source, "[]").unwrap();
        let output = dir.path().join(RAW_TRACE_FILE);

        let capture = FileTraceCapture::new(&source, &output);
        assert_eq!(capture.output_path(), output.as_path());
        assert!(!output.exists());

        capture.stop().await.unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_file_capture_missing_source_errors() {
        let dir = TempDir::new().unwrap();
        let capture = FileTraceCapture::new(dir.path().join("nope.json"), dir.path().join("out.json"));
        assert_error_contains(capture.stop().await, "Trace error");
    }
}
