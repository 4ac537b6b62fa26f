//! Command-line interface definition for Webtrail
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for trace summarization, offline session replay,
//! and timeline inspection.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Webtrail - browser session telemetry reducer
///
/// Turns raw DOM, network, console and performance-trace telemetry into a
/// compact, redacted timeline.
#[derive(Parser, Debug, Clone)]
#[command(name = "webtrail")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/webtrail.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the directory session folders are written to
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Webtrail
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Reduce a Chrome performance trace to a metrics summary
    Summarize {
        /// Path to the trace file (Trace Event JSON)
        trace: PathBuf,

        /// Print single-line JSON instead of pretty output
        #[arg(long)]
        compact: bool,
    },

    /// Run a recorded JSON-lines event feed through a full session
    Replay {
        /// Path to the feed (one ingestion event per line)
        feed: PathBuf,

        /// Pre-recorded trace file to summarize at the end of the session
        #[arg(short, long)]
        trace: Option<PathBuf>,
    },

    /// Print the timeline of a finished session
    Show {
        /// Session folder containing timeline.json
        session_dir: PathBuf,

        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/webtrail.yaml".to_string()),
            verbose: false,
            output_dir: None,
            command: Commands::Show {
                session_dir: PathBuf::from("."),
                json: false,
            },
        }
    }
}
