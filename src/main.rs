//! Webtrail - browser session telemetry reducer
//!
#![doc = "Webtrail - browser session telemetry reducer"]
#![doc = "Main entry point for the webtrail command-line tool."]

use anyhow::Result;

use webtrail::cli::{Cli, Commands};
use webtrail::commands;
use webtrail::config::Config;
use webtrail::logging::{init_logging, with_startup_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration; warnings surface before the configured logger exists
    let config_path = cli.config.as_deref().unwrap_or("config/webtrail.yaml");
    let config = with_startup_logging(|| Config::load(config_path, &cli))?;

    // Validate configuration
    config.validate()?;

    init_logging(&config.logging)?;
    tracing::debug!("Loaded configuration from {}", config_path);

    // Execute command
    match cli.command {
        Commands::Summarize { trace, compact } => {
            tracing::info!("Summarizing trace {}", trace.display());
            commands::run_summarize(&trace, compact)?;
            Ok(())
        }
        Commands::Replay { feed, trace } => {
            tracing::info!("Replaying feed {}", feed.display());
            if let Some(t) = &trace {
                tracing::debug!("Using recorded trace: {}", t.display());
            }
            commands::run_replay(config, feed, trace).await?;
            Ok(())
        }
        Commands::Show { session_dir, json } => {
            commands::run_show(&session_dir, json)?;
            Ok(())
        }
    }
}
