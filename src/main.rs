//! editplan
//!
//! Executes machine-generated video edit plans: cut the source into
//! segments, apply per-segment effects, merge the result. A run either
//! produces exactly one output file or leaves nothing behind.
//!
//! # Usage
//!
//! ```bash
//! editplan run --input video.mp4 --plan plan.json
//! editplan run --input video.mp4 --instruction "slow motion from 10 to 20 seconds"
//! editplan extract --text-file answer.txt --duration 30
//! editplan effects
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use editplan_cli::adapters::{init_logging, LogSettings, PipelineConfig};
use editplan_cli::cli::{commands, Cli, Commands};

/// Main entry point for the editplan CLI application
#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Configuration precedence: CLI > environment > file > defaults
    let mut config = PipelineConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.set("logging_level", level)?;
        config.validate()?;
    }

    init_logging(&LogSettings {
        level: config.logging.level.clone(),
        json: config.logging.json,
    })?;
    debug!("Effective configuration: {:?}", config);

    // Execute the requested command
    let code = match cli.command {
        Commands::Run(args) => {
            info!("Executing run command");
            commands::run(args, &config).await?
        }
        Commands::Extract(args) => {
            info!("Executing extract command");
            commands::extract(args)?
        }
        Commands::Effects(args) => commands::effects(args)?,
    };

    Ok(code)
}
