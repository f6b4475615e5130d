//! CLI module for editplan
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// editplan - run machine-generated video edit plans through ffmpeg
///
/// Cuts a source video into the segments of an edit plan, applies the
/// requested effects and merges the result into one file. Intermediate
/// files never outlive the run.
#[derive(Parser, Debug)]
#[command(name = "editplan")]
#[command(about = "Execute video edit plans with ffmpeg")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./editplan.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an edit plan against a video
    Run(args::RunArgs),
    /// Extract a plan from translator text and print it as JSON
    Extract(args::ExtractArgs),
    /// List the built-in effects
    Effects(args::EffectsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_requires_plan_or_instruction() {
        assert!(Cli::try_parse_from(["editplan", "run", "--input", "a.mp4"]).is_err());
        assert!(Cli::try_parse_from([
            "editplan", "run", "--input", "a.mp4", "--plan", "p.json", "--instruction", "x"
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "editplan",
            "--log-level",
            "debug",
            "run",
            "-i",
            "a.mp4",
            "--instruction",
            "slow down the end",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.instruction.as_deref(), Some("slow down the end"));
                assert!(args.plan.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
