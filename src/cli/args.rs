//! Command-line argument definitions

use std::path::PathBuf;

use clap::{ArgGroup, Args};

/// Arguments for the run command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("plan_source").required(true).args(["plan", "instruction"])))]
pub struct RunArgs {
    /// Source video file
    #[arg(short, long)]
    pub input: PathBuf,

    /// File holding the plan (pure JSON or translator text)
    #[arg(short, long)]
    pub plan: Option<PathBuf>,

    /// Natural-language instruction sent to the translator
    #[arg(long)]
    pub instruction: Option<String>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// File holding translator output
    #[arg(short, long)]
    pub text_file: PathBuf,

    /// Normalize against this media duration in seconds
    #[arg(short, long)]
    pub duration: Option<f64>,
}

/// Arguments for the effects command
#[derive(Args, Debug)]
pub struct EffectsArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
