//! Command implementations

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::adapters::PipelineConfig;
use crate::app::{AppContainer, DefaultAppContainer};
use crate::cli::args::{EffectsArgs, ExtractArgs, RunArgs};
use crate::domain::model::{PipelineFailure, PipelineReport};
use crate::engine::catalog::{EffectCatalog, EffectRecipe};
use crate::planner::{PlanExtractor, PlanNormalizer};
use crate::ports::CancelHandle;
use crate::utils::Utils;

/// Execute the run command
pub async fn run(args: RunArgs, config: &PipelineConfig) -> Result<ExitCode> {
    info!("Input: {}", args.input.display());

    let container = DefaultAppContainer::new(config).context("Failed to set up pipeline")?;
    let interactor = container.pipeline_interactor();

    let (handle, token) = CancelHandle::pair();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            handle.cancel();
        }
    });

    let result = match (&args.plan, &args.instruction) {
        (Some(plan_path), _) => {
            let text = std::fs::read_to_string(plan_path)
                .with_context(|| format!("Failed to read plan file {}", plan_path.display()))?;
            interactor.run_text(&args.input, &text, &token).await
        }
        (None, Some(instruction)) => interactor.run_instruction(&args.input, instruction, &token).await,
        (None, None) => anyhow::bail!("either --plan or --instruction is required"),
    };
    ctrl_c.abort();

    match result {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            print_failure(&failure);
            Ok(ExitCode::from(1))
        }
    }
}

/// Execute the extract command
pub fn extract(args: ExtractArgs) -> Result<ExitCode> {
    let text = std::fs::read_to_string(&args.text_file)
        .with_context(|| format!("Failed to read {}", args.text_file.display()))?;

    let plan = match PlanExtractor::extract(&text) {
        Ok(plan) => plan,
        Err(err) => {
            eprintln!("{}", err);
            return Ok(ExitCode::from(1));
        }
    };

    let json = match args.duration {
        Some(duration) if duration.is_finite() && duration > 0.0 => serde_json::to_string_pretty(
            &PlanNormalizer::normalize_with_duration(plan, duration),
        )?,
        Some(duration) => anyhow::bail!("--duration must be a positive number, got {}", duration),
        None => serde_json::to_string_pretty(&plan)?,
    };
    println!("{}", json);
    Ok(ExitCode::SUCCESS)
}

/// One catalog entry as printed by `effects --json`
#[derive(Debug, Serialize)]
struct EffectListing {
    name: &'static str,
    kind: &'static str,
    video_filter: String,
    audio_filter: Option<String>,
}

/// Execute the effects command
pub fn effects(args: EffectsArgs) -> Result<ExitCode> {
    let listings: Vec<EffectListing> = EffectCatalog::entries()
        .map(|(name, recipe)| EffectListing {
            name,
            kind: match recipe {
                EffectRecipe::FilterGraph(_) => "filter",
                EffectRecipe::TimeRemap { .. } => "time-remap",
            },
            video_filter: recipe.video_filter(),
            audio_filter: recipe.audio_filter(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
    } else {
        for listing in &listings {
            println!("{:<16} {:<11} {}", listing.name, listing.kind, listing.video_filter);
        }
        println!();
        println!("Other names are looked up as clips in the effects directory.");
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &PipelineReport) {
    println!("Output: {}", report.output.display());
    println!(
        "Segments: {} ({} effect(s) applied, {} skipped)",
        report.segment_count,
        report.applied_effects.len(),
        report.skipped_effects.len()
    );
    if let Some(size) = crate::utils::path::file_size(&report.output) {
        println!("Size: {}", Utils::format_file_size(size));
    }
    println!(
        "Elapsed: {}",
        Utils::format_duration(Duration::from_millis(report.elapsed_ms))
    );
    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }
}

fn print_failure(failure: &PipelineFailure) {
    for message in failure.messages() {
        eprintln!("{}", message);
    }
}
