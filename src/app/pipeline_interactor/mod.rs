// Pipeline interactor - Orchestrates one edit-plan run
//
// Extracting -> Normalizing -> Cutting -> Applying -> Merging -> Cleanup -> Done,
// with any fatal failure going straight to Failed after a full rollback.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::cutter::SegmentCutter;
use crate::engine::effects::{EffectApplier, EffectOutcome};
use crate::engine::merger::Merger;
use crate::engine::EngineConfig;
use crate::output::{ArtifactJanitor, CleanupSummary};
use crate::planner::{PlanExtractor, PlanNormalizer};
use crate::ports::*;
use crate::utils::path::ArtifactNames;

/// Where a run starts
enum PlanSource<'a> {
    Instruction(&'a str),
    Text(&'a str),
    Plan(EditPlan),
}

/// Bookkeeping for one run
struct RunState {
    current: Option<PipelineState>,
    states: Vec<PipelineState>,
    warnings: Vec<String>,
    janitor: ArtifactJanitor,
    started_at: DateTime<Utc>,
    clock: Instant,
}

impl RunState {
    fn new() -> Self {
        Self {
            current: None,
            states: Vec::new(),
            warnings: Vec::new(),
            janitor: ArtifactJanitor::new(),
            started_at: Utc::now(),
            clock: Instant::now(),
        }
    }

    fn enter(&mut self, next: PipelineState) {
        if let Some(current) = self.current {
            if !current.can_transition_to(next) {
                warn!(from = %current, to = %next, "Unexpected pipeline transition");
            }
        }
        info!(state = %next, "Pipeline state changed");
        self.current = Some(next);
        self.states.push(next);
    }

    fn state(&self) -> PipelineState {
        self.current.unwrap_or(PipelineState::Extracting)
    }

    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Roll back everything and build the failure
    async fn fail(mut self, error: DomainError) -> PipelineFailure {
        let failed_in = self.state();
        warn!(state = %failed_in, "Pipeline failed: {}", error);

        let summary = self.janitor.rollback().await;
        log_cleanup(&summary);
        self.enter(PipelineState::Failed);

        let mut failure = PipelineFailure::new(failed_in, error);
        failure.errors.extend(
            summary
                .failed
                .into_iter()
                .map(|(path, reason)| {
                    DomainError::FsFail(format!("could not remove {}: {}", path.display(), reason))
                }),
        );
        failure
    }
}

fn log_cleanup(summary: &CleanupSummary) {
    debug!(
        removed = summary.removed.len(),
        failed = summary.failed.len(),
        "Cleanup finished"
    );
}

/// Interactor for the edit-plan pipeline
pub struct PipelineInteractor {
    transcoder: Arc<dyn TranscodePort>,
    translator: Arc<dyn TranslatorPort>,
    normalizer: PlanNormalizer,
    config: EngineConfig,
}

impl PipelineInteractor {
    /// Create new pipeline interactor with injected ports
    pub fn new(
        transcoder: Arc<dyn TranscodePort>,
        probe: Arc<dyn DurationProbePort>,
        translator: Arc<dyn TranslatorPort>,
        config: EngineConfig,
    ) -> Self {
        Self {
            transcoder,
            translator,
            normalizer: PlanNormalizer::new(probe),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Translate an instruction, then run the whole pipeline
    pub async fn run_instruction(&self, source: &Path, instruction: &str, cancel: &CancelToken) -> PipelineResult {
        self.execute(source, PlanSource::Instruction(instruction), cancel).await
    }

    /// Extract a plan from translator text, then run
    pub async fn run_text(&self, source: &Path, text: &str, cancel: &CancelToken) -> PipelineResult {
        self.execute(source, PlanSource::Text(text), cancel).await
    }

    /// Run an already parsed plan
    pub async fn run_plan(&self, source: &Path, plan: EditPlan, cancel: &CancelToken) -> PipelineResult {
        self.execute(source, PlanSource::Plan(plan), cancel).await
    }

    async fn execute(&self, source: &Path, input: PlanSource<'_>, cancel: &CancelToken) -> PipelineResult {
        let mut run = RunState::new();
        info!("Starting edit pipeline for {}", source.display());

        if !source.is_file() {
            run.enter(match input {
                PlanSource::Plan(_) => PipelineState::Normalizing,
                _ => PipelineState::Extracting,
            });
            return Err(run.fail(DomainError::SourceMissing(source.to_path_buf())).await);
        }

        // Extracting
        let plan = match input {
            PlanSource::Plan(plan) => plan,
            PlanSource::Instruction(instruction) => {
                run.enter(PipelineState::Extracting);
                let text = match self.translate(instruction, cancel).await {
                    Ok(text) => text,
                    Err(err) => return Err(run.fail(err).await),
                };
                match PlanExtractor::extract(&text) {
                    Ok(plan) => plan,
                    Err(err) => return Err(run.fail(err).await),
                }
            }
            PlanSource::Text(text) => {
                run.enter(PipelineState::Extracting);
                match PlanExtractor::extract(text) {
                    Ok(plan) => plan,
                    Err(err) => return Err(run.fail(err).await),
                }
            }
        };
        info!("Plan has {} segment(s)", plan.len());

        // Normalizing
        run.enter(PipelineState::Normalizing);
        if plan.is_empty() {
            return Err(run.fail(DomainError::EmptyPlan).await);
        }
        if let Err(err) = cancel.check() {
            return Err(run.fail(err).await);
        }
        let normalization = self.normalizer.normalize(source, plan).await;
        if let Some(warning) = normalization.warning {
            run.warn(warning.to_string());
        }
        let plan = normalization.plan;
        for (i, segment) in plan.segments().iter().enumerate() {
            debug!(segment = i + 1, "Planned {}", segment);
        }
        let timeout = self.config.timeouts.for_media(plan.media_duration());
        debug!("Per-invocation timeout {}s", timeout.as_secs());

        let names = match ArtifactNames::for_source(source) {
            Ok(names) => names,
            Err(err) => return Err(run.fail(err).await),
        };

        // Cutting
        run.enter(PipelineState::Cutting);
        for number in 1..=plan.len() {
            run.janitor.register(names.part(number), ArtifactPhase::Cutting);
        }
        let cutter = SegmentCutter::new(
            Arc::clone(&self.transcoder),
            self.config.encode.clone(),
            self.config.max_parallel_jobs,
        );
        let clips = match cutter.cut_all(source, plan.segments(), &names, timeout, cancel).await {
            Ok(clips) => clips,
            Err(err) => return Err(run.fail(err).await),
        };

        // Applying
        run.enter(PipelineState::Applying);
        let (final_clips, applied_effects, skipped_effects) =
            match self.apply_effects(&mut run, plan.segments(), clips, timeout, cancel).await {
                Ok(result) => result,
                Err(err) => return Err(run.fail(err).await),
            };
        for skipped in &skipped_effects {
            run.warn(format!(
                "Effect '{}' not applied to segment {}: {}",
                skipped.effect, skipped.segment, skipped.reason
            ));
        }

        // Merging
        run.enter(PipelineState::Merging);
        let output = names.final_output();
        run.janitor.register(&output, ArtifactPhase::Merging);
        run.janitor.register(names.manifest(), ArtifactPhase::Merging);
        let merger = Merger::new(Arc::clone(&self.transcoder), self.config.encode.clone());
        if let Err(err) = merger
            .merge(&final_clips, &names.manifest(), &output, timeout, cancel)
            .await
        {
            return Err(run.fail(err).await);
        }

        // Cleanup
        run.enter(PipelineState::Cleanup);
        run.janitor.retain(&output);
        let summary = run.janitor.finalize().await;
        log_cleanup(&summary);
        for warning in summary.warnings() {
            run.warn(warning);
        }

        run.enter(PipelineState::Done);
        let elapsed_ms = run.clock.elapsed().as_millis() as u64;
        info!("Pipeline finished in {}ms: {}", elapsed_ms, output.display());

        Ok(PipelineReport {
            output,
            segment_count: plan.len(),
            plan,
            applied_effects,
            skipped_effects,
            warnings: std::mem::take(&mut run.warnings),
            states: std::mem::take(&mut run.states),
            started_at: run.started_at,
            elapsed_ms,
        })
    }

    /// Ask the translator for a plan, giving up when cancelled
    async fn translate(&self, instruction: &str, cancel: &CancelToken) -> Result<String, DomainError> {
        cancel.check()?;
        tokio::select! {
            result = self.translator.translate(instruction) => result,
            _ = cancel.cancelled() => Err(DomainError::Cancelled),
        }
    }

    /// Apply effects, keeping clip order; only cancellation is fatal
    async fn apply_effects(
        &self,
        run: &mut RunState,
        segments: &[Segment],
        mut clips: Vec<PathBuf>,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<(Vec<PathBuf>, Vec<AppliedEffect>, Vec<SkippedEffect>), DomainError> {
        let applier = EffectApplier::new(
            Arc::clone(&self.transcoder),
            self.config.encode.clone(),
            self.config.effects_dir.clone(),
            self.config.substitute_fallback_to_any,
        );

        let jobs: Vec<(usize, String, PathBuf)> = segments
            .iter()
            .zip(clips.iter())
            .enumerate()
            .filter_map(|(i, (segment, clip))| {
                segment
                    .effect()
                    .map(|effect| (i, effect.to_string(), clip.clone()))
            })
            .collect();

        for (_, effect, clip) in &jobs {
            run.janitor
                .register(applier.output_path(clip, effect), ArtifactPhase::Applying);
        }
        if jobs.is_empty() {
            debug!("No effects to apply");
        }

        let applier = &applier;
        let mut outcomes = stream::iter(jobs)
            .map(|(i, effect, clip)| async move {
                let outcome = applier.apply(&clip, &effect, timeout, cancel).await;
                (i, effect, outcome)
            })
            .buffered(self.config.max_parallel_jobs.max(1));

        let mut applied = Vec::new();
        let mut skipped = Vec::new();
        while let Some((i, effect, outcome)) = outcomes.next().await {
            match outcome? {
                EffectOutcome::Applied { output, effect } => {
                    info!(segment = i + 1, effect = %effect, "Effect applied");
                    clips[i] = output.clone();
                    applied.push(AppliedEffect {
                        segment: i + 1,
                        effect,
                        output,
                    });
                }
                EffectOutcome::Unchanged { reason, .. } => {
                    skipped.push(SkippedEffect {
                        segment: i + 1,
                        effect,
                        reason,
                    });
                }
            }
        }

        Ok((clips, applied, skipped))
    }
}
