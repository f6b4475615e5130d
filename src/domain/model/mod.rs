// Domain models - Plan, segments, artifacts and run results

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::errors::DomainError;
use crate::utils::time::TimeParser;

/// What the plan asks for a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum SegmentAction {
    /// Pass the segment through untouched
    #[default]
    Keep,
    /// Apply the segment's effect
    Edit,
}

impl From<Option<String>> for SegmentAction {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(|v| v.trim().to_lowercase()) {
            Some(action) if action == "edit" => SegmentAction::Edit,
            _ => SegmentAction::Keep,
        }
    }
}

impl fmt::Display for SegmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentAction::Keep => write!(f, "keep"),
            SegmentAction::Edit => write!(f, "edit"),
        }
    }
}

/// A time-bounded sub-range of the source and what to do with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(deserialize_with = "deserialize_seconds")]
    pub start_sec: f64,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub end_sec: f64,
    #[serde(default)]
    pub action: SegmentAction,
    #[serde(default)]
    pub effect_name: Option<String>,
}

impl Segment {
    /// Segment that is passed through unchanged
    pub fn keep(start_sec: f64, end_sec: f64) -> Self {
        Self {
            start_sec,
            end_sec,
            action: SegmentAction::Keep,
            effect_name: None,
        }
    }

    /// Segment that receives an effect
    pub fn edit(start_sec: f64, end_sec: f64, effect: impl Into<String>) -> Self {
        Self {
            start_sec,
            end_sec,
            action: SegmentAction::Edit,
            effect_name: Some(effect.into()),
        }
    }

    /// Length of the segment in seconds
    pub fn duration(&self) -> f64 {
        self.end_sec - self.start_sec
    }

    /// Effect to apply, if the segment is an edit with a usable name
    pub fn effect(&self) -> Option<&str> {
        match self.action {
            SegmentAction::Edit => self
                .effect_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty()),
            SegmentAction::Keep => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} - {}] {}",
            TimeParser::format_time(self.start_sec),
            TimeParser::format_time(self.end_sec),
            self.action
        )?;
        if let Some(effect) = self.effect() {
            write!(f, " ({})", effect)?;
        }
        Ok(())
    }
}

/// Accept numbers or time strings for segment bounds
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTime {
        Number(f64),
        Text(String),
    }

    match RawTime::deserialize(deserializer)? {
        RawTime::Number(seconds) => Ok(seconds),
        RawTime::Text(text) => {
            TimeParser::parse_seconds(&text).map_err(serde::de::Error::custom)
        }
    }
}

/// Edit plan as produced by the translator, before validation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EditPlan {
    #[serde(alias = "segments")]
    pub parts: Vec<Segment>,
}

impl EditPlan {
    /// Create a plan from segments
    pub fn new(parts: Vec<Segment>) -> Self {
        Self { parts }
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// True when the plan lists no segments
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Plan after normalization; immutable for the rest of the run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPlan {
    segments: Vec<Segment>,
    media_duration: Option<f64>,
}

impl NormalizedPlan {
    /// Plan validated against a probed duration
    pub(crate) fn probed(segments: Vec<Segment>, media_duration: f64) -> Self {
        Self {
            segments,
            media_duration: Some(media_duration),
        }
    }

    /// Raw plan used as-is because the duration could not be probed
    pub(crate) fn unprobed(plan: EditPlan) -> Self {
        Self {
            segments: plan.parts,
            media_duration: None,
        }
    }

    /// Segments in playback order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Probed duration, when normalization ran
    pub fn media_duration(&self) -> Option<f64> {
        self.media_duration
    }

    /// Whether normalization ran against a probed duration
    pub fn is_probed(&self) -> bool {
        self.media_duration.is_some()
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when there is nothing to cut
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check that segments tile `[0, duration]` without gaps or overlaps
    pub fn covers_duration(&self, tolerance: f64) -> bool {
        let Some(duration) = self.media_duration else {
            return false;
        };
        let Some(first) = self.segments.first() else {
            return false;
        };
        if first.start_sec.abs() > tolerance {
            return false;
        }
        let contiguous = self
            .segments
            .windows(2)
            .all(|pair| (pair[1].start_sec - pair[0].end_sec).abs() <= tolerance);
        let closed = self
            .segments
            .last()
            .map(|last| (last.end_sec - duration).abs() <= tolerance)
            .unwrap_or(false);
        let positive = self.segments.iter().all(|s| s.end_sec > s.start_sec);

        contiguous && closed && positive
    }
}

/// State of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Extracting,
    Normalizing,
    Cutting,
    Applying,
    Merging,
    Cleanup,
    Done,
    Failed,
}

impl PipelineState {
    /// Whether the state machine allows moving to `next`
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Extracting, Normalizing) => true,
            (Normalizing, Cutting) => true,
            (Cutting, Applying) => true,
            (Applying, Merging) => true,
            (Merging, Cleanup) => true,
            (Cleanup, Done) => true,
            (Done, _) | (Failed, _) => false,
            (_, Failed) => true,
            _ => false,
        }
    }

    /// Terminal states end the run
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Extracting => "extracting",
            PipelineState::Normalizing => "normalizing",
            PipelineState::Cutting => "cutting",
            PipelineState::Applying => "applying",
            PipelineState::Merging => "merging",
            PipelineState::Cleanup => "cleanup",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Phase that produced a temporary artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArtifactPhase {
    Cutting,
    Applying,
    Merging,
}

/// File produced during a run
#[derive(Debug, Clone, PartialEq)]
pub struct TempArtifact {
    pub path: PathBuf,
    pub phase: ArtifactPhase,
    pub retain: bool,
}

/// Effect that produced a replacement segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedEffect {
    /// 1-based segment number
    pub segment: usize,
    pub effect: String,
    pub output: PathBuf,
}

/// Effect that could not be applied; the original segment was used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEffect {
    /// 1-based segment number
    pub segment: usize,
    pub effect: String,
    pub reason: String,
}

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub output: PathBuf,
    pub segment_count: usize,
    pub plan: NormalizedPlan,
    pub applied_effects: Vec<AppliedEffect>,
    pub skipped_effects: Vec<SkippedEffect>,
    pub warnings: Vec<String>,
    pub states: Vec<PipelineState>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Failed run: the state it failed in and every error collected
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineFailure {
    pub state: PipelineState,
    pub errors: Vec<DomainError>,
}

impl PipelineFailure {
    /// Failure with a single cause
    pub fn new(state: PipelineState, error: DomainError) -> Self {
        Self {
            state,
            errors: vec![error],
        }
    }

    /// Human-readable failure messages, never empty
    pub fn messages(&self) -> Vec<String> {
        if self.errors.is_empty() {
            return vec![format!("Pipeline failed while {}", self.state)];
        }
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Primary cause
    pub fn primary(&self) -> Option<&DomainError> {
        self.errors.first()
    }

    /// True when the run ended because it was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.errors.iter().any(|e| matches!(e, DomainError::Cancelled))
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

impl std::error::Error for PipelineFailure {}

/// Outcome of a run: exactly one output path or a list of failures
pub type PipelineResult = Result<PipelineReport, PipelineFailure>;

#[cfg(test)]
mod tests;
