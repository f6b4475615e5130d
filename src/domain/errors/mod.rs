// Domain errors - Failure taxonomy of a pipeline run

use std::path::PathBuf;

use thiserror::Error;

/// Domain-specific error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Translator text holds no parseable plan
    #[error("Malformed plan: could not extract JSON from '{snippet}'")]
    MalformedPlan { snippet: String },

    /// Plan parsed but lists no segments
    #[error("Empty plan: no parts to process")]
    EmptyPlan,

    /// Duration probe failed; normalization was skipped
    #[error("Duration probe unavailable: {0}")]
    ProbeUnavailable(String),

    /// Source video does not exist
    #[error("Source file not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// A segment could not be cut (1-based index)
    #[error("Failed to cut segment {index}: {reason}")]
    SegmentCutFailed { index: usize, reason: String },

    /// A merge input does not exist
    #[error("Merge input missing: {}", .0.display())]
    MergeInputMissing(PathBuf),

    /// A merge input is empty
    #[error("Merge input is empty: {}", .0.display())]
    MergeInputEmpty(PathBuf),

    /// Concatenation failed
    #[error("Merge failed: {0}")]
    MergeFailed(String),

    /// External tool exceeded its time budget
    #[error("{operation} timed out after {seconds} seconds")]
    ToolTimeout { operation: String, seconds: u64 },

    /// External tool exited with a failure status
    #[error("{operation} failed (exit code {}): {stderr}", exit_code_label(.exit_code))]
    ToolFailed {
        operation: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// External tool could not be started
    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    /// Effect could not be applied (recovered locally)
    #[error("Effect failed: {0}")]
    EffectFailed(String),

    /// Translator service could not be reached
    #[error("Translator service unavailable: {0}")]
    TranslatorUnavailable(String),

    /// Translator service did not answer in time
    #[error("Translator service timed out: {0}")]
    TranslatorTimeout(String),

    /// Translator service answered with a non-success status
    #[error("Translator service returned HTTP {status}: {body}")]
    TranslatorHttpError { status: u16, body: String },

    /// Run was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// Filesystem operation failed
    #[error("Filesystem error: {0}")]
    FsFail(String),

    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl DomainError {
    /// Errors raised by the translator collaborator
    pub fn is_translator_error(&self) -> bool {
        matches!(
            self,
            DomainError::TranslatorUnavailable(_)
                | DomainError::TranslatorTimeout(_)
                | DomainError::TranslatorHttpError { .. }
        )
    }

    /// Errors that do not terminate a run
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DomainError::ProbeUnavailable(_) | DomainError::EffectFailed(_)
        )
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::FsFail(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_human_readable() {
        let err = DomainError::SegmentCutFailed {
            index: 2,
            reason: "ffmpeg exited with 1".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to cut segment 2: ffmpeg exited with 1");

        let err = DomainError::ToolFailed {
            operation: "concat".to_string(),
            exit_code: None,
            stderr: "killed".to_string(),
        };
        assert_eq!(err.to_string(), "concat failed (exit code none): killed");
    }

    #[test]
    fn test_classification() {
        assert!(DomainError::TranslatorTimeout("60s".into()).is_translator_error());
        assert!(!DomainError::EmptyPlan.is_translator_error());
        assert!(DomainError::ProbeUnavailable("x".into()).is_recoverable());
        assert!(!DomainError::MergeFailed("x".into()).is_recoverable());
    }
}
