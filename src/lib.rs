//! editplan library
//!
//! Executes video edit plans produced by a language model: the plan is
//! extracted from free-form text, normalized against the probed media
//! duration, cut into per-segment clips, given per-segment effects and
//! merged into one output. Every intermediate file is tracked and removed
//! whether the run succeeds, fails or is cancelled.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod output;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::PipelineInteractor;
pub use domain::errors::DomainError;
pub use domain::model::{EditPlan, PipelineFailure, PipelineReport, PipelineResult, Segment, SegmentAction};
pub use error::{AppError, AppResult};
pub use ports::{CancelHandle, CancelToken};
