//! Lifetime management for files a run writes

pub mod janitor;

pub use janitor::{ArtifactJanitor, CleanupSummary};
