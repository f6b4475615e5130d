//! Temporary artifact tracking
//!
//! The janitor owns every intermediate file a run creates. Paths are
//! registered before the tool that writes them is started, so a failure or
//! cancellation at any point can still remove them. Each path is tracked
//! once no matter how many phases mention it, which guarantees it is
//! deleted at most once.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::model::{ArtifactPhase, TempArtifact};

/// Outcome of a cleanup pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupSummary {
    /// Files removed from disk
    pub removed: Vec<PathBuf>,
    /// Files that could not be removed, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanupSummary {
    /// Warning lines for the run report
    pub fn warnings(&self) -> Vec<String> {
        self.failed
            .iter()
            .map(|(path, reason)| format!("Could not remove {}: {}", path.display(), reason))
            .collect()
    }
}

/// Registry of temporary artifacts for one run
#[derive(Debug, Default)]
pub struct ArtifactJanitor {
    artifacts: Vec<TempArtifact>,
    seen: HashSet<PathBuf>,
}

impl ArtifactJanitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a path; returns false if it was already tracked
    pub fn register(&mut self, path: impl Into<PathBuf>, phase: ArtifactPhase) -> bool {
        let path = path.into();
        if !self.seen.insert(path.clone()) {
            return false;
        }
        debug!("Tracking {:?} artifact {}", phase, path.display());
        self.artifacts.push(TempArtifact {
            path,
            phase,
            retain: false,
        });
        true
    }

    /// Keep a tracked path on finalize
    pub fn retain(&mut self, path: &Path) {
        if let Some(artifact) = self.artifacts.iter_mut().find(|a| a.path == path) {
            artifact.retain = true;
        }
    }

    /// Tracked artifacts in registration order
    pub fn artifacts(&self) -> &[TempArtifact] {
        &self.artifacts
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    /// Delete every tracked artifact, retained ones included
    pub async fn rollback(&mut self) -> CleanupSummary {
        let doomed = std::mem::take(&mut self.artifacts);
        self.seen.clear();
        remove_all(doomed.into_iter().map(|a| a.path)).await
    }

    /// Delete every artifact not marked to retain
    pub async fn finalize(&mut self) -> CleanupSummary {
        let (kept, doomed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.artifacts)
            .into_iter()
            .partition(|a| a.retain);
        self.seen = kept.iter().map(|a| a.path.clone()).collect();
        self.artifacts = kept;
        remove_all(doomed.into_iter().map(|a| a.path)).await
    }
}

impl Drop for ArtifactJanitor {
    fn drop(&mut self) {
        // A run dropped mid-flight still must not leak intermediates.
        for artifact in self.artifacts.iter().filter(|a| !a.retain) {
            match std::fs::remove_file(&artifact.path) {
                Ok(()) => debug!("Removed abandoned artifact {}", artifact.path.display()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!("Failed to remove {}: {}", artifact.path.display(), err),
            }
        }
    }
}

async fn remove_all(paths: impl Iterator<Item = PathBuf>) -> CleanupSummary {
    let mut summary = CleanupSummary::default();
    for path in paths {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed {}", path.display());
                summary.removed.push(path);
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!("Failed to remove {}: {}", path.display(), err);
                summary.failed.push((path, err.to_string()));
            }
        }
    }
    summary
}
