//! Segment cutter
//!
//! Produces one clip per plan segment. Cuts run with bounded concurrency
//! and results are consumed in plan order, so the first failure reported
//! is always the lowest-numbered failing segment.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::Segment;
use crate::engine::command::ToolCommand;
use crate::engine::EncodeSettings;
use crate::ports::{CancelToken, TranscodePort};
use crate::utils::path::{is_non_empty_file, ArtifactNames};

/// Cuts a source into per-segment clips
pub struct SegmentCutter {
    transcoder: Arc<dyn TranscodePort>,
    encode: EncodeSettings,
    max_parallel_jobs: usize,
}

impl SegmentCutter {
    /// Create a new cutter
    pub fn new(transcoder: Arc<dyn TranscodePort>, encode: EncodeSettings, max_parallel_jobs: usize) -> Self {
        Self {
            transcoder,
            encode,
            max_parallel_jobs: max_parallel_jobs.max(1),
        }
    }

    /// Command that cuts one segment
    ///
    /// Seek follows the input and both streams are re-encoded, which keeps
    /// cut points frame accurate.
    pub fn command_for(
        &self,
        source: &Path,
        segment: &Segment,
        number: usize,
        output: &Path,
        timeout: Duration,
    ) -> ToolCommand {
        let command = ToolCommand::new(format!("cut segment {}", number), source, output)
            .seek(segment.start_sec.max(0.0))
            .duration(segment.duration().max(0.0));
        self.encode
            .encode_audio(self.encode.encode_video(command))
            .with_timeout(timeout)
    }

    /// Cut every segment, returning clip paths in plan order
    ///
    /// On the first failure every clip produced by this call is deleted
    /// before the error is returned. Cancellation and timeouts keep their
    /// own kinds; any other failure becomes `SegmentCutFailed` with the
    /// 1-based segment number.
    pub async fn cut_all(
        &self,
        source: &Path,
        segments: &[Segment],
        names: &ArtifactNames,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<Vec<PathBuf>, DomainError> {
        cancel.check()?;
        info!(
            "Cutting {} segment(s) from {} ({} job(s) in parallel)",
            segments.len(),
            source.display(),
            self.max_parallel_jobs
        );

        let jobs: Vec<(usize, &Segment, PathBuf)> = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| (i + 1, segment, names.part(i + 1)))
            .collect();
        let planned: Vec<PathBuf> = jobs.iter().map(|(_, _, path)| path.clone()).collect();

        let mut results = stream::iter(jobs)
            .map(|(number, segment, output)| async move {
                self.cut_one(source, segment, number, output, timeout, cancel)
                    .await
                    .map_err(|err| (number, err))
            })
            .buffered(self.max_parallel_jobs);

        let mut clips = Vec::with_capacity(segments.len());
        while let Some(result) = results.next().await {
            match result {
                Ok(path) => clips.push(path),
                Err((number, err)) => {
                    // Dropping the stream stops any cut still in flight.
                    drop(results);
                    remove_clips(&planned).await;

                    return Err(match err {
                        err @ (DomainError::Cancelled | DomainError::ToolTimeout { .. }) => err,
                        other => DomainError::SegmentCutFailed {
                            index: number,
                            reason: other.to_string(),
                        },
                    });
                }
            }
        }

        info!("Cut {} segment(s)", clips.len());
        Ok(clips)
    }

    async fn cut_one(
        &self,
        source: &Path,
        segment: &Segment,
        number: usize,
        output: PathBuf,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<PathBuf, DomainError> {
        cancel.check()?;
        debug!("Cutting segment {} {}", number, segment);

        let command = self.command_for(source, segment, number, &output, timeout);
        self.transcoder.run(&command, cancel).await?;

        if !is_non_empty_file(&output) {
            return Err(DomainError::FsFail(format!(
                "cut output {} is missing or empty",
                output.display()
            )));
        }

        debug!("Segment {} written to {}", number, output.display());
        Ok(output)
    }
}

/// Delete clips, ignoring ones that were never written
async fn remove_clips(paths: &[PathBuf]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Removed partial clip {}", path.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove {}: {}", path.display(), err),
        }
    }
}
