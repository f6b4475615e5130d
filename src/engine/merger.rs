//! Segment merger
//!
//! Concatenates the final segment list into one file through a concat
//! manifest. The manifest never outlives the attempt, and a failed attempt
//! leaves no partial output behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::engine::command::ToolCommand;
use crate::engine::EncodeSettings;
use crate::ports::{CancelToken, TranscodePort};
use crate::utils::path::{absolute, file_size, quote_concat_path};

/// Joins clips into the final output
pub struct Merger {
    transcoder: Arc<dyn TranscodePort>,
    encode: EncodeSettings,
}

impl Merger {
    pub fn new(transcoder: Arc<dyn TranscodePort>, encode: EncodeSettings) -> Self {
        Self { transcoder, encode }
    }

    /// Manifest text listing `inputs` in order
    pub fn manifest_contents(inputs: &[PathBuf]) -> String {
        inputs
            .iter()
            .map(|path| format!("file {}\n", quote_concat_path(&absolute(path))))
            .collect()
    }

    /// Check that every input exists and has content
    pub fn check_inputs(inputs: &[PathBuf]) -> Result<(), DomainError> {
        if inputs.is_empty() {
            return Err(DomainError::MergeFailed("no segments to merge".to_string()));
        }
        for input in inputs {
            match file_size(input) {
                None => return Err(DomainError::MergeInputMissing(input.clone())),
                Some(0) => return Err(DomainError::MergeInputEmpty(input.clone())),
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Concatenate `inputs` into `output`
    pub async fn merge(
        &self,
        inputs: &[PathBuf],
        manifest: &Path,
        output: &Path,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<PathBuf, DomainError> {
        cancel.check()?;
        Self::check_inputs(inputs)?;

        info!("Merging {} segment(s) into {}", inputs.len(), output.display());
        tokio::fs::write(manifest, Self::manifest_contents(inputs))
            .await
            .map_err(|e| DomainError::FsFail(format!("write {}: {}", manifest.display(), e)))?;
        debug!("Wrote concat manifest {}", manifest.display());

        let command = self
            .encode
            .encode_audio(
                self.encode
                    .encode_video(ToolCommand::new("merge", manifest, output).concat_input()),
            )
            .with_timeout(timeout);

        let result = self.transcoder.run(&command, cancel).await;
        remove_if_present(manifest).await;

        let verified = result.and_then(|_| match file_size(output) {
            Some(size) if size > 0 => Ok(()),
            _ => Err(DomainError::MergeFailed(format!(
                "{} is missing or empty after concatenation",
                output.display()
            ))),
        });

        match verified {
            Ok(()) => {
                info!("Merged output written to {}", output.display());
                Ok(output.to_path_buf())
            }
            Err(err) => {
                remove_if_present(output).await;
                Err(match err {
                    err @ (DomainError::Cancelled
                    | DomainError::ToolTimeout { .. }
                    | DomainError::MergeFailed(_)) => err,
                    other => DomainError::MergeFailed(other.to_string()),
                })
            }
        }
    }
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!("Failed to remove {}: {}", path.display(), err),
    }
}
