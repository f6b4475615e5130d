//! Effect application
//!
//! Catalogued effects are rendered with the transcoder. Unknown names are
//! served from a directory of pre-rendered clips. An effect that cannot be
//! applied never fails the run: the segment keeps its original clip and the
//! reason is reported back.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::domain::errors::DomainError;
use crate::engine::catalog::{EffectCatalog, EffectRecipe, EffectStrategy};
use crate::engine::command::ToolCommand;
use crate::engine::EncodeSettings;
use crate::ports::{CancelToken, TranscodePort};
use crate::utils::path::{effect_output_path, is_non_empty_file};

/// Result of applying one effect
#[derive(Debug, Clone, PartialEq)]
pub enum EffectOutcome {
    /// A new clip replaces the segment
    Applied { output: PathBuf, effect: String },
    /// The original clip is kept
    Unchanged { original: PathBuf, reason: String },
}

impl EffectOutcome {
    /// Clip to use for the segment
    pub fn path(&self) -> &Path {
        match self {
            EffectOutcome::Applied { output, .. } => output,
            EffectOutcome::Unchanged { original, .. } => original,
        }
    }
}

/// Applies effects to cut segments
pub struct EffectApplier {
    transcoder: Arc<dyn TranscodePort>,
    encode: EncodeSettings,
    effects_dir: PathBuf,
    fallback_to_any: bool,
}

impl EffectApplier {
    pub fn new(
        transcoder: Arc<dyn TranscodePort>,
        encode: EncodeSettings,
        effects_dir: impl Into<PathBuf>,
        fallback_to_any: bool,
    ) -> Self {
        Self {
            transcoder,
            encode,
            effects_dir: effects_dir.into(),
            fallback_to_any,
        }
    }

    /// Where the effect output for `segment` will be written
    pub fn output_path(&self, segment: &Path, effect: &str) -> PathBuf {
        match EffectCatalog::lookup(effect) {
            EffectStrategy::Recipe { name, .. } => effect_output_path(segment, name),
            EffectStrategy::Substitute { name } => effect_output_path(segment, &name),
        }
    }

    /// Command rendering a catalogued recipe
    pub fn recipe_command(
        &self,
        segment: &Path,
        output: &Path,
        name: &str,
        recipe: &EffectRecipe,
        timeout: Duration,
    ) -> ToolCommand {
        let command = self
            .encode
            .encode_video(
                ToolCommand::new(format!("effect {}", name), segment, output)
                    .video_filter(recipe.video_filter()),
            )
            .with_timeout(timeout);

        match recipe.audio_filter() {
            Some(audio) => self.encode.encode_audio(command.audio_filter(audio)),
            None => command.copy_audio(),
        }
    }

    /// Apply `effect` to the clip at `segment`
    ///
    /// Only cancellation is returned as an error.
    pub async fn apply(
        &self,
        segment: &Path,
        effect: &str,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<EffectOutcome, DomainError> {
        cancel.check()?;
        let output = self.output_path(segment, effect);

        let attempt = match EffectCatalog::lookup(effect) {
            EffectStrategy::Recipe { name, recipe } => {
                debug!("Applying {} to {}", name, segment.display());
                let command = self.recipe_command(segment, &output, name, &recipe, timeout);
                self.transcoder.run(&command, cancel).await.map(|_| name.to_string())
            }
            EffectStrategy::Substitute { name } => {
                debug!("Looking up substitute clip for {}", name);
                self.substitute(&name, &output).await.map(|_| name)
            }
        };

        let attempt = attempt.and_then(|name| {
            if is_non_empty_file(&output) {
                Ok(name)
            } else {
                Err(DomainError::EffectFailed(format!(
                    "{} produced no output",
                    output.display()
                )))
            }
        });

        match attempt {
            Ok(name) => {
                info!("Applied {} -> {}", name, output.display());
                Ok(EffectOutcome::Applied {
                    output,
                    effect: name,
                })
            }
            Err(DomainError::Cancelled) => {
                remove_partial(&output).await;
                Err(DomainError::Cancelled)
            }
            Err(err) => {
                warn!("Effect {} not applied to {}: {}", effect, segment.display(), err);
                remove_partial(&output).await;
                Ok(EffectOutcome::Unchanged {
                    original: segment.to_path_buf(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Copy a pre-rendered clip to `output`
    async fn substitute(&self, name: &str, output: &Path) -> Result<(), DomainError> {
        let clip = self.find_substitute(name).ok_or_else(|| {
            DomainError::EffectFailed(format!(
                "unknown effect '{}' and no substitute clip in {}",
                name,
                self.effects_dir.display()
            ))
        })?;

        debug!("Substituting {} with {}", name, clip.display());
        tokio::fs::copy(&clip, output)
            .await
            .map_err(|e| DomainError::EffectFailed(format!("copy {}: {}", clip.display(), e)))?;
        Ok(())
    }

    /// Clip whose stem matches `name`, else the first clip when allowed
    pub fn find_substitute(&self, name: &str) -> Option<PathBuf> {
        let clips: Vec<PathBuf> = WalkDir::new(&self.effects_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_non_empty_file(path))
            .collect();

        let wanted = EffectCatalog::normalize_name(name);
        let exact = clips.iter().find(|path| {
            path.file_stem()
                .map(|stem| EffectCatalog::normalize_name(&stem.to_string_lossy()) == wanted)
                .unwrap_or(false)
        });

        match exact {
            Some(path) => Some(path.clone()),
            None if self.fallback_to_any => clips.into_iter().next(),
            None => None,
        }
    }
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial effect output {}", path.display()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!("Failed to remove {}: {}", path.display(), err),
    }
}
