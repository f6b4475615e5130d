//! Transcoding phases: cutting, effect application and merging

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod command;
pub mod cutter;
pub mod effects;
pub mod merger;

use command::ToolCommand;

/// Codec selection shared by every re-encoding invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeSettings {
    /// Video encoder
    pub video_codec: String,
    /// Audio encoder
    pub audio_codec: String,
    /// Encoder preset
    pub preset: String,
    /// Constant Rate Factor (0-51)
    pub crf: u8,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "medium".to_string(),
            crf: 23,
        }
    }
}

impl EncodeSettings {
    /// Add video encoding arguments
    pub fn encode_video(&self, command: ToolCommand) -> ToolCommand {
        command
            .video_codec(&self.video_codec)
            .preset(&self.preset)
            .crf(self.crf)
    }

    /// Add audio encoding arguments
    pub fn encode_audio(&self, command: ToolCommand) -> ToolCommand {
        command.audio_codec(&self.audio_codec)
    }
}

/// Time budget for a single tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    /// Fixed allowance per invocation
    pub base_secs: u64,
    /// Extra allowance per second of source media
    pub per_media_second: f64,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            base_secs: 60,
            per_media_second: 4.0,
        }
    }
}

impl TimeoutPolicy {
    /// Timeout for a source of the given duration
    ///
    /// Unknown durations get four times the base allowance.
    pub fn for_media(&self, media_duration: Option<f64>) -> Duration {
        let base = self.base_secs as f64;
        let secs = match media_duration {
            Some(duration) if duration.is_finite() && duration > 0.0 => {
                base + self.per_media_second * duration
            }
            _ => base * 4.0,
        };
        Duration::from_secs_f64(secs.max(1.0))
    }
}

/// Settings for the transcoding phases
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub encode: EncodeSettings,
    pub timeouts: TimeoutPolicy,
    /// Concurrent invocations per phase (at least 1)
    pub max_parallel_jobs: usize,
    /// Directory of pre-rendered substitute clips
    pub effects_dir: std::path::PathBuf,
    /// Use the first clip in the directory when no name matches
    pub substitute_fallback_to_any: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            encode: EncodeSettings::default(),
            timeouts: TimeoutPolicy::default(),
            max_parallel_jobs: 1,
            effects_dir: std::path::PathBuf::from("effects"),
            substitute_fallback_to_any: true,
        }
    }
}
