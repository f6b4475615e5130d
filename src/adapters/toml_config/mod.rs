// TOML config adapter - Typed configuration with file, environment and CLI layers

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::{EncodeSettings, EngineConfig, TimeoutPolicy};
use crate::error::{AppError, AppResult};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "editplan.toml";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "EDITPLAN_";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// External tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub crf: u8,
    pub timeout_base_secs: u64,
    pub timeout_per_media_second: f64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        let encode = EncodeSettings::default();
        let timeouts = TimeoutPolicy::default();
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            video_codec: encode.video_codec,
            audio_codec: encode.audio_codec,
            preset: encode.preset,
            crf: encode.crf,
            timeout_base_secs: timeouts.base_secs,
            timeout_per_media_second: timeouts.per_media_second,
        }
    }
}

/// Substitute clip settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub directory: PathBuf,
    pub fallback_to_any: bool,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("effects"),
            fallback_to_any: true,
        }
    }
}

/// Translator service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout_secs: 60,
            max_tokens: 512,
        }
    }
}

/// Scheduling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Concurrent tool invocations per phase; 0 means one per CPU
    pub max_parallel_jobs: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self { max_parallel_jobs: 1 }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tool: ToolConfig,
    pub effects: EffectsConfig,
    pub translator: TranslatorConfig,
    pub pipeline: PipelineSection,
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Load defaults, then the config file, then `EDITPLAN_*` variables
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };
        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|message| AppError::ConfigParse {
            path: path.to_path_buf(),
            message,
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Apply `EDITPLAN_<SECTION>_<KEY>` overrides
    pub fn apply_env<I>(&mut self, vars: I) -> AppResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if self.set(&key.to_ascii_lowercase(), &value)? {
                info!("Found environment override: {} = {}", name, value);
            }
        }
        Ok(())
    }

    /// Set one value by its flattened `section_key` name
    ///
    /// Returns false for names that are not configuration keys.
    pub fn set(&mut self, key: &str, value: &str) -> AppResult<bool> {
        match key {
            "tool_ffmpeg_path" => self.tool.ffmpeg_path = PathBuf::from(value),
            "tool_ffprobe_path" => self.tool.ffprobe_path = PathBuf::from(value),
            "tool_video_codec" => self.tool.video_codec = value.to_string(),
            "tool_audio_codec" => self.tool.audio_codec = value.to_string(),
            "tool_preset" => self.tool.preset = value.to_string(),
            "tool_crf" => self.tool.crf = parse_value(key, value)?,
            "tool_timeout_base_secs" => self.tool.timeout_base_secs = parse_value(key, value)?,
            "tool_timeout_per_media_second" => {
                self.tool.timeout_per_media_second = parse_value(key, value)?
            }
            "effects_directory" => self.effects.directory = PathBuf::from(value),
            "effects_fallback_to_any" => self.effects.fallback_to_any = parse_value(key, value)?,
            "translator_base_url" => self.translator.base_url = value.to_string(),
            "translator_model" => self.translator.model = value.to_string(),
            "translator_timeout_secs" => self.translator.timeout_secs = parse_value(key, value)?,
            "translator_max_tokens" => self.translator.max_tokens = parse_value(key, value)?,
            "pipeline_max_parallel_jobs" => {
                self.pipeline.max_parallel_jobs = parse_value(key, value)?
            }
            "logging_level" => self.logging.level = value.to_ascii_lowercase(),
            "logging_json" => self.logging.json = parse_value(key, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Reject values no run could use
    pub fn validate(&self) -> AppResult<()> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(AppError::InvalidConfig(format!(
                "unknown log level '{}' (expected one of {})",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        if self.tool.crf > 51 {
            return Err(AppError::InvalidConfig(format!(
                "crf must be between 0 and 51, got {}",
                self.tool.crf
            )));
        }
        if self.tool.timeout_base_secs == 0 {
            return Err(AppError::InvalidConfig(
                "tool.timeout_base_secs must be positive".to_string(),
            ));
        }
        if !(self.tool.timeout_per_media_second.is_finite()
            && self.tool.timeout_per_media_second >= 0.0)
        {
            return Err(AppError::InvalidConfig(
                "tool.timeout_per_media_second must be a non-negative number".to_string(),
            ));
        }
        if self.translator.timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "translator.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parallel job count with 0 resolved to the CPU count
    pub fn parallel_jobs(&self) -> usize {
        match self.pipeline.max_parallel_jobs {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }

    /// Settings for the transcoding phases
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            encode: EncodeSettings {
                video_codec: self.tool.video_codec.clone(),
                audio_codec: self.tool.audio_codec.clone(),
                preset: self.tool.preset.clone(),
                crf: self.tool.crf,
            },
            timeouts: TimeoutPolicy {
                base_secs: self.tool.timeout_base_secs,
                per_media_second: self.tool.timeout_per_media_second,
            },
            max_parallel_jobs: self.parallel_jobs(),
            effects_dir: self.effects.directory.clone(),
            substitute_fallback_to_any: self.effects.fallback_to_any,
        }
    }

    /// Timeout for one translator request
    pub fn translator_timeout(&self) -> Duration {
        Duration::from_secs(self.translator.timeout_secs)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidConfig(format!("{} cannot be '{}'", key, value)))
}
