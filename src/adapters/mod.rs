// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod probe_ffprobe;
pub mod toml_config;
pub mod tracing_log;
pub mod translator_ollama;

// Re-export adapters
pub use exec_ffmpeg::FFmpegAdapter;
pub use probe_ffprobe::FFprobeAdapter;
pub use toml_config::PipelineConfig;
pub use tracing_log::{init_logging, LogSettings};
pub use translator_ollama::OllamaTranslator;
