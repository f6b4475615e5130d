use std::sync::Arc;

use crate::adapters::{FFmpegAdapter, FFprobeAdapter, OllamaTranslator, PipelineConfig};
use crate::app::pipeline_interactor::PipelineInteractor;
use crate::domain::errors::DomainError;
use crate::ports::{DurationProbePort, TranscodePort, TranslatorPort};

pub trait AppContainer: Send + Sync {
    fn pipeline_interactor(&self) -> Arc<PipelineInteractor>;
}

pub struct DefaultAppContainer {
    pipeline_interactor: Arc<PipelineInteractor>,
}

impl DefaultAppContainer {
    /// Wire the production adapters from configuration
    pub fn new(config: &PipelineConfig) -> Result<Self, DomainError> {
        let engine = config.engine_config();
        let probe_timeout = engine.timeouts.for_media(None);

        let transcoder = Arc::new(FFmpegAdapter::new(config.tool.ffmpeg_path.clone()));
        let probe = Arc::new(FFprobeAdapter::new(config.tool.ffprobe_path.clone(), probe_timeout));
        let translator = Arc::new(OllamaTranslator::new(
            config.translator.base_url.clone(),
            config.translator.model.clone(),
            config.translator.max_tokens,
            config.translator_timeout(),
        )?);

        let pipeline_interactor = Arc::new(PipelineInteractor::new(
            transcoder as Arc<dyn TranscodePort>,
            probe as Arc<dyn DurationProbePort>,
            translator as Arc<dyn TranslatorPort>,
            engine,
        ));

        Ok(Self {
            pipeline_interactor,
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn pipeline_interactor(&self) -> Arc<PipelineInteractor> {
        Arc::clone(&self.pipeline_interactor)
    }
}
