//! Application state shared by all handlers.

use hlsgate_core::{Config, UploadsLayout};
use hlsgate_processing::{TranscodeService, UploadStager};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub stager: UploadStager,
    pub transcoder: TranscodeService,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let transcoder = TranscodeService::from_config(&config);
        let stager = UploadStager::new(transcoder.layout().staging_dir());
        Self {
            config,
            stager,
            transcoder,
        }
    }

    pub fn layout(&self) -> &UploadsLayout {
        self.transcoder.layout()
    }
}
