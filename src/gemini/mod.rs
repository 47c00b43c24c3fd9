pub mod backend;
pub mod image_client;

use crate::{
    config::GeminiConfig,
    error::Result,
    settings::{FileSettingsProvider, SettingsProvider, StaticSettingsProvider},
};
use std::path::PathBuf;
use std::sync::Arc;

pub use backend::{GenerationBackend, HttpBackend};
pub use image_client::ImageClient;

#[derive(Clone)]
pub struct GeminiClient {
    image_client: ImageClient,
}

impl GeminiClient {
    /// Client without a settings store: every generation uses the
    /// canonical flash model.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        Self::with_settings(config, Arc::new(StaticSettingsProvider::empty()))
    }

    pub fn with_settings(
        config: GeminiConfig,
        settings: Arc<dyn SettingsProvider>,
    ) -> Result<Self> {
        let backend: Arc<dyn GenerationBackend> = Arc::new(HttpBackend::new(config)?);
        Ok(Self {
            image_client: ImageClient::new(backend, settings),
        })
    }

    /// Client reading the booth's persisted settings from a JSON file.
    pub fn with_settings_file(config: GeminiConfig, path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_settings(config, Arc::new(FileSettingsProvider::new(path)))
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }
}
