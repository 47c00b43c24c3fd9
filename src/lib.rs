pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod settings;

pub use config::GeminiConfig;
pub use error::{GenAiError, Result};
pub use gemini::{GeminiClient, GenerationBackend, HttpBackend, ImageClient};
pub use models::{AspectRatio, ModelTier, FLASH_IMAGE_MODEL, PRO_IMAGE_MODEL};
pub use settings::{
    FileSettingsProvider, ModelSelection, PhotoboothSettings, SettingsProvider,
    StaticSettingsProvider,
};
