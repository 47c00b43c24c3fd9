use crate::models::{ModelTier, FLASH_IMAGE_MODEL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted photobooth settings record. The booth UI owns this record
/// and writes many more fields; only `selectedModel` matters here, the
/// rest is ignored on parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhotoboothSettings {
    pub selected_model: Option<String>,
}

/// Read-only access to the persisted settings record. Implementations
/// must never block generation on a bad record: return the raw text and
/// let resolution tolerate the rest.
pub trait SettingsProvider: Send + Sync {
    fn load(&self) -> Option<String>;
}

/// Settings stored as a JSON file on disk (the booth admin screen owns
/// the writes).
#[derive(Debug, Clone)]
pub struct FileSettingsProvider {
    path: PathBuf,
}

impl FileSettingsProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsProvider for FileSettingsProvider {
    fn load(&self) -> Option<String> {
        fs::read_to_string(&self.path).ok()
    }
}

/// In-memory settings record, for embedding hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSettingsProvider {
    record: Option<String>,
}

impl StaticSettingsProvider {
    pub fn new(record: impl Into<String>) -> Self {
        Self {
            record: Some(record.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl SettingsProvider for StaticSettingsProvider {
    fn load(&self) -> Option<String> {
        self.record.clone()
    }
}

/// The model picked for one invocation: the stored name for logging plus
/// the tier the pipeline actually dispatches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: String,
    pub tier: ModelTier,
}

/// Resolves the model for this invocation. Absent record, unparseable
/// JSON, or a missing/empty `selectedModel` field all fall through to
/// the canonical flash model; a malformed record is logged and ignored,
/// never fatal.
pub fn resolve_model(provider: &dyn SettingsProvider) -> ModelSelection {
    let mut model = FLASH_IMAGE_MODEL.to_string();

    if let Some(raw) = provider.load() {
        match serde_json::from_str::<PhotoboothSettings>(&raw) {
            Ok(settings) => {
                if let Some(selected) = settings.selected_model.filter(|m| !m.is_empty()) {
                    model = selected;
                }
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings record: {}", e);
            }
        }
    }

    let tier = ModelTier::from_model_name(&model);
    ModelSelection { model, tier }
}
