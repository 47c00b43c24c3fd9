use serde::{Deserialize, Serialize};

pub const PRO_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
pub const FLASH_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Pricing/availability tier of an image model. Resolved once from the
/// stored model name; the rest of the pipeline only ever sees the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Pro,
    Flash,
}

impl ModelTier {
    /// A stored model name containing "pro" (any case) selects the pro
    /// tier; everything else, including unrecognized names, is flash.
    pub fn from_model_name(name: &str) -> Self {
        if name.to_lowercase().contains("pro") {
            ModelTier::Pro
        } else {
            ModelTier::Flash
        }
    }

    pub fn canonical_model(&self) -> &'static str {
        match self {
            ModelTier::Pro => PRO_IMAGE_MODEL,
            ModelTier::Flash => FLASH_IMAGE_MODEL,
        }
    }

    /// Only the pro tier accepts the `imageSize` hint; flash rejects a
    /// request that carries it.
    pub fn supports_size_hint(&self) -> bool {
        matches!(self, ModelTier::Pro)
    }
}
