use crate::{
    error::{GenAiError, Result},
    models::ModelTier,
};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Size hint sent to pro-tier models only.
pub const PRO_IMAGE_SIZE: &str = "1K";

/// Output shapes supported by the photobooth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Landscape => "16:9",
        }
    }
}

/// A captured photo, parsed out of a `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub mime_type: String,
    pub data: String,
}

impl SourceImage {
    /// Parses and validates a data URI. The MIME detection is a
    /// heuristic, not a full MIME parse: a prefix indicating PNG maps to
    /// `image/png`, anything else is treated as JPEG.
    pub fn from_data_uri(source: &str) -> Result<Self> {
        let (prefix, payload) = source.split_once(',').ok_or_else(|| {
            GenAiError::Validation(
                "expected a data URI of the form data:<mime>;base64,<payload>".into(),
            )
        })?;

        if payload.is_empty() {
            return Err(GenAiError::Validation(
                "data URI carries an empty base64 payload".into(),
            ));
        }

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| GenAiError::Validation(format!("payload is not valid base64: {}", e)))?;
        if decoded.is_empty() {
            return Err(GenAiError::Validation(
                "payload decodes to an empty image".into(),
            ));
        }

        let mime_type = if prefix.starts_with("data:image/png") {
            "image/png"
        } else {
            "image/jpeg"
        };

        Ok(SourceImage {
            mime_type: mime_type.to_string(),
            data: payload.to_string(),
        })
    }
}

/// Fixed instruction appended to every concept prompt. Keeps the
/// subject's identity intact and steers the model toward print-ready
/// photobooth output.
pub fn augmented_prompt(prompt: &str, aspect_ratio: AspectRatio) -> String {
    format!(
        "{}. High resolution, {} aspect ratio, cinematic lighting, photorealistic, \
         maintaining person's facial features and identity. No text, no watermark.",
        prompt,
        aspect_ratio.as_str()
    )
}

// Wire types for models/{model}:generateContent

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    InlineData { inline_data: InlineDataPayload },
    Text { text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineDataPayload {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub image_config: ImageConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: AspectRatio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
}

impl GenerateContentRequest {
    /// Builds the stylization request body: the captured photo first,
    /// then the augmented prompt, with the size hint only for tiers that
    /// accept it.
    pub fn stylize(
        source: &SourceImage,
        prompt: &str,
        aspect_ratio: AspectRatio,
        tier: ModelTier,
    ) -> Self {
        let image_size = tier.supports_size_hint().then(|| PRO_IMAGE_SIZE.to_string());

        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineDataPayload {
                            mime_type: source.mime_type.clone(),
                            data: source.data.clone(),
                        },
                    },
                    RequestPart::Text {
                        text: augmented_prompt(prompt, aspect_ratio),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                image_config: ImageConfig {
                    aspect_ratio,
                    image_size,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    #[serde(default)]
    pub inline_data: Option<InlineDataPayload>,
}
