use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid source image: {0}")]
    Validation(String),

    /// A failed model call. `status` carries the HTTP status when the
    /// transport reported one; message-based classification is the
    /// fallback for errors that arrive without a status.
    #[error("Gemini API error: {message}")]
    Api { status: Option<u16>, message: String },

    #[error("No image data returned from Gemini")]
    EmptyResult,

    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GenAiError {
    /// True when a model call failed in a way that looks like a pro-tier
    /// entitlement or availability problem: billing not enabled for the
    /// project (403) or the preview model not visible to it (404). These
    /// are the only failures the flash fallback is allowed to recover.
    pub fn is_entitlement_failure(&self) -> bool {
        match self {
            GenAiError::Api {
                status: Some(403 | 404),
                ..
            } => true,
            GenAiError::Api { message, .. } => {
                let lower = message.to_lowercase();
                lower.contains("403")
                    || lower.contains("permission denied")
                    || lower.contains("404")
                    || lower.contains("not found")
            }
            _ => false,
        }
    }

    /// Narrower check used for the final user-facing rewrite: only the
    /// permission pattern, not the model-not-found one.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            GenAiError::Api {
                status: Some(403), ..
            } => true,
            GenAiError::Api { message, .. } => {
                let lower = message.to_lowercase();
                lower.contains("403") || lower.contains("permission denied")
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenAiError>;
