use crate::{
    config::{GeminiConfig, DEFAULT_BASE_URL},
    error::{GenAiError, Result},
    models::{GenerateContentRequest, GenerateContentResponse},
};
use async_trait::async_trait;

/// The single outbound seam: one `generateContent` call per invocation
/// of this method. Mocked in tests to assert call counts.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

/// reqwest-backed implementation against the Gemini REST API. Request
/// timeouts are the transport's business; nothing here retries.
#[derive(Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config.api_key.ok_or_else(|| {
            GenAiError::Config(
                "API key is missing. Set GEMINI_API_KEY (or GOOGLE_API_KEY) in the environment"
                    .into(),
            )
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                body
            };
            return Err(GenAiError::Api {
                status: Some(status.as_u16()),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
