use crate::{
    error::{GenAiError, Result},
    gemini::backend::GenerationBackend,
    models::{
        AspectRatio, GenerateContentRequest, GenerateContentResponse, ModelTier, SourceImage,
        FLASH_IMAGE_MODEL, PRO_IMAGE_MODEL,
    },
    settings::{resolve_model, SettingsProvider},
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ImageClient {
    backend: Arc<dyn GenerationBackend>,
    settings: Arc<dyn SettingsProvider>,
}

impl ImageClient {
    pub fn new(backend: Arc<dyn GenerationBackend>, settings: Arc<dyn SettingsProvider>) -> Self {
        Self { backend, settings }
    }

    pub fn supported_models() -> Vec<(&'static str, &'static str, ModelTier)> {
        vec![
            (PRO_IMAGE_MODEL, "Gemini 3 Pro Image (preview)", ModelTier::Pro),
            (FLASH_IMAGE_MODEL, "Gemini 2.5 Flash Image", ModelTier::Flash),
        ]
    }

    /// Stylizes a captured photo. `source_image` is a
    /// `data:<mime>;base64,<payload>` string; the result is a
    /// `data:image/png;base64,<payload>` string. The model comes from the
    /// persisted settings (flash canonical when absent); a pro-tier
    /// primary that fails on entitlement or model availability is retried
    /// once against flash. At most two network calls per invocation.
    pub async fn generate_image(
        &self,
        source_image: &str,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<String> {
        let request_id = Uuid::new_v4();
        let selection = resolve_model(self.settings.as_ref());
        let source = SourceImage::from_data_uri(source_image)?;

        let tier = selection.tier;
        let model = tier.canonical_model();
        let request = GenerateContentRequest::stylize(&source, prompt, aspect_ratio, tier);

        log::info!(
            "[{}] Invoking {} ({:?} tier, stored selection {:?})",
            request_id,
            model,
            tier,
            selection.model
        );

        let response = match self.backend.generate_content(model, &request).await {
            Ok(response) => response,
            Err(err) if tier == ModelTier::Pro && err.is_entitlement_failure() => {
                log::warn!(
                    "[{}] {} failed ({}), falling back to {}",
                    request_id,
                    model,
                    err,
                    FLASH_IMAGE_MODEL
                );
                let fallback = GenerateContentRequest::stylize(
                    &source,
                    prompt,
                    aspect_ratio,
                    ModelTier::Flash,
                );
                self.backend
                    .generate_content(ModelTier::Flash.canonical_model(), &fallback)
                    .await
                    .map_err(Self::reword_permission_failure)?
            }
            Err(err) => return Err(Self::reword_permission_failure(err)),
        };

        let image = Self::extract_image(response)?;
        log::info!("[{}] Generation succeeded", request_id);
        Ok(image)
    }

    /// Final rewrite at the outermost boundary: a permission-pattern
    /// failure, whichever attempt produced it, becomes actionable
    /// guidance. Everything else propagates verbatim.
    fn reword_permission_failure(err: GenAiError) -> GenAiError {
        if err.is_permission_denied() {
            let status = match &err {
                GenAiError::Api { status, .. } => *status,
                _ => None,
            };
            GenAiError::Api {
                status,
                message: "API key permission denied. Pro-tier image models require a \
                          billing-enabled Google Cloud project; the flash tier works without one."
                    .into(),
            }
        } else {
            err
        }
    }

    /// Returns the first inline image of the first candidate as a PNG
    /// data URI. Later parts and candidates are never inspected.
    fn extract_image(response: GenerateContentResponse) -> Result<String> {
        if let Some(candidate) = response.candidates.into_iter().next() {
            if let Some(content) = candidate.content {
                for part in content.parts {
                    if let Some(inline) = part.inline_data {
                        return Ok(format!("data:image/png;base64,{}", inline.data));
                    }
                }
            }
        }
        Err(GenAiError::EmptyResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, CandidateContent, InlineDataPayload, ResponsePart};
    use crate::settings::StaticSettingsProvider;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct RecordingBackend {
        calls: Mutex<Vec<(String, GenerateContentRequest)>>,
        responses: Mutex<VecDeque<Result<GenerateContentResponse>>>,
    }

    impl RecordingBackend {
        fn new(responses: Vec<Result<GenerateContentResponse>>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call(&self, index: usize) -> (String, GenerateContentRequest) {
            self.calls.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl GenerationBackend for RecordingBackend {
        async fn generate_content(
            &self,
            model: &str,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), request.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("backend called more times than scripted")
        }
    }

    fn image_response(data: &str) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![ResponsePart {
                        inline_data: Some(InlineDataPayload {
                            mime_type: "image/png".into(),
                            data: data.into(),
                        }),
                    }],
                }),
            }],
        }
    }

    fn api_error(status: Option<u16>, message: &str) -> GenAiError {
        GenAiError::Api {
            status,
            message: message.into(),
        }
    }

    fn pro_settings() -> Arc<StaticSettingsProvider> {
        Arc::new(StaticSettingsProvider::new(
            r#"{"selectedModel": "gemini-3-pro-image-preview"}"#,
        ))
    }

    fn flash_settings() -> Arc<StaticSettingsProvider> {
        Arc::new(StaticSettingsProvider::new(
            r#"{"selectedModel": "gemini-2.5-flash-image"}"#,
        ))
    }

    fn client(
        backend: &Arc<RecordingBackend>,
        settings: Arc<StaticSettingsProvider>,
    ) -> ImageClient {
        ImageClient::new(backend.clone() as Arc<dyn GenerationBackend>, settings)
    }

    const SOURCE: &str = "data:image/jpeg;base64,aGk=";

    #[tokio::test]
    async fn test_missing_comma_fails_before_any_call() {
        let backend = RecordingBackend::new(vec![]);
        let client = client(&backend, flash_settings());

        let err = client
            .generate_image("no comma here", "Retro", AspectRatio::Portrait)
            .await
            .unwrap_err();
        assert!(matches!(err, GenAiError::Validation(_)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_payload_fails_before_any_call() {
        let backend = RecordingBackend::new(vec![]);
        let client = client(&backend, flash_settings());

        let err = client
            .generate_image("data:image/png;base64,", "Retro", AspectRatio::Portrait)
            .await
            .unwrap_err();
        assert!(matches!(err, GenAiError::Validation(_)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_pro_success_makes_one_call_with_size_hint() {
        let backend = RecordingBackend::new(vec![Ok(image_response("UFJP"))]);
        let client = client(&backend, pro_settings());

        let image = client
            .generate_image(SOURCE, "Retro", AspectRatio::Portrait)
            .await
            .unwrap();
        assert_eq!(image, "data:image/png;base64,UFJP");
        assert_eq!(backend.call_count(), 1);

        let (model, request) = backend.call(0);
        assert_eq!(model, PRO_IMAGE_MODEL);
        assert_eq!(
            request.generation_config.image_config.image_size.as_deref(),
            Some("1K")
        );
    }

    #[tokio::test]
    async fn test_pro_403_falls_back_to_flash_without_hint() {
        let backend = RecordingBackend::new(vec![
            Err(api_error(Some(403), "permission denied")),
            Ok(image_response("RkFMTEJBQ0s=")),
        ]);
        let client = client(&backend, pro_settings());

        let image = client
            .generate_image(SOURCE, "Retro", AspectRatio::Portrait)
            .await
            .unwrap();
        assert_eq!(image, "data:image/png;base64,RkFMTEJBQ0s=");
        assert_eq!(backend.call_count(), 2);

        let (primary_model, primary_request) = backend.call(0);
        assert_eq!(primary_model, PRO_IMAGE_MODEL);
        assert!(primary_request
            .generation_config
            .image_config
            .image_size
            .is_some());

        let (fallback_model, fallback_request) = backend.call(1);
        assert_eq!(fallback_model, FLASH_IMAGE_MODEL);
        assert!(fallback_request
            .generation_config
            .image_config
            .image_size
            .is_none());
    }

    #[tokio::test]
    async fn test_pro_404_falls_back_to_flash() {
        let backend = RecordingBackend::new(vec![
            Err(api_error(None, "model not found for API version v1beta")),
            Ok(image_response("QQ==")),
        ]);
        let client = client(&backend, pro_settings());

        let image = client
            .generate_image(SOURCE, "Retro", AspectRatio::Landscape)
            .await
            .unwrap();
        assert_eq!(image, "data:image/png;base64,QQ==");
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_pro_safety_failure_does_not_fall_back() {
        let backend = RecordingBackend::new(vec![Err(api_error(None, "safety violation"))]);
        let client = client(&backend, pro_settings());

        let err = client
            .generate_image(SOURCE, "Retro", AspectRatio::Portrait)
            .await
            .unwrap_err();
        assert_eq!(backend.call_count(), 1);
        match err {
            GenAiError::Api { message, .. } => assert_eq!(message, "safety violation"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_flash_failure_never_falls_back() {
        let backend = RecordingBackend::new(vec![Err(api_error(Some(500), "server error"))]);
        let client = client(&backend, flash_settings());

        let err = client
            .generate_image(SOURCE, "Retro", AspectRatio::Portrait)
            .await
            .unwrap_err();
        assert_eq!(backend.call_count(), 1);
        match err {
            GenAiError::Api { status, message } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "server error");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_flash_permission_failure_is_reworded() {
        let backend = RecordingBackend::new(vec![Err(api_error(Some(403), "forbidden"))]);
        let client = client(&backend, flash_settings());

        let err = client
            .generate_image(SOURCE, "Retro", AspectRatio::Portrait)
            .await
            .unwrap_err();
        assert_eq!(backend.call_count(), 1);
        assert!(err.to_string().contains("billing-enabled"));
    }

    #[tokio::test]
    async fn test_failed_fallback_propagates_fallback_error() {
        let backend = RecordingBackend::new(vec![
            Err(api_error(Some(404), "not found")),
            Err(api_error(None, "flash exploded")),
        ]);
        let client = client(&backend, pro_settings());

        let err = client
            .generate_image(SOURCE, "Retro", AspectRatio::Portrait)
            .await
            .unwrap_err();
        assert_eq!(backend.call_count(), 2);
        match err {
            GenAiError::Api { message, .. } => assert_eq!(message, "flash exploded"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fallback_permission_failure_is_reworded() {
        let backend = RecordingBackend::new(vec![
            Err(api_error(Some(403), "permission denied")),
            Err(api_error(Some(403), "permission denied")),
        ]);
        let client = client(&backend, pro_settings());

        let err = client
            .generate_image(SOURCE, "Retro", AspectRatio::Portrait)
            .await
            .unwrap_err();
        assert_eq!(backend.call_count(), 2);
        assert!(err.to_string().contains("billing-enabled"));
    }

    #[tokio::test]
    async fn test_first_candidate_first_part_wins() {
        let response = GenerateContentResponse {
            candidates: vec![
                Candidate {
                    content: Some(CandidateContent {
                        parts: vec![
                            ResponsePart { inline_data: None },
                            ResponsePart {
                                inline_data: Some(InlineDataPayload {
                                    mime_type: "image/png".into(),
                                    data: "Rk9STVRU".into(),
                                }),
                            },
                            ResponsePart {
                                inline_data: Some(InlineDataPayload {
                                    mime_type: "image/png".into(),
                                    data: "U0VDT05E".into(),
                                }),
                            },
                        ],
                    }),
                },
                Candidate {
                    content: Some(CandidateContent {
                        parts: vec![ResponsePart {
                            inline_data: Some(InlineDataPayload {
                                mime_type: "image/png".into(),
                                data: "T1RIRVI=".into(),
                            }),
                        }],
                    }),
                },
            ],
        };
        let backend = RecordingBackend::new(vec![Ok(response)]);
        let client = client(&backend, flash_settings());

        let image = client
            .generate_image(SOURCE, "Retro", AspectRatio::Portrait)
            .await
            .unwrap();
        assert_eq!(image, "data:image/png;base64,Rk9STVRU");
    }

    #[tokio::test]
    async fn test_candidates_without_inline_data_is_empty_result() {
        let response = GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![ResponsePart { inline_data: None }],
                }),
            }],
        };
        let backend = RecordingBackend::new(vec![Ok(response)]);
        let client = client(&backend, flash_settings());

        let err = client
            .generate_image(SOURCE, "Retro", AspectRatio::Portrait)
            .await
            .unwrap_err();
        assert!(matches!(err, GenAiError::EmptyResult));
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_result() {
        let backend =
            RecordingBackend::new(vec![Ok(GenerateContentResponse { candidates: vec![] })]);
        let client = client(&backend, flash_settings());

        let err = client
            .generate_image(SOURCE, "Retro", AspectRatio::Portrait)
            .await
            .unwrap_err();
        assert!(matches!(err, GenAiError::EmptyResult));
    }

    #[tokio::test]
    async fn test_malformed_settings_dispatch_to_flash() {
        let backend = RecordingBackend::new(vec![Ok(image_response("QQ=="))]);
        let settings = Arc::new(StaticSettingsProvider::new("{broken"));
        let client = ImageClient::new(backend.clone() as Arc<dyn GenerationBackend>, settings);

        client
            .generate_image(SOURCE, "Retro", AspectRatio::Portrait)
            .await
            .unwrap();
        let (model, request) = backend.call(0);
        assert_eq!(model, FLASH_IMAGE_MODEL);
        assert!(request.generation_config.image_config.image_size.is_none());
    }

    #[tokio::test]
    async fn test_identical_invocations_yield_identical_outputs() {
        for _ in 0..2 {
            let backend = RecordingBackend::new(vec![Ok(image_response("UkVQRUFU"))]);
            let client = client(&backend, pro_settings());
            let image = client
                .generate_image(SOURCE, "Retro", AspectRatio::Portrait)
                .await
                .unwrap();
            assert_eq!(image, "data:image/png;base64,UkVQRUFU");
            assert_eq!(backend.call_count(), 1);
        }
    }

    #[test]
    fn test_supported_models_lists_both_tiers() {
        let models = ImageClient::supported_models();
        assert_eq!(models.len(), 2);
        assert!(models
            .iter()
            .any(|(id, _, tier)| *id == PRO_IMAGE_MODEL && *tier == ModelTier::Pro));
        assert!(models
            .iter()
            .any(|(id, _, tier)| *id == FLASH_IMAGE_MODEL && *tier == ModelTier::Flash));
    }
}
