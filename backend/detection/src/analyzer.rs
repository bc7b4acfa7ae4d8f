//! The `DETECT_AI_IMAGE` action.

use std::sync::Arc;

use async_trait::async_trait;
use hivecheck_core::{
    Action, AnalysisRequest, AnalysisResponse, AnalyzerError, AssetUploader, ImageOrigin,
    ResolvedImage, ResponseSink,
};
use hivecheck_logging::{AnalysisEvent, EventLogger, redact_sensitive_data};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::assets::NvcfAssetUploader;
use crate::client::DetectionClient;
use crate::config::AnalyzerConfig;
use crate::resolve::ImageResolver;
use crate::summary::summarize;

pub const ACTION_NAME: &str = "DETECT_AI_IMAGE";

const DESCRIPTION: &str =
    "Detect whether an image was generated by AI and identify the most likely generator";

const SIMILES: &[&str] = &["CHECK_AI_IMAGE", "AI_IMAGE_DETECTION", "IS_IMAGE_AI_GENERATED"];

/// Checks whether an image in a chat message is AI-generated.
pub struct ImageOriginAnalyzer {
    resolver: ImageResolver,
    client: DetectionClient,
}

impl ImageOriginAnalyzer {
    /// Analyzer that uploads large images through the NVCF assets API.
    pub fn new(config: &AnalyzerConfig) -> Self {
        let uploader = NvcfAssetUploader::new(config.api_key.clone(), config.assets_endpoint.clone());
        Self::with_uploader(config, Arc::new(uploader))
    }

    pub fn with_uploader(config: &AnalyzerConfig, uploader: Arc<dyn AssetUploader>) -> Self {
        Self {
            resolver: ImageResolver::from_config(config),
            client: DetectionClient::new(config, uploader),
        }
    }

    /// Resolve, classify, and summarize. `media_path` is filled as soon as
    /// the image is resolved so failures can echo it.
    async fn run(
        &self,
        invocation_id: &str,
        request: &AnalysisRequest,
        media_path: &mut Option<String>,
    ) -> anyhow::Result<AnalysisResponse> {
        let mut image = self.resolver.resolve(request).await?;
        let path = image.media_path().display().to_string();
        *media_path = Some(path.clone());

        EventLogger::log_event(
            invocation_id,
            AnalysisEvent::ImageResolved {
                origin: origin_name(image.origin).to_string(),
                bytes: image.bytes.len(),
                media_path: path.clone(),
            },
        );

        let outcome = self.classify(invocation_id, &mut image).await;
        image.discard_staged().await;
        let result = outcome?;

        EventLogger::log_event(
            invocation_id,
            AnalysisEvent::RemoteCallCompleted {
                is_ai_generated: result.is_ai_generated,
                status: result.status.clone(),
            },
        );

        let text = summarize(&result);
        Ok(AnalysisResponse::success(text, path, result))
    }

    async fn classify(
        &self,
        invocation_id: &str,
        image: &mut ResolvedImage,
    ) -> Result<hivecheck_core::ClassificationResult, AnalyzerError> {
        let prepared = self.client.prepare(image).await?;
        EventLogger::log_event(
            invocation_id,
            AnalysisEvent::RemoteCallIssued {
                mode: prepared.mode.as_str().to_string(),
                encoded_len: prepared.encoded_len,
            },
        );
        self.client.submit(&prepared).await
    }
}

#[async_trait]
impl Action for ImageOriginAnalyzer {
    fn name(&self) -> &str {
        ACTION_NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn similes(&self) -> &[&str] {
        SIMILES
    }

    async fn validate(&self, request: &AnalysisRequest) -> bool {
        request.has_text()
    }

    async fn handle(
        &self,
        request: &AnalysisRequest,
        sink: Option<&dyn ResponseSink>,
    ) -> Result<AnalysisResponse, AnalyzerError> {
        let invocation_id = Uuid::new_v4().to_string();
        EventLogger::log_event(
            &invocation_id,
            AnalysisEvent::RequestReceived {
                text_len: request.text().map_or(0, str::len),
                attachments: request.attachments.len(),
            },
        );

        if !self.validate(request).await {
            warn!(invocation_id = %invocation_id, "Rejected request without text");
            return Err(AnalyzerError::ValidationFailed(
                "request text is empty".to_string(),
            ));
        }

        let mut media_path = None;
        let err = match self.run(&invocation_id, request, &mut media_path).await {
            Ok(response) => {
                info!(invocation_id = %invocation_id, "Image analysis complete");
                if let Some(sink) = sink {
                    sink.deliver(response.clone()).await.map_err(|e| {
                        AnalyzerError::NetworkError(e.context("Failed to deliver analysis response"))
                    })?;
                }
                return Ok(response);
            }
            Err(err) => into_analyzer_error(err),
        };

        let message = redact_sensitive_data(&err.to_string());
        match &err {
            AnalyzerError::ApiError(_) | AnalyzerError::NetworkError(_) => {
                EventLogger::log_event(
                    &invocation_id,
                    AnalysisEvent::RemoteCallFailed {
                        kind: err.kind().to_string(),
                        error_msg: message.clone(),
                    },
                );
            }
            _ => {}
        }
        error!(invocation_id = %invocation_id, kind = err.kind(), error = %message, "Image analysis failed");

        if let Some(sink) = sink {
            if let Err(e) = sink
                .deliver(AnalysisResponse::failure(message, media_path))
                .await
            {
                warn!(invocation_id = %invocation_id, error = %e, "Failed to deliver failure response");
            }
        }
        Err(err)
    }
}

/// Typed errors pass through; anything else becomes a `NetworkError`.
fn into_analyzer_error(err: anyhow::Error) -> AnalyzerError {
    match err.downcast::<AnalyzerError>() {
        Ok(typed) => typed,
        Err(other) => AnalyzerError::NetworkError(other),
    }
}

fn origin_name(origin: ImageOrigin) -> &'static str {
    match origin {
        ImageOrigin::Inline => "inline",
        ImageOrigin::File => "file",
    }
}
