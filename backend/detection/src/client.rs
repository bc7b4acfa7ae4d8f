//! Client for the Hive AI-generated image detection endpoint.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hivecheck_core::{AnalyzerError, AssetUploader, ClassificationResult, ResolvedImage};
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalyzerConfig;
use crate::data_uri::{asset_image_uri, inline_image_uri};

/// Header naming the assets a request refers to.
pub const ASSET_REFERENCES_HEADER: &str = "NVCF-INPUT-ASSET-REFERENCES";

const UPLOAD_CONTENT_TYPE: &str = "image/jpeg";
const UPLOAD_DESCRIPTION: &str = "Input image";

/// How the image travels to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionMode {
    /// Base64 data URI in the JSON body.
    Inline,
    /// Uploaded first, then referenced by asset id.
    Asset,
}

impl TransmissionMode {
    /// `Inline` iff the base64 length is strictly below `threshold`.
    pub fn for_encoded_len(encoded_len: usize, threshold: usize) -> Self {
        if encoded_len < threshold {
            Self::Inline
        } else {
            Self::Asset
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Asset => "asset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct DetectionRequest {
    input: Vec<String>,
}

#[derive(Deserialize)]
struct DetectionResponse {
    data: Vec<ClassificationResult>,
}

/// A detection call ready to be sent.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub mode: TransmissionMode,
    pub encoded_len: usize,
    pub asset_id: Option<String>,
    body: DetectionRequest,
}

impl PreparedRequest {
    /// The single `input` entry of the request body.
    pub fn input(&self) -> &str {
        &self.body.input[0]
    }
}

pub struct DetectionClient {
    client: Client,
    api_key: String,
    endpoint: String,
    inline_threshold: usize,
    uploader: Arc<dyn AssetUploader>,
}

impl DetectionClient {
    pub fn new(config: &AnalyzerConfig, uploader: Arc<dyn AssetUploader>) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            inline_threshold: config.inline_threshold,
            uploader,
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Pick inline or asset transmission from the padded base64 length.
    ///
    /// Only inline images are encoded. In asset mode the image is uploaded
    /// here, and its staged temp file is discarded as soon as the upload call
    /// returns, whatever the outcome.
    pub async fn prepare(&self, image: &mut ResolvedImage) -> Result<PreparedRequest, AnalyzerError> {
        let encoded_len = base64::encoded_len(image.bytes.len(), true).unwrap_or(usize::MAX);
        let mode = TransmissionMode::for_encoded_len(encoded_len, self.inline_threshold);

        match mode {
            TransmissionMode::Inline => Ok(PreparedRequest {
                mode,
                encoded_len,
                asset_id: None,
                body: DetectionRequest {
                    input: vec![inline_image_uri(&STANDARD.encode(&image.bytes))],
                },
            }),
            TransmissionMode::Asset => {
                let uploaded = self
                    .uploader
                    .upload(&image.bytes, UPLOAD_CONTENT_TYPE, UPLOAD_DESCRIPTION)
                    .await;
                image.discard_staged().await;

                let asset_id = uploaded
                    .context("Asset upload failed")
                    .map_err(AnalyzerError::ApiError)?;
                debug!(asset_id = %asset_id, encoded_len, "Image uploaded as asset");

                Ok(PreparedRequest {
                    mode,
                    encoded_len,
                    body: DetectionRequest {
                        input: vec![asset_image_uri(&asset_id)],
                    },
                    asset_id: Some(asset_id),
                })
            }
        }
    }

    /// Send a prepared request and return the first classification.
    pub async fn submit(&self, prepared: &PreparedRequest) -> Result<ClassificationResult, AnalyzerError> {
        self.send(prepared).await.map_err(AnalyzerError::ApiError)
    }

    /// `prepare` followed by `submit`.
    pub async fn classify(&self, image: &mut ResolvedImage) -> Result<ClassificationResult, AnalyzerError> {
        let prepared = self.prepare(image).await?;
        self.submit(&prepared).await
    }

    async fn send(&self, prepared: &PreparedRequest) -> Result<ClassificationResult> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&prepared.body);
        if let Some(asset_id) = &prepared.asset_id {
            request = request.header(ASSET_REFERENCES_HEADER, asset_id);
        }

        debug!(mode = prepared.mode.as_str(), endpoint = %self.endpoint, "Sending detection request");
        let response = request
            .send()
            .await
            .context("Detection HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("detection API returned {}: {}", status, body);
        }

        let parsed: DetectionResponse = response
            .json()
            .await
            .context("Failed to parse detection response")?;

        parsed
            .data
            .into_iter()
            .next()
            .context("Detection response contained no results")
    }
}
