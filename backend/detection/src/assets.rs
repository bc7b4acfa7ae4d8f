//! Asset upload for images too large to inline.
//!
//! NVCF assets are created in two steps: a JSON call that returns a
//! pre-signed upload URL plus an asset id, then a raw `PUT` of the bytes.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use hivecheck_core::AssetUploader;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Header carrying the asset description on the pre-signed upload.
pub const ASSET_DESCRIPTION_HEADER: &str = "x-amz-meta-nvcf-asset-description";

/// Uploads assets through the NVCF assets API.
pub struct NvcfAssetUploader {
    client: Client,
    api_key: String,
    assets_endpoint: String,
}

impl NvcfAssetUploader {
    pub fn new(api_key: impl Into<String>, assets_endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            assets_endpoint: assets_endpoint.into(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAssetRequest<'a> {
    content_type: &'a str,
    description: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAssetResponse {
    upload_url: String,
    asset_id: String,
}

#[async_trait]
impl AssetUploader for NvcfAssetUploader {
    async fn upload(&self, bytes: &[u8], content_type: &str, description: &str) -> Result<String> {
        debug!(endpoint = %self.assets_endpoint, "Creating NVCF asset");

        let response = self
            .client
            .post(&self.assets_endpoint)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .json(&CreateAssetRequest {
                content_type,
                description,
            })
            .send()
            .await
            .context("NVCF asset creation request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("NVCF asset creation returned {}: {}", status, body);
        }

        let created: CreateAssetResponse = response
            .json()
            .await
            .context("Failed to parse NVCF asset creation response")?;

        let response = self
            .client
            .put(&created.upload_url)
            .header(CONTENT_TYPE, content_type)
            .header(ASSET_DESCRIPTION_HEADER, description)
            .body(bytes.to_vec())
            .send()
            .await
            .context("NVCF asset upload failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("NVCF asset upload returned {}: {}", status, body);
        }

        info!(asset_id = %created.asset_id, bytes = bytes.len(), "Uploaded NVCF asset");
        Ok(created.asset_id)
    }
}

/// An uploader that hands out a fixed asset id without any network traffic.
pub struct MockAssetUploader {
    asset_id: String,
    fail: bool,
    calls: AtomicUsize,
    last_upload_len: Mutex<Option<usize>>,
}

impl MockAssetUploader {
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            fail: false,
            calls: AtomicUsize::new(0),
            last_upload_len: Mutex::new(None),
        }
    }

    /// An uploader whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_upload_len(&self) -> Option<usize> {
        *self.last_upload_len.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AssetUploader for MockAssetUploader {
    async fn upload(&self, bytes: &[u8], _content_type: &str, _description: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_upload_len.lock().unwrap_or_else(|e| e.into_inner()) = Some(bytes.len());
        if self.fail {
            bail!("mock asset upload failure");
        }
        Ok(self.asset_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_bytes, body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn two_step_upload_returns_asset_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/nvcf/assets"))
            .and(header("authorization", "Bearer nvapi-test"))
            .and(header("accept", "application/json"))
            .and(body_json(json!({
                "contentType": "image/jpeg",
                "description": "Input image"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uploadUrl": format!("{}/upload/asset-42", server.uri()),
                "assetId": "asset-42"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/upload/asset-42"))
            .and(header("content-type", "image/jpeg"))
            .and(header(ASSET_DESCRIPTION_HEADER, "Input image"))
            .and(body_bytes(b"raw-jpeg".to_vec()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let uploader =
            NvcfAssetUploader::new("nvapi-test", format!("{}/v2/nvcf/assets", server.uri()));
        let id = uploader
            .upload(b"raw-jpeg", "image/jpeg", "Input image")
            .await
            .unwrap();
        assert_eq!(id, "asset-42");
    }

    #[tokio::test]
    async fn creation_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let uploader = NvcfAssetUploader::new("nvapi-test", server.uri());
        let err = uploader
            .upload(b"raw", "image/jpeg", "Input image")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("forbidden"));
    }

    #[tokio::test]
    async fn mock_counts_calls() {
        let uploader = MockAssetUploader::new("asset-1");
        assert_eq!(uploader.upload(b"abc", "image/jpeg", "x").await.unwrap(), "asset-1");
        assert_eq!(uploader.calls(), 1);
        assert_eq!(uploader.last_upload_len(), Some(3));

        let failing = MockAssetUploader::failing();
        assert!(failing.upload(b"abc", "image/jpeg", "x").await.is_err());
        assert_eq!(failing.calls(), 1);
    }
}
