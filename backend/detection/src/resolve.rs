//! Turning a chat request into image bytes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use hivecheck_core::{AnalysisRequest, AnalyzerError, ResolvedImage};
use tokio::fs;
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::data_uri::{DataUri, file_name_of, find_data_uri, find_file_reference};

/// Where the request's image lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ImageSource {
    Inline(DataUri),
    File(String),
}

/// Resolves image references against the asset root.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    asset_root: PathBuf,
    temp_path: PathBuf,
}

impl ImageResolver {
    pub fn new(asset_root: impl Into<PathBuf>, temp_path: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            temp_path: temp_path.into(),
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.asset_root.clone(), config.temp_path())
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    /// Resolve the request's image into bytes.
    ///
    /// Fails with [`AnalyzerError::FileNotFound`] when a referenced file is
    /// absent and with [`AnalyzerError::ValidationFailed`] when the request
    /// carries no usable reference or a malformed payload.
    pub async fn resolve(&self, request: &AnalysisRequest) -> Result<ResolvedImage> {
        match locate(request) {
            Some(ImageSource::Inline(uri)) => self.resolve_inline(&uri).await,
            Some(ImageSource::File(name)) => self.resolve_file(&name).await,
            None => Err(AnalyzerError::ValidationFailed(
                "request does not reference an image".to_string(),
            )
            .into()),
        }
    }

    async fn resolve_inline(&self, uri: &DataUri) -> Result<ResolvedImage> {
        let bytes = uri
            .decode()
            .map_err(|e| AnalyzerError::ValidationFailed(format!("{e:#}")))?;

        fs::create_dir_all(&self.temp_path)
            .await
            .with_context(|| format!("Failed to create temp dir: {}", self.temp_path.display()))?;

        // Millisecond names: two invocations in the same millisecond collide.
        let staged = self
            .temp_path
            .join(format!("ai_image_{}.jpg", Utc::now().timestamp_millis()));
        fs::write(&staged, &bytes)
            .await
            .with_context(|| format!("Failed to stage inline image: {}", staged.display()))?;

        debug!(path = %staged.display(), bytes = bytes.len(), mime = %uri.mime, "Staged inline image");
        Ok(ResolvedImage::inline(bytes, staged))
    }

    async fn resolve_file(&self, name: &str) -> Result<ResolvedImage> {
        if let Err(e) = fs::create_dir_all(&self.asset_root).await {
            warn!(path = %self.asset_root.display(), error = %e, "Could not create asset root");
        }

        let path = self.asset_root.join(name);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(AnalyzerError::FileNotFound { path }.into()),
        }

        let bytes = fs::read(&path)
            .await
            .with_context(|| format!("Failed to read image: {}", path.display()))?;
        debug!(path = %path.display(), bytes = bytes.len(), "Read image file");
        Ok(ResolvedImage::from_file(bytes, path))
    }
}

/// Data URI in the text, then the first image attachment, then a file
/// reference in the text.
fn locate(request: &AnalysisRequest) -> Option<ImageSource> {
    let text = request.text();

    if let Some(uri) = text.and_then(find_data_uri) {
        return Some(ImageSource::Inline(uri));
    }

    if let Some(attachment) = request.attachments.iter().find(|a| a.is_image()) {
        if let Some(uri) = find_data_uri(&attachment.url) {
            return Some(ImageSource::Inline(uri));
        }
        if let Some(name) = file_name_of(&attachment.url) {
            return Some(ImageSource::File(name));
        }
    }

    text.and_then(find_file_reference).map(ImageSource::File)
}
