use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A file attached to the inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(alias = "contentType")]
    pub content_type: String,
}

impl Attachment {
    pub fn new(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Inbound request handed over by the host's action dispatcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Text with surrounding whitespace removed; `None` when absent or blank.
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn has_text(&self) -> bool {
        self.text().is_some()
    }
}

/// Where the image bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrigin {
    /// Decoded from a data URI carried in the request.
    Inline,
    /// Read from a file under the asset root.
    File,
}

/// Image bytes resolved for a single invocation.
#[derive(Debug)]
pub struct ResolvedImage {
    pub bytes: Vec<u8>,
    pub origin: ImageOrigin,
    /// Path echoed back to the caller: the source file, or the staged copy
    /// of an inline image. A staged copy is removed once the remote call
    /// finishes, so for inline images the path is a record of where the
    /// bytes were written, not something the caller can open.
    pub media_path: PathBuf,
    /// Temp file written for an inline image; removed by `discard_staged`.
    pub staged: Option<PathBuf>,
}

impl ResolvedImage {
    pub fn from_file(bytes: Vec<u8>, path: PathBuf) -> Self {
        Self {
            bytes,
            origin: ImageOrigin::File,
            media_path: path,
            staged: None,
        }
    }

    pub fn inline(bytes: Vec<u8>, staged_path: PathBuf) -> Self {
        Self {
            bytes,
            origin: ImageOrigin::Inline,
            media_path: staged_path.clone(),
            staged: Some(staged_path),
        }
    }

    pub fn media_path(&self) -> &Path {
        &self.media_path
    }

    /// Remove the staged temp file, if one is still present.
    ///
    /// Calling this more than once is a no-op. Removal failures are logged
    /// and otherwise ignored.
    pub async fn discard_staged(&mut self) {
        let Some(path) = self.staged.take() else {
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "Removed staged image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove staged image"),
        }
    }
}

/// One entry of the detection API's `data` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Probability (0..1) that the image is synthetic.
    pub is_ai_generated: f64,
    /// Generator name to confidence, in response order.
    #[serde(default)]
    pub possible_sources: IndexMap<String, f64>,
    #[serde(default)]
    pub status: String,
}

/// Outcome reported to the caller through the response sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub text: String,
    pub success: bool,
    /// See [`ResolvedImage::media_path`]. Inline images report their staged
    /// copy, which no longer exists by the time the response is delivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ClassificationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    pub fn success(
        text: impl Into<String>,
        media_path: impl Into<String>,
        result: ClassificationResult,
    ) -> Self {
        Self {
            text: text.into(),
            success: true,
            media_path: Some(media_path.into()),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, media_path: Option<String>) -> Self {
        let error = error.into();
        Self {
            text: format!("Error analyzing image: {error}"),
            success: false,
            media_path,
            result: None,
            error: Some(error),
        }
    }
}
