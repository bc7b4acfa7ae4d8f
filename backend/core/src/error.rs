use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for an image-origin analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("image file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("detection API error: {0:#}")]
    ApiError(#[source] anyhow::Error),

    #[error("network error: {0:#}")]
    NetworkError(#[source] anyhow::Error),
}

impl AnalyzerError {
    /// Short machine-readable kind, used in logged events.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyzerError::ValidationFailed(_) => "validation_failed",
            AnalyzerError::FileNotFound { .. } => "file_not_found",
            AnalyzerError::ApiError(_) => "api_error",
            AnalyzerError::NetworkError(_) => "network_error",
        }
    }
}
