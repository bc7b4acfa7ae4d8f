use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::AnalyzerError;
use crate::types::{AnalysisRequest, AnalysisResponse};

/// An action the host runtime can dispatch a chat message to.
#[async_trait]
pub trait Action: Send + Sync {
    /// Unique action name (e.g., "DETECT_AI_IMAGE").
    fn name(&self) -> &str;

    /// Description for the LLM prompt.
    fn description(&self) -> &str;

    /// Alternative names the host may match on.
    fn similes(&self) -> &[&str] {
        &[]
    }

    /// Cheap syntactic check run before `handle`.
    async fn validate(&self, request: &AnalysisRequest) -> bool;

    /// Run the action, reporting the outcome to `sink` on both success and failure.
    async fn handle(
        &self,
        request: &AnalysisRequest,
        sink: Option<&dyn ResponseSink>,
    ) -> Result<AnalysisResponse, AnalyzerError>;
}

/// Receives the final response of an action (the host's result callback).
#[async_trait]
pub trait ResponseSink: Send + Sync {
    async fn deliver(&self, response: AnalysisResponse) -> Result<()>;
}

#[async_trait]
impl ResponseSink for mpsc::Sender<AnalysisResponse> {
    async fn deliver(&self, response: AnalysisResponse) -> Result<()> {
        self.send(response)
            .await
            .map_err(|_| anyhow::anyhow!("response channel closed"))
    }
}

/// Uploads raw bytes to remote storage and returns an opaque asset id.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(&self, bytes: &[u8], content_type: &str, description: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_delivers() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.deliver(AnalysisResponse::failure("x", None)).await.unwrap();
        let got = rx.recv().await.unwrap();
        assert!(!got.success);
    }

    #[tokio::test]
    async fn closed_channel_sink_errors() {
        let (tx, rx) = mpsc::channel::<AnalysisResponse>(1);
        drop(rx);
        assert!(tx.deliver(AnalysisResponse::failure("x", None)).await.is_err());
    }
}
