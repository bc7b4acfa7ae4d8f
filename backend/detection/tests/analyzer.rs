use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hivecheck_core::{Action, AnalysisRequest, AnalysisResponse, AnalyzerError, Attachment};
use hivecheck_detection::{AnalyzerConfig, ImageOriginAnalyzer, MockAssetUploader};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DETECT_PATH: &str = "/v1/cv/hive/ai-generated-image-detection";

fn config(server: &MockServer, root: &Path) -> AnalyzerConfig {
    AnalyzerConfig::new("nvapi-test", root).with_endpoint(format!("{}{DETECT_PATH}", server.uri()))
}

fn verdict(probability: f64, sources: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": [{
            "is_ai_generated": probability,
            "possible_sources": sources,
            "status": "SUCCESS"
        }]
    }))
}

fn temp_files(root: &Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(root.join("temp")) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn file_reference_end_to_end() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    tokio::fs::write(root.path().join("portrait.jpg"), b"\xFF\xD8portrait").await.unwrap();

    Mock::given(method("POST"))
        .and(path(DETECT_PATH))
        .and(header("authorization", "Bearer nvapi-test"))
        .respond_with(verdict(0.9994, json!({ "a": 0.2, "b": 0.7, "c": 0.1 })))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = ImageOriginAnalyzer::with_uploader(
        &config(&server, root.path()),
        Arc::new(MockAssetUploader::new("unused")),
    );
    let (tx, mut rx) = mpsc::channel::<AnalysisResponse>(4);

    let response = analyzer
        .handle(&AnalysisRequest::new("Was portrait.jpg made by AI?"), Some(&tx))
        .await
        .unwrap();

    assert!(response.success);
    assert!(response.text.contains("99.94%"), "{}", response.text);
    assert!(response.text.contains("Most likely source: b (70.00% confidence)"));
    assert_eq!(
        response.media_path.as_deref(),
        Some(root.path().join("portrait.jpg").to_str().unwrap())
    );
    assert_eq!(response.result.as_ref().unwrap().status, "SUCCESS");

    let delivered = rx.try_recv().unwrap();
    assert_eq!(delivered, response);
}

#[tokio::test]
async fn inline_image_is_sent_inline_and_staging_cleaned() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    let bytes = b"\xFF\xD8\xFFinline-jpeg".to_vec();
    let b64 = STANDARD.encode(&bytes);

    Mock::given(method("POST"))
        .and(path(DETECT_PATH))
        .and(body_json(json!({ "input": [format!("data:image/jpeg;base64,{b64}")] })))
        .respond_with(verdict(0.12, json!({ "none": 1.0 })))
        .expect(1)
        .mount(&server)
        .await;

    let uploader = Arc::new(MockAssetUploader::new("unused"));
    let analyzer = ImageOriginAnalyzer::with_uploader(&config(&server, root.path()), uploader.clone());

    let request = AnalysisRequest::new(format!("data:image/png;base64,{b64}"));
    let response = analyzer.handle(&request, None).await.unwrap();

    assert!(response.text.contains("No specific AI source identified"));
    assert_eq!(uploader.calls(), 0);
    assert!(temp_files(root.path()).is_empty());

    // Inline images report their staged copy, already removed.
    let media_path = std::path::PathBuf::from(response.media_path.unwrap());
    assert!(media_path.starts_with(root.path().join("temp")));
    assert!(!media_path.exists());
}

#[tokio::test]
async fn tied_sources_report_the_first_listed() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    tokio::fs::write(root.path().join("cat.jpg"), b"jpeg").await.unwrap();

    Mock::given(method("POST"))
        .and(path(DETECT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"data":[{"is_ai_generated":0.8,"possible_sources":{"zeta":0.4,"alpha":0.4},"status":"SUCCESS"}]}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = ImageOriginAnalyzer::with_uploader(
        &config(&server, root.path()),
        Arc::new(MockAssetUploader::new("unused")),
    );

    let response = analyzer
        .handle(&AnalysisRequest::new("cat.jpg"), None)
        .await
        .unwrap();

    assert!(
        response.text.contains("Most likely source: zeta (40.00% confidence)"),
        "{}",
        response.text
    );
}

#[tokio::test]
async fn large_inline_image_goes_through_asset_upload() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    let bytes = vec![0xABu8; 135_000];

    Mock::given(method("POST"))
        .and(path(DETECT_PATH))
        .and(header("NVCF-INPUT-ASSET-REFERENCES", "asset-big"))
        .and(body_json(json!({ "input": ["data:image/jpeg;asset_id,asset-big"] })))
        .respond_with(verdict(0.5, json!({ "sdxl": 0.5 })))
        .expect(1)
        .mount(&server)
        .await;

    let uploader = Arc::new(MockAssetUploader::new("asset-big"));
    let analyzer = ImageOriginAnalyzer::with_uploader(&config(&server, root.path()), uploader.clone());

    let request = AnalysisRequest::new("attached").with_attachment(Attachment::new(
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&bytes)),
        "image/jpeg",
    ));
    let response = analyzer.handle(&request, None).await.unwrap();

    assert!(response.success);
    assert_eq!(uploader.calls(), 1);
    assert_eq!(uploader.last_upload_len(), Some(135_000));
    assert!(temp_files(root.path()).is_empty());
}

#[tokio::test]
async fn missing_file_fails_before_any_remote_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(verdict(0.5, json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let uploader = Arc::new(MockAssetUploader::new("unused"));
    let analyzer = ImageOriginAnalyzer::with_uploader(&config(&server, root.path()), uploader.clone());
    let (tx, mut rx) = mpsc::channel::<AnalysisResponse>(4);

    let err = analyzer
        .handle(&AnalysisRequest::new("check missing.png"), Some(&tx))
        .await
        .unwrap_err();

    assert!(matches!(err, AnalyzerError::FileNotFound { .. }));
    assert_eq!(uploader.calls(), 0);
    assert!(server.received_requests().await.unwrap().is_empty());

    let delivered = rx.try_recv().unwrap();
    assert!(!delivered.success);
    assert!(delivered.error.unwrap().contains("missing.png"));
}

#[tokio::test]
async fn api_failure_notifies_sink_and_raises() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    tokio::fs::write(root.path().join("cat.jpg"), b"jpeg").await.unwrap();

    Mock::given(method("POST"))
        .and(path(DETECT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = ImageOriginAnalyzer::with_uploader(
        &config(&server, root.path()),
        Arc::new(MockAssetUploader::new("unused")),
    );
    let (tx, mut rx) = mpsc::channel::<AnalysisResponse>(4);

    let err = analyzer
        .handle(&AnalysisRequest::new("cat.jpg"), Some(&tx))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::ApiError(_)));

    let delivered = rx.try_recv().unwrap();
    assert!(!delivered.success);
    let message = delivered.error.unwrap();
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("upstream exploded"), "{message}");
    assert!(delivered.media_path.unwrap().ends_with("cat.jpg"));
}

#[tokio::test]
async fn empty_text_is_rejected_without_side_effects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(verdict(0.5, json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let analyzer = ImageOriginAnalyzer::with_uploader(
        &config(&server, root.path()),
        Arc::new(MockAssetUploader::new("unused")),
    );
    let (tx, mut rx) = mpsc::channel::<AnalysisResponse>(4);

    for request in [AnalysisRequest::default(), AnalysisRequest::new("  ")] {
        assert!(!analyzer.validate(&request).await);
        let err = analyzer.handle(&request, Some(&tx)).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::ValidationFailed(_)));
    }
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn closed_sink_on_success_is_network_error() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    tokio::fs::write(root.path().join("cat.jpg"), b"jpeg").await.unwrap();
    Mock::given(method("POST"))
        .respond_with(verdict(0.3, json!({ "none": 0.9 })))
        .mount(&server)
        .await;

    let analyzer = ImageOriginAnalyzer::with_uploader(
        &config(&server, root.path()),
        Arc::new(MockAssetUploader::new("unused")),
    );
    let (tx, rx) = mpsc::channel::<AnalysisResponse>(1);
    drop(rx);

    let err = analyzer
        .handle(&AnalysisRequest::new("cat.jpg"), Some(&tx))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::NetworkError(_)));
}
