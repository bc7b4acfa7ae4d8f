//! AI-generated image detection.
//!
//! Resolves an image from a chat request (inline data URI or a file under
//! the asset root), submits it to the Hive detector hosted on NVIDIA's API
//! catalog, and formats the verdict for the chat.

pub mod analyzer;
pub mod assets;
pub mod client;
pub mod config;
pub mod data_uri;
pub mod resolve;
pub mod summary;

pub use analyzer::ImageOriginAnalyzer;
pub use assets::{MockAssetUploader, NvcfAssetUploader};
pub use client::{DetectionClient, PreparedRequest, TransmissionMode};
pub use config::AnalyzerConfig;
pub use data_uri::{DataUri, find_data_uri, find_file_reference};
pub use resolve::ImageResolver;
pub use summary::{summarize, top_source};
