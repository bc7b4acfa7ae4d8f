//! Config defaults: applies sensible default values to parsed config.

use crate::schema::{DetectionConfig, HiveCheckConfig, LoggingConfig, StorageConfig};
use std::path::PathBuf;

/// NVIDIA-hosted Hive AI-generated image detection endpoint.
pub const DEFAULT_DETECTION_ENDPOINT: &str =
    "https://ai.api.nvidia.com/v1/cv/hive/ai-generated-image-detection";

/// NVCF asset creation endpoint.
pub const DEFAULT_ASSETS_ENDPOINT: &str = "https://api.nvcf.nvidia.com/v2/nvcf/assets";

/// Images whose base64 encoding is at least this long are uploaded as assets.
pub const DEFAULT_INLINE_THRESHOLD: usize = 180_000;

pub const DEFAULT_TEMP_DIR: &str = "temp";

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: HiveCheckConfig) -> HiveCheckConfig {
    let config = apply_detection_defaults(config);
    let config = apply_storage_defaults(config);
    apply_logging_defaults(config)
}

fn apply_detection_defaults(mut config: HiveCheckConfig) -> HiveCheckConfig {
    let detection = config.detection.get_or_insert_with(DetectionConfig::default);
    if detection.endpoint.is_none() {
        detection.endpoint = Some(DEFAULT_DETECTION_ENDPOINT.to_string());
    }
    if detection.assets_endpoint.is_none() {
        detection.assets_endpoint = Some(DEFAULT_ASSETS_ENDPOINT.to_string());
    }
    if detection.inline_threshold.is_none() {
        detection.inline_threshold = Some(DEFAULT_INLINE_THRESHOLD);
    }
    config
}

/// The asset root has no default; it must be configured explicitly.
fn apply_storage_defaults(mut config: HiveCheckConfig) -> HiveCheckConfig {
    let storage = config.storage.get_or_insert_with(StorageConfig::default);
    if storage.temp_dir.is_none() {
        storage.temp_dir = Some(DEFAULT_TEMP_DIR.to_string());
    }
    config
}

fn apply_logging_defaults(mut config: HiveCheckConfig) -> HiveCheckConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.dir.is_none() {
        logging.dir = Some(PathBuf::from(DEFAULT_LOG_DIR));
    }
    config
}
