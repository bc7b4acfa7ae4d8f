//! HiveCheck runtime configuration schema.
//!
//! Every section is optional in the file; `defaults::apply_all_defaults`
//! fills what the user left out.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveCheckConfig {
    /// Remote detection API settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionConfig>,

    /// Where referenced images live and where inline images are staged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionConfig {
    /// Bearer token for the detection and asset APIs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// NVCF asset creation endpoint used for large images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets_endpoint: Option<String>,

    /// Base64 length at which images are uploaded instead of inlined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_threshold: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_root: Option<PathBuf>,

    /// Staging directory name, relative to `asset_root`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset (e.g. "info", "hivecheck_detection=debug")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
detection:
  apiKey: nvapi-abc
  inlineThreshold: 1000
storage:
  assetRoot: /srv/assets
  tempDir: staging
logging:
  level: debug
"#;
        let config: HiveCheckConfig = serde_yaml::from_str(yaml).unwrap();
        let detection = config.detection.unwrap();
        assert_eq!(detection.api_key.as_deref(), Some("nvapi-abc"));
        assert_eq!(detection.inline_threshold, Some(1000));
        let storage = config.storage.unwrap();
        assert_eq!(storage.asset_root, Some(PathBuf::from("/srv/assets")));
        assert_eq!(storage.temp_dir.as_deref(), Some("staging"));
        assert_eq!(config.logging.unwrap().level.as_deref(), Some("debug"));
    }

    #[test]
    fn empty_yaml_is_default() {
        let config: HiveCheckConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.detection.is_none());
        assert!(config.storage.is_none());
    }
}
