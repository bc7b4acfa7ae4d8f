use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use hivecheck_config::HiveCheckConfig;
use hivecheck_config::defaults::{
    DEFAULT_ASSETS_ENDPOINT, DEFAULT_DETECTION_ENDPOINT, DEFAULT_INLINE_THRESHOLD,
    DEFAULT_TEMP_DIR,
};

/// Settings injected into the analyzer at construction time.
#[derive(Clone)]
pub struct AnalyzerConfig {
    pub api_key: String,
    pub endpoint: String,
    pub assets_endpoint: String,
    /// Directory that file references are resolved against.
    pub asset_root: PathBuf,
    /// Staging directory name under `asset_root`.
    pub temp_dir: String,
    pub inline_threshold: usize,
}

impl AnalyzerConfig {
    pub fn new(api_key: impl Into<String>, asset_root: impl Into<PathBuf>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_DETECTION_ENDPOINT.to_string(),
            assets_endpoint: DEFAULT_ASSETS_ENDPOINT.to_string(),
            asset_root: asset_root.into(),
            temp_dir: DEFAULT_TEMP_DIR.to_string(),
            inline_threshold: DEFAULT_INLINE_THRESHOLD,
        }
    }

    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    pub fn with_assets_endpoint(mut self, url: impl Into<String>) -> Self {
        self.assets_endpoint = url.into();
        self
    }

    pub fn with_inline_threshold(mut self, threshold: usize) -> Self {
        self.inline_threshold = threshold;
        self
    }

    /// Build from a loaded config; expects `apply_all_defaults` to have run.
    pub fn from_config(config: &HiveCheckConfig) -> Result<Self> {
        let detection = config
            .detection
            .as_ref()
            .context("config has no detection section")?;
        let storage = config
            .storage
            .as_ref()
            .context("config has no storage section")?;

        let api_key = detection
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .context("detection.apiKey is not set")?;
        let asset_root = storage
            .asset_root
            .clone()
            .context("storage.assetRoot is not set")?;

        let mut settings = Self::new(api_key, asset_root);
        if let Some(endpoint) = &detection.endpoint {
            settings.endpoint = endpoint.clone();
        }
        if let Some(assets_endpoint) = &detection.assets_endpoint {
            settings.assets_endpoint = assets_endpoint.clone();
        }
        if let Some(threshold) = detection.inline_threshold {
            settings.inline_threshold = threshold;
        }
        if let Some(temp_dir) = &storage.temp_dir {
            settings.temp_dir = temp_dir.clone();
        }
        Ok(settings)
    }

    /// Where inline images are staged.
    pub fn temp_path(&self) -> PathBuf {
        self.asset_root.join(&self.temp_dir)
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("api_key", &"***")
            .field("endpoint", &self.endpoint)
            .field("assets_endpoint", &self.assets_endpoint)
            .field("asset_root", &self.asset_root)
            .field("temp_dir", &self.temp_dir)
            .field("inline_threshold", &self.inline_threshold)
            .finish()
    }
}
