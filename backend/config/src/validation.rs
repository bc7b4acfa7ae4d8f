//! Config validation: schema checks with user-friendly error messages.

use crate::schema::HiveCheckConfig;
use thiserror::Error;

/// Inline payloads above this size are almost certainly a misconfiguration.
const MAX_SENSIBLE_INLINE_THRESHOLD: usize = 10 * 1024 * 1024;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &HiveCheckConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_detection(config, &mut report);
    validate_storage(config, &mut report);
    report
}

fn validate_detection(config: &HiveCheckConfig, report: &mut ValidationReport) {
    let Some(detection) = &config.detection else {
        report.error("detection", "Detection section is missing");
        return;
    };

    if detection.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        report.error("detection.apiKey", "API key is required");
    }

    for (path, url) in [
        ("detection.endpoint", &detection.endpoint),
        ("detection.assetsEndpoint", &detection.assets_endpoint),
    ] {
        if let Some(url) = url {
            if !url.starts_with("https://") {
                report.warn(path, format!("'{url}' is not an https URL; the API key is sent in clear"));
            }
        }
    }

    match detection.inline_threshold {
        Some(0) => report.error(
            "detection.inlineThreshold",
            "Threshold must be greater than zero",
        ),
        Some(n) if n > MAX_SENSIBLE_INLINE_THRESHOLD => report.warn(
            "detection.inlineThreshold",
            format!("Threshold {n} exceeds {MAX_SENSIBLE_INLINE_THRESHOLD}; large inline bodies may be rejected"),
        ),
        _ => {}
    }
}

fn validate_storage(config: &HiveCheckConfig, report: &mut ValidationReport) {
    let asset_root = config.storage.as_ref().and_then(|s| s.asset_root.as_ref());
    if asset_root.is_none() {
        report.error("storage.assetRoot", "Asset root directory is required");
    }
    if let Some(temp_dir) = config.storage.as_ref().and_then(|s| s.temp_dir.as_deref()) {
        if temp_dir.contains("..") {
            report.error("storage.tempDir", "Temp dir must stay inside the asset root");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::apply_all_defaults;
    use crate::schema::{DetectionConfig, StorageConfig};

    fn valid_config() -> HiveCheckConfig {
        apply_all_defaults(HiveCheckConfig {
            detection: Some(DetectionConfig {
                api_key: Some("nvapi-abc".into()),
                ..Default::default()
            }),
            storage: Some(StorageConfig {
                asset_root: Some("/srv/assets".into()),
                temp_dir: None,
            }),
            logging: None,
        })
    }

    #[test]
    fn valid_config_passes() {
        let report = validate(&valid_config());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn zero_threshold_is_error() {
        let mut config = valid_config();
        config.detection.as_mut().unwrap().inline_threshold = Some(0);
        let report = validate(&config);
        assert!(report.errors.iter().any(|e| e.path == "detection.inlineThreshold"));
    }

    #[test]
    fn plain_http_endpoint_warns() {
        let mut config = valid_config();
        config.detection.as_mut().unwrap().endpoint = Some("http://localhost:9000/detect".into());
        let report = validate(&config);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.path == "detection.endpoint"));
    }

    #[test]
    fn missing_asset_root_is_error() {
        let mut config = valid_config();
        config.storage = None;
        let report = validate(&config);
        assert!(report.errors.iter().any(|e| e.path == "storage.assetRoot"));
    }
}
