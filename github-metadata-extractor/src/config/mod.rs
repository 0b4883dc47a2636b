//! Settings loading.
//!
//! Settings are read from an optional TOML file. Per-run values such as the
//! account identifier and credentials are not part of it; they are passed to
//! [`PipelineConfig`](crate::PipelineConfig) by the caller.

mod error;
mod settings;

pub use error::ConfigError;
pub use settings::{CatalogSettings, GitHubSettings, OutputSettings, Settings, WorkflowSettings};

use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// Default settings file name.
pub const DEFAULT_SETTINGS_FILE: &str = "extractor.toml";

/// Loads and validates settings from `path`.
///
/// # Errors
///
/// Returns an error if the file is missing, cannot be parsed, or contains
/// invalid values.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(ConfigError::MissingFile { path: display });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: display.clone(),
        source: e,
    })?;
    let settings: Settings = toml::from_str(&content).map_err(|e| ConfigError::TomlError {
        path: display.clone(),
        source: e,
    })?;

    settings.validate(&display)?;
    info!(path = %path.display(), "Loaded settings");
    Ok(settings)
}

impl Settings {
    /// Loads settings from `path` if given, otherwise uses the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file cannot be loaded.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => load_settings(path),
            None => {
                debug!("No settings file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Checks value ranges and URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the offending key.
    pub fn validate(&self, path: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::ValidationError {
            path: path.to_string(),
            message,
        };

        if self.workflow.max_attempts == 0 {
            return Err(invalid("workflow.max-attempts must be at least 1".to_string()));
        }
        let backoff = self.workflow.backoff_coefficient;
        if backoff.is_nan() || backoff < 1.0 {
            return Err(invalid(format!(
                "workflow.backoff-coefficient must be at least 1.0, got {backoff}"
            )));
        }
        if self.workflow.heartbeat_interval_ms == 0 {
            return Err(invalid(
                "workflow.heartbeat-interval-ms must be greater than 0".to_string(),
            ));
        }

        validate_http_url("github.api-base-url", &self.github.api_base_url).map_err(invalid)?;
        if let Some(base_url) = &self.catalog.base_url {
            validate_http_url("catalog.base-url", base_url).map_err(invalid)?;
        }

        Ok(())
    }
}

/// Parses `value` as an absolute http(s) URL.
pub(crate) fn validate_http_url(key: &str, value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| format!("{key} is not a valid URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(format!("{key} must use http or https, got '{scheme}'")),
    }
}
