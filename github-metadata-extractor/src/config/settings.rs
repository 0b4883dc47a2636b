//! Settings deserialization.

use crate::catalog::{DEFAULT_CONNECTION_NAME, DEFAULT_CONNECTION_QUALIFIED_NAME};
use crate::client::DEFAULT_API_BASE_URL;
use crate::workflow::RetryPolicy;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Parsed contents of an `extractor.toml` file.
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    pub github: GitHubSettings,
    pub workflow: WorkflowSettings,
    pub catalog: CatalogSettings,
    pub output: OutputSettings,
}

/// `[github]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct GitHubSettings {
    pub api_base_url: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// `[workflow]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct WorkflowSettings {
    pub max_attempts: u32,
    pub backoff_coefficient: f64,
    pub initial_interval_ms: u64,
    pub heartbeat_interval_ms: u64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            backoff_coefficient: 2.0,
            initial_interval_ms: 1_000,
            heartbeat_interval_ms: 10_000,
        }
    }
}

impl WorkflowSettings {
    /// Retry policy applied to every step.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_coefficient: self.backoff_coefficient,
            initial_interval: Duration::from_millis(self.initial_interval_ms),
            ..RetryPolicy::default()
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

/// `[catalog]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CatalogSettings {
    /// Catalog endpoint. Required only for the catalog sink.
    pub base_url: Option<String>,
    /// Secret reference of the catalog API key.
    pub api_key_reference: Option<String>,
    pub connection_name: String,
    pub connection_qualified_name: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_reference: None,
            connection_name: DEFAULT_CONNECTION_NAME.to_string(),
            connection_qualified_name: DEFAULT_CONNECTION_QUALIFIED_NAME.to_string(),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputSettings {
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}
