use crate::config::Settings;
use crate::sink::SinkKind;
use crate::workflow::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-run configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Account handle to extract.
    identifier: String,
    /// Terminal destination of the run.
    sink: SinkKind,
    /// Whether keyword enrichment and quality metrics run.
    analyze: bool,
    /// Directory for the files sink.
    output_dir: PathBuf,
    /// Display name of the catalog connection asset.
    connection_name: String,
    /// Qualified name of the catalog connection asset.
    connection_qualified_name: String,
    /// Retry policy applied to every step.
    retry_policy: RetryPolicy,
    /// Interval between heartbeats of a running step.
    heartbeat_interval: Duration,
}

impl PipelineConfig {
    /// Creates a configuration for `identifier` with default settings.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self::from_settings(identifier, &Settings::default())
    }

    /// Creates a configuration for `identifier` from loaded settings.
    pub fn from_settings(identifier: impl Into<String>, settings: &Settings) -> Self {
        Self {
            identifier: identifier.into(),
            sink: SinkKind::default(),
            analyze: true,
            output_dir: settings.output.dir.clone(),
            connection_name: settings.catalog.connection_name.clone(),
            connection_qualified_name: settings.catalog.connection_qualified_name.clone(),
            retry_policy: settings.workflow.retry_policy(),
            heartbeat_interval: settings.workflow.heartbeat_interval(),
        }
    }

    /// Sets the terminal destination.
    pub fn with_sink(mut self, sink: SinkKind) -> Self {
        self.sink = sink;
        self
    }

    /// Enables or disables enrichment and quality metrics.
    pub fn with_analysis(mut self, analyze: bool) -> Self {
        self.analyze = analyze;
        self
    }

    /// Sets the directory for the files sink.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Sets the retry policy of every step.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Sets the heartbeat interval of every step.
    pub fn with_heartbeat_interval(mut self, heartbeat_interval: Duration) -> Self {
        self.heartbeat_interval = heartbeat_interval;
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn sink(&self) -> SinkKind {
        self.sink
    }

    pub fn analyze(&self) -> bool {
        self.analyze
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    pub fn connection_qualified_name(&self) -> &str {
        &self.connection_qualified_name
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }
}
