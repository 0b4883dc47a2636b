//! Request and response bodies of the HTTP trigger.

use crate::metrics::QualityMetrics;
use crate::sink::{SinkKind, SinkOutcome};
use crate::workflow::StepRecord;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/start_extraction`.
///
/// `username`, `credential_guid` and `pat` are accepted as aliases of
/// `identifier`, `credential_reference` and `token`.
#[derive(Debug, Clone, Deserialize)]
pub struct StartExtractionRequest {
    #[serde(alias = "username")]
    pub identifier: String,
    #[serde(default, alias = "credential_guid")]
    pub credential_reference: Option<String>,
    #[serde(default, alias = "pat")]
    pub token: Option<String>,
    /// Defaults to the files sink.
    #[serde(default)]
    pub sink: Option<SinkKind>,
    /// Defaults to `true`.
    #[serde(default)]
    pub analyze: Option<bool>,
}

/// Response of `POST /api/start_extraction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StartExtractionResponse {
    Started { workflow_id: String },
    Failed { error: String },
}

/// State of a run started through the HTTP trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed {
        repositories: usize,
        metrics: Option<QualityMetrics>,
        sink: SinkOutcome,
        steps: Vec<StepRecord>,
    },
    Failed {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<String>,
    },
}

impl RunStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}
