//! Pipeline error types.

use crate::workflow::StepError;
use thiserror::Error;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A step failed after exhausting its retry policy, or with a
    /// non-retryable error.
    #[error(transparent)]
    Step(#[from] StepError),

    /// The run could not be set up.
    #[error("Invalid pipeline configuration: {0}")]
    Configuration(String),
}

impl PipelineError {
    /// Name of the failed step, if a step failed.
    #[must_use]
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::Step(error) => Some(error.step()),
            Self::Configuration(_) => None,
        }
    }
}
