//! Step execution error types.

use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// Boxed error produced by a step's operation.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors returned by [`StepExecutor::execute`](super::StepExecutor::execute).
#[derive(Debug, Error)]
pub enum StepError {
    /// Every attempt of the step ran past its timeout.
    #[error("Step '{step}' timed out after {timeout:?} ({attempts} attempt(s))")]
    TimeoutExceeded {
        step: String,
        timeout: Duration,
        attempts: u32,
    },

    /// The step kept failing until the retry policy gave up.
    #[error("Step '{step}' failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        step: String,
        attempts: u32,
        #[source]
        source: BoxError,
    },

    /// The step failed with an error that must not be retried.
    #[error("Step '{step}' failed: {source}")]
    NonRetryable {
        step: String,
        #[source]
        source: BoxError,
    },
}

impl StepError {
    /// Name of the step that failed.
    #[must_use]
    pub fn step(&self) -> &str {
        match self {
            Self::TimeoutExceeded { step, .. }
            | Self::RetriesExhausted { step, .. }
            | Self::NonRetryable { step, .. } => step,
        }
    }

    /// Returns the underlying operation error if it is of type `E`.
    #[must_use]
    pub fn downcast_source<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::TimeoutExceeded { .. } => None,
            Self::RetriesExhausted { source, .. } | Self::NonRetryable { source, .. } => {
                source.downcast_ref::<E>()
            }
        }
    }
}

/// Classifies an operation error for the retry loop.
pub trait Retryable {
    /// Whether another attempt could succeed.
    fn is_retryable(&self) -> bool {
        true
    }
}

impl Retryable for std::convert::Infallible {}

impl Retryable for tokio::task::JoinError {
    fn is_retryable(&self) -> bool {
        false
    }
}
