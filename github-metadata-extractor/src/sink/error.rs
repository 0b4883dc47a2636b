//! Sink error types.

use crate::catalog::CatalogError;
use crate::workflow::Retryable;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing run output.
#[derive(Debug, Error)]
pub enum SinkError {
    /// An output file could not be written.
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized.
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The catalog upload failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl Retryable for SinkError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Io { .. } => true,
            Self::Serialize(_) => false,
            Self::Catalog(error) => error.is_retryable(),
        }
    }
}
