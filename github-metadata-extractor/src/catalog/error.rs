//! Catalog error types.

use crate::secrets::SecretError;
use crate::workflow::Retryable;
use thiserror::Error;

/// Errors that can occur while uploading assets to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog rejected the upload.
    #[error("Catalog upload failed with HTTP {status}: {body}")]
    Upload { status: u16, body: String },

    /// The request could not be sent or the response could not be read.
    #[error("Catalog transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The catalog API key could not be retrieved.
    #[error("Failed to retrieve catalog credentials: {0}")]
    Credential(#[from] SecretError),

    /// The catalog endpoint is not configured or invalid.
    #[error("Invalid catalog configuration: {0}")]
    Configuration(String),
}

impl Retryable for CatalogError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Upload { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::Transport(_) => true,
            Self::Credential(_) | Self::Configuration(_) => false,
        }
    }
}
