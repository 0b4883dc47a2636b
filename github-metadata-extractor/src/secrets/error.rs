//! Secret lookup error types.

use thiserror::Error;

/// Errors that can occur while resolving credentials.
#[derive(Debug, Error)]
pub enum SecretError {
    /// No secret is stored under the reference.
    #[error("No secret found for reference '{reference}'")]
    NotFound { reference: String },

    /// The secret exists but holds no usable token.
    #[error("Secret '{reference}' does not contain a token")]
    MissingToken { reference: String },

    /// The secret could not be decoded as a credential bundle.
    #[error("Secret '{reference}' is not a valid credential bundle: {source}")]
    Malformed {
        reference: String,
        #[source]
        source: serde_json::Error,
    },
}
