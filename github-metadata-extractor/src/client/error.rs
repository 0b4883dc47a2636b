//! API client error types.

use crate::secrets::SecretError;
use crate::workflow::Retryable;
use thiserror::Error;

/// Errors that can occur while talking to the GitHub API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured token could not be retrieved.
    #[error("Failed to retrieve GitHub credentials: {0}")]
    Credential(#[from] SecretError),

    /// The API answered with a client or server error status.
    #[error("GitHub API returned HTTP {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    /// The request failed before a status was received, or the response
    /// could not be decoded.
    #[error("GitHub API transport error: {0}")]
    UpstreamTransport(String),

    /// The HTTP client could not be constructed.
    #[error("Invalid GitHub client configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Returns the upstream HTTP status, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<octocrab::Error> for ClientError {
    fn from(error: octocrab::Error) -> Self {
        match error {
            octocrab::Error::GitHub { source, .. } => Self::UpstreamHttp {
                status: source.status_code.as_u16(),
                body: source.message.clone(),
            },
            // The Display of octocrab errors appends a backtrace; the source
            // carries the message alone.
            other => Self::UpstreamTransport(
                std::error::Error::source(&other)
                    .map_or_else(|| other.to_string(), |source| source.to_string()),
            ),
        }
    }
}

impl Retryable for ClientError {
    fn is_retryable(&self) -> bool {
        !matches!(self, Self::Credential(_) | Self::Configuration(_))
    }
}
