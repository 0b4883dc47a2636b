//! Credential retrieval.
//!
//! A [`SecretStore`] turns a reference (for example a credential GUID handed
//! to the HTTP trigger) into a [`Credentials`] bundle. Runs never read
//! credentials from process-wide state; each run carries its own
//! [`CredentialSource`].

mod error;

pub use error::SecretError;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// A credential bundle returned by a [`SecretStore`].
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// API token.
    pub token: String,
}

impl Credentials {
    /// Creates a bundle holding the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Looks up credential bundles by reference.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the credentials stored under `reference`.
    async fn get_credentials(&self, reference: &str) -> Result<Credentials, SecretError>;
}

/// Where a run obtains its API token from.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum CredentialSource {
    /// Unauthenticated access.
    #[default]
    None,
    /// A token supplied inline.
    Token(String),
    /// A reference resolved through a [`SecretStore`].
    Reference(String),
}

impl CredentialSource {
    /// Resolves the token, consulting `store` only for [`CredentialSource::Reference`].
    pub async fn resolve(&self, store: &dyn SecretStore) -> Result<Option<String>, SecretError> {
        match self {
            Self::None => Ok(None),
            Self::Token(token) => Ok(Some(token.clone())),
            Self::Reference(reference) => {
                debug!(reference = %reference, "Resolving credential reference");
                let credentials = store.get_credentials(reference).await?;
                if credentials.token.trim().is_empty() {
                    return Err(SecretError::MissingToken {
                        reference: reference.clone(),
                    });
                }
                Ok(Some(credentials.token))
            }
        }
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::Reference(reference) => f.debug_tuple("Reference").field(reference).finish(),
        }
    }
}

/// Resolves references against environment variables.
///
/// The reference is upper-cased and every character outside `[A-Z0-9_]` is
/// replaced by `_`, so `github-pat` reads `GITHUB_PAT`. The variable holds
/// either the raw token or a JSON bundle such as `{"token": "..."}`.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    prefix: Option<String>,
}

impl EnvSecretStore {
    /// Creates a store reading variables named after the reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `prefix` to every variable name.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Returns the environment variable consulted for `reference`.
    pub fn variable_name(&self, reference: &str) -> String {
        let normalized: String = reference
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        match &self.prefix {
            Some(prefix) => format!("{prefix}{normalized}"),
            None => normalized,
        }
    }

    /// Synchronous lookup backing [`SecretStore::get_credentials`].
    pub fn lookup(&self, reference: &str) -> Result<Credentials, SecretError> {
        let variable = self.variable_name(reference);
        let value = std::env::var(&variable).map_err(|_| SecretError::NotFound {
            reference: reference.to_string(),
        })?;
        parse_bundle(reference, &value)
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_credentials(&self, reference: &str) -> Result<Credentials, SecretError> {
        self.lookup(reference)
    }
}

/// Decodes a stored value as either a JSON bundle or a bare token.
fn parse_bundle(reference: &str, value: &str) -> Result<Credentials, SecretError> {
    let trimmed = value.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str(trimmed).map_err(|source| SecretError::Malformed {
            reference: reference.to_string(),
            source,
        });
    }
    if trimmed.is_empty() {
        return Err(SecretError::MissingToken {
            reference: reference.to_string(),
        });
    }
    Ok(Credentials::new(trimmed))
}

/// In-memory store, handy for inline tokens and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, Credentials>,
}

impl StaticSecretStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token under `reference`.
    #[must_use]
    pub fn with_token(mut self, reference: impl Into<String>, token: impl Into<String>) -> Self {
        self.secrets
            .insert(reference.into(), Credentials::new(token));
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_credentials(&self, reference: &str) -> Result<Credentials, SecretError> {
        self.secrets
            .get(reference)
            .cloned()
            .ok_or_else(|| SecretError::NotFound {
                reference: reference.to_string(),
            })
    }
}
