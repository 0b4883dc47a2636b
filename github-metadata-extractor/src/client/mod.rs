//! GitHub REST API client.
//!
//! This module fetches account profiles and paginated repository listings and
//! normalizes them into [`AccountMetadata`] and [`RepositoryMetadata`].
//! The client never retries on its own; retries belong to the step executor.

mod error;
mod models;

pub use error::ClientError;
pub use models::{AccountMetadata, RepositoryMetadata, DEFAULT_BIO, NOT_AVAILABLE};

use crate::secrets::{CredentialSource, SecretStore};
use async_trait::async_trait;
use http::header::AUTHORIZATION;
use models::{RawAccount, RawRepository};
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, info_span, Instrument};
use url::Url;

/// Public GitHub API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Page size used when listing repositories.
pub const REPOSITORIES_PER_PAGE: u32 = 100;

/// Source of account and repository metadata.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetches the profile of a user or organization.
    async fn fetch_account(&self, identifier: &str) -> Result<AccountMetadata, ClientError>;

    /// Fetches every public repository of a user or organization, in
    /// upstream order.
    async fn fetch_repositories(
        &self,
        identifier: &str,
    ) -> Result<Vec<RepositoryMetadata>, ClientError>;
}

/// Longest login GitHub accepts.
pub const MAX_LOGIN_LENGTH: usize = 39;

/// Returns `true` if `identifier` is a well-formed GitHub login: 1 to 39
/// ASCII alphanumerics or hyphens.
///
/// Identifiers end up in API paths and output file names, so anything else
/// is rejected before it reaches either.
#[must_use]
pub fn is_valid_login(identifier: &str) -> bool {
    (1..=MAX_LOGIN_LENGTH).contains(&identifier.len())
        && identifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// GitHub API client with a lazily authenticated connection.
///
/// The token is resolved on first use and the underlying connection is then
/// reused for the lifetime of the instance.
pub struct GitHubClient {
    base_url: Url,
    credential: CredentialSource,
    secrets: Arc<dyn SecretStore>,
    octocrab: OnceCell<Octocrab>,
}

impl GitHubClient {
    /// Creates a client for the API at `base_url`.
    pub fn new(base_url: Url, credential: CredentialSource, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            base_url,
            credential,
            secrets,
            octocrab: OnceCell::new(),
        }
    }

    /// Returns the authenticated connection, creating it on first call.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Credential`] if a referenced token cannot be
    /// retrieved. No request is sent in that case.
    async fn octocrab(&self) -> Result<&Octocrab, ClientError> {
        self.octocrab
            .get_or_try_init(|| async {
                let token = self.credential.resolve(self.secrets.as_ref()).await?;
                build_octocrab(&self.base_url, token.as_deref())
            })
            .await
    }

    /// Sends a GET for `path` and decodes a successful JSON response.
    ///
    /// Any non-2xx status becomes [`ClientError::UpstreamHttp`] carrying the
    /// raw response body, whatever its content type.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let octocrab = self.octocrab().await?;
        let response = octocrab._get(path).await?;
        let status = response.status();
        let body = octocrab.body_to_string(response).await?;

        if !status.is_success() {
            return Err(ClientError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            ClientError::UpstreamTransport(format!("Invalid response body for {path}: {e}"))
        })
    }
}

/// Rejects identifiers that cannot be placed in an API path as-is.
fn check_login(identifier: &str) -> Result<(), ClientError> {
    if is_valid_login(identifier) {
        Ok(())
    } else {
        Err(ClientError::Configuration(format!(
            "'{identifier}' is not a valid GitHub login"
        )))
    }
}

/// Builds an octocrab instance without built-in retries.
fn build_octocrab(base_url: &Url, token: Option<&str>) -> Result<Octocrab, ClientError> {
    let mut builder = Octocrab::builder()
        .base_uri(base_url.as_str())
        .map_err(|e| ClientError::Configuration(e.to_string()))?
        .add_retry_config(RetryConfig::None);

    if let Some(token) = token {
        info!("Using token for GitHub API authentication");
        builder = builder.add_header(AUTHORIZATION, format!("token {token}"));
    } else {
        info!("No token configured, using unauthenticated GitHub API access");
    }

    builder
        .build()
        .map_err(|e| ClientError::Configuration(e.to_string()))
}

#[async_trait]
impl MetadataSource for GitHubClient {
    async fn fetch_account(&self, identifier: &str) -> Result<AccountMetadata, ClientError> {
        let span = info_span!("fetch_account", identifier);

        async {
            check_login(identifier)?;
            let raw: RawAccount = self.get_json(&format!("/users/{identifier}")).await?;
            debug!("Fetched account profile");
            Ok(AccountMetadata::from(raw))
        }
        .instrument(span)
        .await
    }

    async fn fetch_repositories(
        &self,
        identifier: &str,
    ) -> Result<Vec<RepositoryMetadata>, ClientError> {
        let span = info_span!("fetch_repositories", identifier);

        async {
            check_login(identifier)?;
            let mut repositories = Vec::new();
            let mut page: u32 = 1;

            loop {
                let path = format!(
                    "/users/{identifier}/repos?page={page}&per_page={REPOSITORIES_PER_PAGE}"
                );
                let batch: Vec<RawRepository> = self.get_json(&path).await?;
                if batch.is_empty() {
                    break;
                }

                debug!(page, count = batch.len(), "Fetched repository page");
                repositories.extend(batch.into_iter().map(RepositoryMetadata::from));
                page += 1;
            }

            info!(count = repositories.len(), pages = page - 1, "Fetched repositories");
            Ok(repositories)
        }
        .instrument(span)
        .await
    }
}
