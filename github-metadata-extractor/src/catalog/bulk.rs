use super::{CatalogAsset, CatalogClient, CatalogError, UploadSummary};
use crate::secrets::SecretStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, info_span, Instrument};
use url::Url;

/// Path of the bulk entity endpoint, relative to the catalog base URL.
const BULK_ENTITY_PATH: &str = "api/meta/entity/bulk";

#[derive(Serialize)]
struct BulkRequest<'a> {
    entities: &'a [CatalogAsset],
}

#[derive(Serialize)]
struct BulkQuery {
    #[serde(rename = "replaceTags")]
    replace_tags: bool,
}

#[derive(Debug, Default, Deserialize)]
struct BulkResponse {
    #[serde(default, rename = "mutatedEntities")]
    mutated_entities: MutatedEntities,
}

#[derive(Debug, Default, Deserialize)]
struct MutatedEntities {
    #[serde(default, rename = "CREATE")]
    create: Vec<serde_json::Value>,
    #[serde(default, rename = "UPDATE")]
    update: Vec<serde_json::Value>,
}

/// Catalog client speaking the JSON bulk entity API.
///
/// The API key is looked up through the [`SecretStore`] on the first upload
/// and cached for the lifetime of the client.
pub struct HttpCatalogClient {
    endpoint: Url,
    api_key_reference: Option<String>,
    secrets: Arc<dyn SecretStore>,
    api_key: OnceCell<Option<String>>,
    http: reqwest::Client,
}

impl HttpCatalogClient {
    /// Creates a client for the catalog at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Configuration`] if the endpoint URL cannot be
    /// derived from `base_url`.
    pub fn new(
        base_url: &Url,
        api_key_reference: Option<String>,
        secrets: Arc<dyn SecretStore>,
    ) -> Result<Self, CatalogError> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(BULK_ENTITY_PATH)
            .map_err(|e| CatalogError::Configuration(e.to_string()))?;

        Ok(Self {
            endpoint,
            api_key_reference,
            secrets,
            api_key: OnceCell::new(),
            http: reqwest::Client::new(),
        })
    }

    /// Returns the bulk upload endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn api_key(&self) -> Result<Option<&str>, CatalogError> {
        let key = self
            .api_key
            .get_or_try_init(|| async {
                match &self.api_key_reference {
                    Some(reference) => {
                        let credentials = self.secrets.get_credentials(reference).await?;
                        Ok::<_, CatalogError>(Some(credentials.token))
                    }
                    None => Ok(None),
                }
            })
            .await?;
        Ok(key.as_deref())
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn save_assets(
        &self,
        assets: &[CatalogAsset],
        replace_tags: bool,
    ) -> Result<UploadSummary, CatalogError> {
        let span = info_span!("save_assets", count = assets.len(), replace_tags);

        async {
            let mut request = self
                .http
                .post(self.endpoint.clone())
                .query(&BulkQuery { replace_tags })
                .json(&BulkRequest { entities: assets });
            if let Some(key) = self.api_key().await? {
                request = request.bearer_auth(key);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CatalogError::Upload {
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.text().await?;
            debug!(bytes = body.len(), "Received catalog response");
            let parsed: BulkResponse = if body.trim().is_empty() {
                BulkResponse::default()
            } else {
                serde_json::from_str(&body).map_err(|e| CatalogError::Upload {
                    status: status.as_u16(),
                    body: format!("Unreadable response: {e}"),
                })?
            };

            let summary = UploadSummary {
                created_count: parsed.mutated_entities.create.len(),
                updated_count: parsed.mutated_entities.update.len(),
            };
            info!(
                created = summary.created_count,
                updated = summary.updated_count,
                "Uploaded assets to catalog"
            );
            Ok(summary)
        }
        .instrument(span)
        .await
    }
}
