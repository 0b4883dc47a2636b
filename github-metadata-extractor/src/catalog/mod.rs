//! Catalog assets and upload.
//!
//! Extracted metadata is mapped onto a three-level hierarchy of generic
//! assets (connection, account folder, repository folders) by [`transform`]
//! and uploaded through a [`CatalogClient`].

mod asset;
mod bulk;
mod error;
mod transform;

pub use asset::{CatalogAsset, Connection, Folder, GITHUB_CONNECTOR_TYPE};
pub use bulk::HttpCatalogClient;
pub use error::CatalogError;
pub use transform::transform;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default display name of the connection asset.
pub const DEFAULT_CONNECTION_NAME: &str = "GitHub API";

/// Default qualified name of the connection asset.
pub const DEFAULT_CONNECTION_QUALIFIED_NAME: &str = "default/github/user_example";

/// Counts reported by the catalog after an upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    /// Assets the catalog reported as created.
    pub created_count: usize,
    /// Assets the catalog reported as updated.
    pub updated_count: usize,
}

/// Destination for catalog assets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Saves `assets` in one batch. Uploads are not rolled back on later
    /// failures of the run.
    async fn save_assets(
        &self,
        assets: &[CatalogAsset],
        replace_tags: bool,
    ) -> Result<UploadSummary, CatalogError>;
}
