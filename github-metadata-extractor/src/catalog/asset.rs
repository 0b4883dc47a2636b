use serde::{Deserialize, Serialize};

/// Connector type of assets produced by this crate.
pub const GITHUB_CONNECTOR_TYPE: &str = "github";

/// Root asset that every folder of a run hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Display name.
    pub name: String,
    /// Unique name in the catalog, the parent of every account folder.
    pub qualified_name: String,
    /// Always [`GITHUB_CONNECTOR_TYPE`] for assets built by [`transform`](super::transform).
    pub connector_type: String,
}

/// Folder asset. Used for both accounts and repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Account or repository name.
    pub name: String,
    /// `{parent_qualified_name}/{name}`.
    pub qualified_name: String,
    /// Qualified name of the connection or account folder above this one.
    pub parent_qualified_name: String,
    /// Account bio or repository description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Generic catalog asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "typeName")]
pub enum CatalogAsset {
    Connection(Connection),
    /// Folder of a user or organization, child of the connection.
    AccountFolder(Folder),
    /// Folder of a repository, child of its account folder.
    RepositoryFolder(Folder),
}

impl CatalogAsset {
    /// Qualified name of the asset.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        match self {
            Self::Connection(connection) => &connection.qualified_name,
            Self::AccountFolder(folder) | Self::RepositoryFolder(folder) => &folder.qualified_name,
        }
    }

    /// Display name of the asset.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Connection(connection) => &connection.name,
            Self::AccountFolder(folder) | Self::RepositoryFolder(folder) => &folder.name,
        }
    }
}
