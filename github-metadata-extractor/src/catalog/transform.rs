use super::asset::{CatalogAsset, Connection, Folder, GITHUB_CONNECTOR_TYPE};
use crate::client::{AccountMetadata, RepositoryMetadata};
use tracing::warn;

/// Maps extracted metadata onto catalog assets.
///
/// The returned list starts with the connection, followed by the account
/// folder and one folder per repository in input order. Without an account
/// (or with an account whose name is empty) only the connection is emitted
/// and the repositories are dropped.
#[must_use]
pub fn transform(
    account: Option<&AccountMetadata>,
    repositories: &[RepositoryMetadata],
    connection_name: &str,
    connection_qualified_name: &str,
) -> Vec<CatalogAsset> {
    let mut assets = Vec::with_capacity(repositories.len() + 2);
    assets.push(CatalogAsset::Connection(Connection {
        name: connection_name.to_string(),
        qualified_name: connection_qualified_name.to_string(),
        connector_type: GITHUB_CONNECTOR_TYPE.to_string(),
    }));

    let Some(account) = account.filter(|a| !a.name.is_empty()) else {
        warn!(
            skipped_repositories = repositories.len(),
            "No account metadata, emitting connection only"
        );
        return assets;
    };

    let account_qualified_name = format!("{connection_qualified_name}/{}", account.name);
    assets.push(CatalogAsset::AccountFolder(Folder {
        name: account.name.clone(),
        qualified_name: account_qualified_name.clone(),
        parent_qualified_name: connection_qualified_name.to_string(),
        description: Some(account.bio.clone()),
    }));

    assets.extend(repositories.iter().map(|repository| {
        CatalogAsset::RepositoryFolder(Folder {
            name: repository.name.clone(),
            qualified_name: format!("{account_qualified_name}/{}", repository.name),
            parent_qualified_name: account_qualified_name.clone(),
            description: repository.description.clone(),
        })
    }));

    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::NOT_AVAILABLE;

    const CONNECTION: &str = "default/github/user_example";

    fn account(name: &str) -> AccountMetadata {
        let na = || NOT_AVAILABLE.to_string();
        AccountMetadata {
            name: name.to_string(),
            node_id: na(),
            profile_url: na(),
            avatar_url: na(),
            bio: "Builds things".to_string(),
            account_type: "User".to_string(),
            company: na(),
            location: na(),
            email: na(),
            blog: na(),
            twitter_username: na(),
            created_at: na(),
            followers: 0,
            following: 0,
            followers_url: na(),
            following_url: na(),
            public_repos: 0,
            public_gists: 0,
        }
    }

    fn repository(name: &str, description: Option<&str>) -> RepositoryMetadata {
        RepositoryMetadata {
            name: name.to_string(),
            description: description.map(str::to_string),
            language: None,
            star_count: 0,
            fork_count: 0,
            issue_count: 0,
            created_at: NOT_AVAILABLE.to_string(),
            updated_at: NOT_AVAILABLE.to_string(),
            url: NOT_AVAILABLE.to_string(),
            auto_tags: None,
        }
    }

    #[test]
    fn builds_connection_account_and_repository_hierarchy() {
        let repositories = [repository("alpha", Some("First")), repository("beta", None)];

        let assets = transform(Some(&account("octocat")), &repositories, "GitHub API", CONNECTION);

        let names: Vec<_> = assets.iter().map(CatalogAsset::qualified_name).collect();
        assert_eq!(
            names,
            [
                CONNECTION,
                "default/github/user_example/octocat",
                "default/github/user_example/octocat/alpha",
                "default/github/user_example/octocat/beta",
            ]
        );

        let CatalogAsset::AccountFolder(folder) = &assets[1] else {
            panic!("expected account folder, got {:?}", assets[1]);
        };
        assert_eq!(folder.parent_qualified_name, CONNECTION);
        assert_eq!(folder.description.as_deref(), Some("Builds things"));

        let CatalogAsset::RepositoryFolder(folder) = &assets[2] else {
            panic!("expected repository folder, got {:?}", assets[2]);
        };
        assert_eq!(folder.parent_qualified_name, "default/github/user_example/octocat");
        assert_eq!(folder.description.as_deref(), Some("First"));
    }

    #[test]
    fn missing_account_yields_connection_only() {
        let repositories = [repository("alpha", None)];

        let assets = transform(None, &repositories, "GitHub API", CONNECTION);

        assert_eq!(assets.len(), 1);
        assert!(matches!(&assets[0], CatalogAsset::Connection(c) if c.connector_type == "github"));
    }

    #[test]
    fn unnamed_account_yields_connection_only() {
        let assets = transform(Some(&account("")), &[repository("alpha", None)], "GitHub API", CONNECTION);

        assert_eq!(assets.len(), 1);
    }

    #[test]
    fn duplicate_repository_names_pass_through() {
        let repositories = [repository("same", None), repository("same", None)];

        let assets = transform(Some(&account("octocat")), &repositories, "GitHub API", CONNECTION);

        assert_eq!(assets.len(), 4);
        assert_eq!(assets[2], assets[3]);
    }
}
