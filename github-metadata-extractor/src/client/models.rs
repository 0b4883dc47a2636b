//! Account and repository records.
//!
//! Upstream responses are decoded into loosely-typed `Raw*` structs and then
//! normalized once, here, so every downstream component sees fully populated
//! records.

use serde::{Deserialize, Serialize};

/// Placeholder for absent string fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder for an absent biography.
pub const DEFAULT_BIO: &str = "No bio provided.";

/// Profile metadata of a user or organization.
///
/// Absent string fields hold [`NOT_AVAILABLE`] and absent counts are 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetadata {
    /// Display name, falling back to the login.
    pub name: String,
    /// GraphQL node id.
    pub node_id: String,
    /// Profile page on github.com.
    pub profile_url: String,
    pub avatar_url: String,
    /// Biography, or [`DEFAULT_BIO`] when the profile has none.
    pub bio: String,
    /// `User` or `Organization`.
    #[serde(rename = "type")]
    pub account_type: String,
    pub company: String,
    pub location: String,
    /// Public email address.
    pub email: String,
    /// Website link from the profile.
    pub blog: String,
    pub twitter_username: String,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// Number of followers.
    pub followers: u64,
    /// Number of accounts this account follows.
    pub following: u64,
    /// API URL listing the followers.
    pub followers_url: String,
    /// API URL template listing followed accounts.
    pub following_url: String,
    /// Public repository count as reported by the profile.
    pub public_repos: u64,
    pub public_gists: u64,
}

/// Metadata of a single repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    /// Repository name without the owner.
    pub name: String,
    /// Free-text description. Kept as `None` rather than a placeholder so
    /// enrichment can tell missing descriptions apart.
    pub description: Option<String>,
    /// Primary language, if GitHub detected one.
    pub language: Option<String>,
    /// Stargazer count.
    pub star_count: u64,
    pub fork_count: u64,
    /// Open issue count.
    pub issue_count: u64,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 timestamp of the last update.
    pub updated_at: String,
    /// Repository page on github.com.
    pub url: String,
    /// Keyword tags derived from the description; absent until enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_tags: Option<Vec<String>>,
}

impl RepositoryMetadata {
    /// Returns true if the description contains any non-whitespace text.
    #[must_use]
    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|description| !description.trim().is_empty())
    }

    /// Returns true if enrichment produced at least one tag.
    #[must_use]
    pub fn has_auto_tags(&self) -> bool {
        self.auto_tags.as_ref().is_some_and(|tags| !tags.is_empty())
    }
}

/// `GET /users/{identifier}` response, every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawAccount {
    login: Option<String>,
    name: Option<String>,
    node_id: Option<String>,
    html_url: Option<String>,
    avatar_url: Option<String>,
    bio: Option<String>,
    #[serde(rename = "type")]
    account_type: Option<String>,
    company: Option<String>,
    location: Option<String>,
    email: Option<String>,
    blog: Option<String>,
    twitter_username: Option<String>,
    created_at: Option<String>,
    followers: Option<u64>,
    following: Option<u64>,
    followers_url: Option<String>,
    following_url: Option<String>,
    public_repos: Option<u64>,
    public_gists: Option<u64>,
}

/// One element of `GET /users/{identifier}/repos`, every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawRepository {
    name: Option<String>,
    description: Option<String>,
    language: Option<String>,
    stargazers_count: Option<u64>,
    forks_count: Option<u64>,
    open_issues_count: Option<u64>,
    created_at: Option<String>,
    updated_at: Option<String>,
    html_url: Option<String>,
}

/// Treats `null` and `""` alike as missing.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn or_not_available(value: Option<String>) -> String {
    present(value).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

impl From<RawAccount> for AccountMetadata {
    fn from(raw: RawAccount) -> Self {
        Self {
            name: or_not_available(present(raw.name).or(raw.login)),
            node_id: or_not_available(raw.node_id),
            profile_url: or_not_available(raw.html_url),
            avatar_url: or_not_available(raw.avatar_url),
            bio: present(raw.bio).unwrap_or_else(|| DEFAULT_BIO.to_string()),
            account_type: or_not_available(raw.account_type),
            company: or_not_available(raw.company),
            location: or_not_available(raw.location),
            email: or_not_available(raw.email),
            blog: or_not_available(raw.blog),
            twitter_username: or_not_available(raw.twitter_username),
            created_at: or_not_available(raw.created_at),
            followers: raw.followers.unwrap_or_default(),
            following: raw.following.unwrap_or_default(),
            followers_url: or_not_available(raw.followers_url),
            following_url: or_not_available(raw.following_url),
            public_repos: raw.public_repos.unwrap_or_default(),
            public_gists: raw.public_gists.unwrap_or_default(),
        }
    }
}

impl From<RawRepository> for RepositoryMetadata {
    fn from(raw: RawRepository) -> Self {
        Self {
            name: or_not_available(raw.name),
            description: raw.description,
            language: raw.language,
            star_count: raw.stargazers_count.unwrap_or_default(),
            fork_count: raw.forks_count.unwrap_or_default(),
            issue_count: raw.open_issues_count.unwrap_or_default(),
            created_at: or_not_available(raw.created_at),
            updated_at: or_not_available(raw.updated_at),
            url: or_not_available(raw.html_url),
            auto_tags: None,
        }
    }
}
