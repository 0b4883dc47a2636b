//! Data-quality metrics over an extracted account.

use crate::client::{AccountMetadata, RepositoryMetadata};
use serde::{Deserialize, Serialize};

/// Summary statistics of one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Number of repositories passed to [`QualityMetrics::compute`].
    pub total_public_repos: usize,
    pub total_followers: u64,
    pub total_following: u64,
    /// Mean star count, `0.0` when there are no repositories.
    pub average_stars_per_repo: f64,
    pub total_public_gists: u64,
    /// Share of repositories with a non-empty description, in `[0, 100]`.
    pub repos_with_description_percentage: f64,
    /// Share of repositories with at least one auto-tag, in `[0, 100]`.
    pub repos_with_auto_tags_percentage: f64,
}

impl QualityMetrics {
    /// Computes metrics for exactly the given account and repositories.
    #[must_use]
    pub fn compute(account: &AccountMetadata, repositories: &[RepositoryMetadata]) -> Self {
        let count = repositories.len();
        let total_stars: u64 = repositories.iter().map(|r| r.star_count).sum();
        let described = repositories.iter().filter(|r| r.has_description()).count();
        let tagged = repositories.iter().filter(|r| r.has_auto_tags()).count();

        Self {
            total_public_repos: count,
            total_followers: account.followers,
            total_following: account.following,
            average_stars_per_repo: mean(total_stars, count),
            total_public_gists: account.public_gists,
            repos_with_description_percentage: percentage(described, count),
            repos_with_auto_tags_percentage: percentage(tagged, count),
        }
    }
}

fn mean(total: u64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total as f64 / count as f64
}

fn percentage(part: usize, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    100.0 * part as f64 / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{DEFAULT_BIO, NOT_AVAILABLE};

    fn account(followers: u64, following: u64, public_gists: u64) -> AccountMetadata {
        let na = || NOT_AVAILABLE.to_string();
        AccountMetadata {
            name: "testuser".to_string(),
            node_id: na(),
            profile_url: na(),
            avatar_url: na(),
            bio: DEFAULT_BIO.to_string(),
            account_type: "User".to_string(),
            company: na(),
            location: na(),
            email: na(),
            blog: na(),
            twitter_username: na(),
            created_at: na(),
            followers,
            following,
            followers_url: na(),
            following_url: na(),
            public_repos: 2,
            public_gists,
        }
    }

    fn repository(stars: u64, description: Option<&str>, tags: &[&str]) -> RepositoryMetadata {
        RepositoryMetadata {
            name: "repo".to_string(),
            description: description.map(str::to_string),
            language: None,
            star_count: stars,
            fork_count: 0,
            issue_count: 0,
            created_at: NOT_AVAILABLE.to_string(),
            updated_at: NOT_AVAILABLE.to_string(),
            url: NOT_AVAILABLE.to_string(),
            auto_tags: Some(tags.iter().map(|t| t.to_string()).collect()),
        }
    }

    #[test]
    fn computes_reference_scenario() {
        let repositories = vec![
            repository(10, Some("a desc"), &["tag1"]),
            repository(20, None, &[]),
        ];

        let metrics = QualityMetrics::compute(&account(100, 50, 20), &repositories);

        assert_eq!(metrics.total_public_repos, 2);
        assert_eq!(metrics.total_followers, 100);
        assert_eq!(metrics.total_following, 50);
        assert_eq!(metrics.total_public_gists, 20);
        assert_eq!(metrics.average_stars_per_repo, 15.0);
        assert_eq!(metrics.repos_with_description_percentage, 50.0);
        assert_eq!(metrics.repos_with_auto_tags_percentage, 50.0);
    }

    #[test]
    fn zero_repositories_yield_zero_ratios() {
        let metrics = QualityMetrics::compute(&account(7, 3, 1), &[]);

        assert_eq!(metrics.total_public_repos, 0);
        assert_eq!(metrics.average_stars_per_repo, 0.0);
        assert_eq!(metrics.repos_with_description_percentage, 0.0);
        assert_eq!(metrics.repos_with_auto_tags_percentage, 0.0);
    }

    #[test]
    fn total_matches_collection_length_not_profile_count() {
        let repositories: Vec<_> = (0..5).map(|i| repository(i, None, &[])).collect();

        let metrics = QualityMetrics::compute(&account(0, 0, 0), &repositories);

        assert_eq!(metrics.total_public_repos, repositories.len());
    }

    #[test]
    fn untagged_repositories_count_as_without_tags() {
        let mut untagged = repository(1, Some("x"), &[]);
        untagged.auto_tags = None;

        let metrics = QualityMetrics::compute(&account(0, 0, 0), &[untagged]);

        assert_eq!(metrics.repos_with_description_percentage, 100.0);
        assert_eq!(metrics.repos_with_auto_tags_percentage, 0.0);
    }

    #[test]
    fn percentages_are_not_rounded() {
        let repositories = vec![
            repository(1, Some("x"), &[]),
            repository(1, None, &[]),
            repository(2, None, &[]),
        ];

        let metrics = QualityMetrics::compute(&account(0, 0, 0), &repositories);

        assert_eq!(metrics.repos_with_description_percentage, 100.0 / 3.0);
        assert_eq!(metrics.average_stars_per_repo, 4.0 / 3.0);
    }
}
