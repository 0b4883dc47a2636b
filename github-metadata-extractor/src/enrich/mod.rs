//! Keyword enrichment of repository descriptions.
//!
//! Each repository description is handed to a [`KeywordExtractor`] and the
//! best-ranked phrases become the repository's `auto_tags`.

mod rake;

pub use rake::RakeExtractor;

use crate::client::RepositoryMetadata;

/// Maximum number of tags assigned to a repository.
pub const MAX_KEYWORDS: usize = 5;

/// A candidate phrase and the extractor's score for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredKeyword {
    /// Lowercased candidate phrase.
    pub phrase: String,
    /// Extractor-specific relevance; only the ordering matters.
    pub score: f64,
}

impl ScoredKeyword {
    /// Creates a keyword; higher scores rank first.
    pub fn new(phrase: impl Into<String>, score: f64) -> Self {
        Self {
            phrase: phrase.into(),
            score,
        }
    }
}

/// Derives ranked keyword phrases from free text.
#[cfg_attr(test, mockall::automock)]
pub trait KeywordExtractor: Send + Sync {
    /// Returns at most `max` phrases, best first.
    fn extract_keywords(&self, text: &str, max: usize) -> Vec<ScoredKeyword>;
}

/// Assigns `auto_tags` to every repository that has none yet.
///
/// Repositories with an empty or missing description get an empty tag list.
/// Repositories that already carry tags are returned untouched. Order is
/// preserved.
pub fn enrich(
    repositories: Vec<RepositoryMetadata>,
    extractor: &dyn KeywordExtractor,
) -> Vec<RepositoryMetadata> {
    repositories
        .into_iter()
        .map(|repository| tag_repository(repository, extractor))
        .collect()
}

fn tag_repository(
    mut repository: RepositoryMetadata,
    extractor: &dyn KeywordExtractor,
) -> RepositoryMetadata {
    if repository.auto_tags.is_some() {
        return repository;
    }

    let tags = match repository.description.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => extractor
            .extract_keywords(text, MAX_KEYWORDS)
            .into_iter()
            .take(MAX_KEYWORDS)
            .map(|keyword| keyword.phrase)
            .collect(),
        _ => Vec::new(),
    };

    repository.auto_tags = Some(tags);
    repository
}
