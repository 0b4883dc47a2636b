//! Rapid Automatic Keyword Extraction.
//!
//! Candidate phrases are maximal runs of content words delimited by stop
//! words and punctuation. Each word scores `degree / frequency` across all
//! candidates and a phrase scores the sum of its words. Higher is better.

use super::{KeywordExtractor, ScoredKeyword};
use std::collections::{HashMap, HashSet};

/// English stop words that split candidate phrases.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "etc",
    "every", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "like", "made", "make", "many", "me", "more", "most", "much", "my", "no", "nor", "not", "now",
    "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "use", "used", "using", "very", "via", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "within", "without", "would", "you",
    "your", "yours",
];

/// Longest phrase kept as a candidate, in words.
const DEFAULT_MAX_PHRASE_WORDS: usize = 3;

/// Keyword extractor implementing RAKE.
#[derive(Debug, Clone)]
pub struct RakeExtractor {
    stop_words: HashSet<&'static str>,
    max_phrase_words: usize,
}

impl Default for RakeExtractor {
    fn default() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            max_phrase_words: DEFAULT_MAX_PHRASE_WORDS,
        }
    }
}

impl RakeExtractor {
    /// Sets the longest phrase considered, in words.
    #[must_use]
    pub fn with_max_phrase_words(mut self, max_phrase_words: usize) -> Self {
        self.max_phrase_words = max_phrase_words.max(1);
        self
    }

    /// Splits `text` into candidate phrases, in order of appearance.
    fn candidates(&self, text: &str) -> Vec<Vec<String>> {
        let lowered = text.to_lowercase();
        let mut phrases = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for fragment in lowered.split(is_phrase_delimiter) {
            for token in fragment.split_whitespace() {
                let word = token.trim_matches(|c: char| !is_word_char(c));
                let is_boundary = word.is_empty()
                    || self.stop_words.contains(word)
                    || word.chars().all(|c| c.is_ascii_digit());
                if is_boundary {
                    flush(&mut current, &mut phrases, self.max_phrase_words);
                } else {
                    current.push(word.to_string());
                }
            }
            flush(&mut current, &mut phrases, self.max_phrase_words);
        }

        phrases
    }
}

fn is_phrase_delimiter(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | ';' | ':' | '!' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | '|' | '\n'
    )
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '+' | '#' | '-' | '_')
}

fn flush(current: &mut Vec<String>, phrases: &mut Vec<Vec<String>>, max_words: usize) {
    if !current.is_empty() && current.len() <= max_words {
        phrases.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

impl KeywordExtractor for RakeExtractor {
    fn extract_keywords(&self, text: &str, max: usize) -> Vec<ScoredKeyword> {
        let phrases = self.candidates(text);

        let mut frequency: HashMap<&str, f64> = HashMap::new();
        let mut degree: HashMap<&str, f64> = HashMap::new();
        for phrase in &phrases {
            let co_occurrences = phrase.len() as f64;
            for word in phrase {
                *frequency.entry(word.as_str()).or_default() += 1.0;
                *degree.entry(word.as_str()).or_default() += co_occurrences;
            }
        }

        let mut seen = HashSet::new();
        let mut scored: Vec<ScoredKeyword> = phrases
            .iter()
            .filter_map(|phrase| {
                let joined = phrase.join(" ");
                if !seen.insert(joined.clone()) {
                    return None;
                }
                let score: f64 = phrase
                    .iter()
                    .map(|word| degree[word.as_str()] / frequency[word.as_str()])
                    .sum();
                Some(ScoredKeyword::new(joined, score))
            })
            .collect();

        // Stable sort keeps first-appearance order among equal scores.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(max);
        scored
    }
}
