#![allow(dead_code)]

//! Text normalization: free text in, canonical keyword set out.
//!
//! Every piece of profile or posting text passes through `normalize` before
//! any comparison, so both sides of a match are reduced to the same stemmed,
//! stopword-free vocabulary. The output is a `BTreeSet` so iteration order
//! (and therefore serialization) is stable for identical input.

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};

static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
        "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
        "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their",
        "what", "so", "up", "out", "if", "about", "who", "get", "which", "go", "me", "when",
        "make", "can", "like", "time", "no", "just", "him", "know", "take", "people", "into",
        "year", "your", "good", "some", "could", "them", "see", "other", "than", "then", "now",
        "look", "only", "come", "its", "over", "think", "also", "back", "after", "use", "two",
        "how", "our", "work", "first", "well", "way", "even", "new", "want", "because", "any",
        "these", "give", "day", "most", "us", "is", "was", "are", "been", "has", "had", "were",
        "said", "did",
    ]
    .into_iter()
    .collect()
});

/// Lower-cases, tokenizes on word boundaries, drops tokens of length <= 2 and
/// stopwords, stems the survivors, and deduplicates. Pure and deterministic;
/// empty input yields an empty set.
///
/// The length and stopword filters run again on the stems ("working" stems to
/// the stopword "work", "doing" to "do"), so the output is a fixed point:
/// normalizing it a second time returns the same set.
pub fn normalize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2 && !STOPWORDS.contains(*token))
        .map(|token| STEMMER.stem(token).into_owned())
        .filter(|stem| stem.len() > 2 && !STOPWORDS.contains(stem.as_str()))
        .collect()
}

/// Stems a single already-lowercased word with the same stemmer `normalize`
/// uses. Needed where fixed vocabularies (education terms) must be compared
/// against normalized output.
pub fn stem_word(word: &str) -> String {
    STEMMER.stem(&word.to_lowercase()).into_owned()
}

/// Renders a keyword set back to a space-separated string, in set order.
pub fn join_tokens(tokens: &BTreeSet<String>) -> String {
    tokens
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
