//! Item text normalization and catalog content construction.
//!
//! For every catalog item the enabled text fields (tags, description) are
//! concatenated, pushed through a fixed normalization pipeline, and reduced
//! to a centroid vector. The resulting maps are built once at startup and
//! stay read-only for the rest of the run.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;

use crate::config::FieldSelection;
use crate::embedding::{centroid, VectorSpace, VectorSpaceError};

static MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// English stopwords removed during normalization.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during", "each",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now",
    "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out",
    "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "very", "was", "we", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
    "you", "your", "yours", "yourself", "yourselves",
];

/// Tokens and centroid derived from one item's text fields.
#[derive(Debug, Clone)]
pub struct ItemContent {
    /// Normalized token sequence, order and duplicates preserved.
    pub tokens: Vec<String>,
    /// Centroid of the resolved token vectors; `None` when no token
    /// resolved (the empty sentinel).
    pub vector: Option<Vec<f32>>,
}

/// Normalize raw item text into a token sequence.
///
/// Pipeline, in order: lowercase, strip markup, strip punctuation, remove
/// stopwords, split alphanumeric runs, collapse whitespace. Token order and
/// duplicates are preserved.
pub fn normalize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let stripped = MARKUP_REGEX.replace_all(&lowered, " ");
    let depunct: String = stripped
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    depunct
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word))
        .flat_map(split_alphanum)
        .collect()
}

/// Split a word into its alphabetic and numeric runs: "abc123" -> "abc", "123".
fn split_alphanum(word: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = None;

    for c in word.chars() {
        let is_digit = c.is_numeric();
        if current_is_digit != Some(is_digit) && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        current.push(c);
        current_is_digit = Some(is_digit);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Concatenate an item's enabled field values in fixed order.
///
/// An item absent from a table contributes an empty string for that field.
fn item_text(
    item: u64,
    tags: &HashMap<u64, String>,
    descriptions: &HashMap<u64, String>,
    fields: FieldSelection,
) -> String {
    let mut text = String::new();
    if fields.tags {
        if let Some(value) = tags.get(&item) {
            text.push_str(value);
        }
    }
    if fields.descr {
        if let Some(value) = descriptions.get(&item) {
            text.push_str(value);
        }
    }
    text
}

/// Build tokens and centroid vectors for the whole catalog.
///
/// Runs once at startup; each item is a pure function of its own text and
/// the embedding table, so the build is parallel over items. Items whose
/// text yields no resolvable token get the empty-sentinel vector but stay
/// in the map; they still compete as candidates later.
pub fn build_catalog(
    catalog: &[u64],
    tags: &HashMap<u64, String>,
    descriptions: &HashMap<u64, String>,
    fields: FieldSelection,
    space: &dyn VectorSpace,
) -> Result<HashMap<u64, ItemContent>, VectorSpaceError> {
    catalog
        .par_iter()
        .map(|&item| {
            let text = item_text(item, tags, descriptions, fields);
            let tokens = normalize(&text);
            let vector = centroid(&tokens, space)?;
            Ok((item, ItemContent { tokens, vector }))
        })
        .collect()
}
