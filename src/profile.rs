//! User preference profiles.
//!
//! A profile is derived per user at ranking time from that user's ratings
//! and the read-only item content maps; it is never persisted.

use std::collections::{BTreeSet, HashMap};

use crate::content::ItemContent;
use crate::dataset::Rating;
use crate::embedding::{centroid, VectorSpace, VectorSpaceError};

/// A user's query profile, built from their positively-rated items.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Combined token sequence of all positively-rated items.
    pub tokens: Vec<String>,
    /// Query centroid; `None` when tokens exist but none resolved.
    pub query: Option<Vec<f32>>,
}

/// Build the profile for one user from their ratings.
///
/// Items rated at or above `min_positive_rating` contribute their token
/// sequences, in ascending item id order. Returns `Ok(None)`, meaning skip
/// the user entirely, when the combined sequence is empty. The check is on
/// sequence length, not on whether any token resolves: a user whose tokens
/// all miss the vocabulary still gets a profile, with the empty-sentinel
/// query, and ends up with a uniform all-zero ranking.
pub fn build(
    user_ratings: &[Rating],
    min_positive_rating: f32,
    contents: &HashMap<u64, ItemContent>,
    space: &dyn VectorSpace,
) -> Result<Option<Profile>, VectorSpaceError> {
    let positive: BTreeSet<u64> = user_ratings
        .iter()
        .filter(|r| r.rating >= min_positive_rating)
        .map(|r| r.item)
        .collect();

    let mut tokens: Vec<String> = Vec::new();
    for item in &positive {
        if let Some(content) = contents.get(item) {
            tokens.extend(content.tokens.iter().cloned());
        }
    }

    if tokens.is_empty() {
        return Ok(None);
    }

    let query = centroid(&tokens, space)?;
    Ok(Some(Profile { tokens, query }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::WordTableSpace;

    fn space() -> WordTableSpace {
        WordTableSpace::from_entries(
            2,
            [
                ("dark".to_string(), vec![1.0, 0.0]),
                ("tower".to_string(), vec![0.0, 1.0]),
            ],
        )
    }

    fn contents(entries: &[(u64, &[&str])]) -> HashMap<u64, ItemContent> {
        let space = space();
        entries
            .iter()
            .map(|(item, words)| {
                let tokens: Vec<String> = words.iter().map(|w| w.to_string()).collect();
                let vector = centroid(&tokens, &space).unwrap();
                (*item, ItemContent { tokens, vector })
            })
            .collect()
    }

    fn rating(user: u64, item: u64, rating: f32) -> Rating {
        Rating { user, item, rating }
    }

    #[test]
    fn test_only_positive_items_contribute() {
        let contents = contents(&[(1, &["dark"]), (2, &["tower"])]);
        let ratings = vec![rating(7, 1, 5.0), rating(7, 2, 2.0)];

        let profile = build(&ratings, 4.0, &contents, &space()).unwrap().unwrap();
        assert_eq!(profile.tokens, vec!["dark"]);
        assert_eq!(profile.query, Some(vec![1.0, 0.0]));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let contents = contents(&[(1, &["dark"])]);
        let ratings = vec![rating(7, 1, 4.0)];

        let profile = build(&ratings, 4.0, &contents, &space()).unwrap();
        assert!(profile.is_some());
    }

    #[test]
    fn test_tokens_concatenate_in_ascending_item_order() {
        let contents = contents(&[(5, &["tower"]), (3, &["dark"])]);
        // rated in descending id order; profile order must not follow it
        let ratings = vec![rating(7, 5, 5.0), rating(7, 3, 5.0)];

        let profile = build(&ratings, 4.0, &contents, &space()).unwrap().unwrap();
        assert_eq!(profile.tokens, vec!["dark", "tower"]);
    }

    #[test]
    fn test_cold_user_is_skipped() {
        let contents = contents(&[(1, &["dark"])]);
        let ratings = vec![rating(7, 1, 1.0)];

        assert!(build(&ratings, 4.0, &contents, &space()).unwrap().is_none());
    }

    #[test]
    fn test_user_with_tokenless_positives_is_skipped() {
        let contents = contents(&[(1, &[])]);
        let ratings = vec![rating(7, 1, 5.0)];

        assert!(build(&ratings, 4.0, &contents, &space()).unwrap().is_none());
    }

    #[test]
    fn test_unresolvable_tokens_do_not_skip() {
        // the skip check is on token count, not resolution: the user
        // proceeds with the empty-sentinel query
        let contents = contents(&[(1, &["zz", "qq"])]);
        let ratings = vec![rating(7, 1, 5.0)];

        let profile = build(&ratings, 4.0, &contents, &space()).unwrap().unwrap();
        assert_eq!(profile.tokens, vec!["zz", "qq"]);
        assert_eq!(profile.query, None);
    }

    #[test]
    fn test_duplicate_positive_ratings_count_once() {
        let contents = contents(&[(1, &["dark"])]);
        let ratings = vec![rating(7, 1, 5.0), rating(7, 1, 4.0)];

        let profile = build(&ratings, 4.0, &contents, &space()).unwrap().unwrap();
        assert_eq!(profile.tokens, vec!["dark"]);
    }
}
