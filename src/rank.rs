//! Cosine-similarity ranking over unseen catalog items.
//!
//! A user's ranking pass is a pure function of the read-only item vectors,
//! that user's rated set, and K. Candidates are every catalog item the user
//! has not rated, enumerated in catalog order.

use std::collections::{HashMap, HashSet};

use crate::content::ItemContent;

/// One ranked recommendation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub item: u64,
    pub score: f32,
}

/// Rank the user's unseen items by similarity to the query vector.
///
/// A candidate whose content vector is the empty sentinel scores exactly
/// 0.0; it still competes, it is never dropped. When the query itself is
/// the empty sentinel every candidate scores 0.0 and the ranking degrades
/// to catalog order. Ties keep candidate enumeration order (stable sort).
pub fn rank(
    query: Option<&[f32]>,
    catalog: &[u64],
    rated: &HashSet<u64>,
    contents: &HashMap<u64, ItemContent>,
    k: usize,
) -> Vec<Scored> {
    let query_norm = query.map(l2_norm).unwrap_or(0.0);

    let mut scored: Vec<Scored> = catalog
        .iter()
        .filter(|item| !rated.contains(item))
        .map(|&item| {
            let vector = contents.get(&item).and_then(|c| c.vector.as_deref());
            let score = match (query, vector) {
                (Some(query), Some(vector)) => cosine_similarity(query, vector, query_norm),
                _ => 0.0,
            };
            Scored { item, score }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);
    scored
}

/// Compute L2 norm of a vector.
fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity with a precomputed query norm.
/// Zero-norm vectors on either side score 0.0.
fn cosine_similarity(query: &[f32], target: &[f32], query_norm: f32) -> f32 {
    if query_norm < f32::EPSILON {
        return 0.0;
    }
    let target_norm = l2_norm(target);
    if target_norm < f32::EPSILON {
        return 0.0;
    }

    let dot_product: f32 = query.iter().zip(target.iter()).map(|(a, b)| a * b).sum();
    dot_product / (query_norm * target_norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(vector: Option<Vec<f32>>) -> ItemContent {
        ItemContent {
            tokens: vec![],
            vector,
        }
    }

    fn contents(entries: &[(u64, Option<Vec<f32>>)]) -> HashMap<u64, ItemContent> {
        entries
            .iter()
            .map(|(item, vector)| (*item, content(vector.clone())))
            .collect()
    }

    #[test]
    fn test_rated_items_are_never_recommended() {
        let contents = contents(&[
            (1, Some(vec![1.0, 0.0])),
            (2, Some(vec![0.9, 0.1])),
            (3, Some(vec![0.0, 1.0])),
        ]);
        let rated: HashSet<u64> = [1].into();

        let result = rank(Some(&[1.0, 0.0]), &[1, 2, 3], &rated, &contents, 10);

        assert!(!result.iter().any(|s| s.item == 1));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_descending_score_order() {
        let contents = contents(&[
            (1, Some(vec![0.0, 1.0])),
            (2, Some(vec![1.0, 0.0])),
            (3, Some(vec![0.7, 0.7])),
        ]);

        let result = rank(Some(&[1.0, 0.0]), &[1, 2, 3], &HashSet::new(), &contents, 10);

        assert_eq!(result[0].item, 2);
        assert_eq!(result[1].item, 3);
        assert_eq!(result[2].item, 1);
        assert!(result.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_truncates_to_k() {
        let contents = contents(&[
            (1, Some(vec![1.0, 0.0])),
            (2, Some(vec![1.0, 0.0])),
            (3, Some(vec![1.0, 0.0])),
        ]);

        let result = rank(Some(&[1.0, 0.0]), &[1, 2, 3], &HashSet::new(), &contents, 2);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_empty_sentinel_scores_zero_but_competes() {
        let contents = contents(&[(1, None), (2, Some(vec![1.0, 0.0]))]);

        let result = rank(Some(&[1.0, 0.0]), &[1, 2], &HashSet::new(), &contents, 10);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].item, 2);
        assert_eq!(result[1], Scored { item: 1, score: 0.0 });
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let contents = contents(&[(30, None), (10, None), (20, None)]);

        let result = rank(Some(&[1.0, 0.0]), &[30, 10, 20], &HashSet::new(), &contents, 10);

        let items: Vec<u64> = result.iter().map(|s| s.item).collect();
        assert_eq!(items, vec![30, 10, 20]);
    }

    #[test]
    fn test_empty_query_degrades_to_catalog_order() {
        let contents = contents(&[(1, Some(vec![1.0, 0.0])), (2, Some(vec![0.0, 1.0]))]);

        let result = rank(None, &[2, 1], &HashSet::new(), &contents, 10);

        assert_eq!(result[0], Scored { item: 2, score: 0.0 });
        assert_eq!(result[1], Scored { item: 1, score: 0.0 });
    }

    #[test]
    fn test_exhausted_candidate_set_yields_nothing() {
        let contents = contents(&[(1, Some(vec![1.0, 0.0]))]);
        let rated: HashSet<u64> = [1].into();

        assert!(rank(Some(&[1.0, 0.0]), &[1], &rated, &contents, 10).is_empty());
    }

    #[test]
    fn test_scenario_three_item_catalog() {
        // catalog {A=1, B=2, C=3}: A -> [1,0], B -> [0,1], C unresolved.
        // user rated A positively; B and C are candidates.
        let contents = contents(&[
            (1, Some(vec![1.0, 0.0])),
            (2, Some(vec![0.0, 1.0])),
            (3, None),
        ]);
        let rated: HashSet<u64> = [1].into();

        let result = rank(Some(&[1.0, 0.0]), &[1, 2, 3], &rated, &contents, 2);

        // B scores cos([1,0],[0,1]) = 0, C scores 0; tie resolves to
        // enumeration order, A is excluded
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], Scored { item: 2, score: 0.0 });
        assert_eq!(result[1], Scored { item: 3, score: 0.0 });
    }

    #[test]
    fn test_cosine_similarity_range() {
        let q = [1.0, 0.0];
        assert!((cosine_similarity(&q, &[1.0, 0.0], l2_norm(&q)) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&q, &[-1.0, 0.0], l2_norm(&q)) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&q, &[0.0, 0.0], l2_norm(&q)), 0.0);
    }
}
