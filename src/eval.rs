//! Aggregate statistics over a produced recommendation table.
//!
//! Each metric is a closed-form reduction over the recommendation rows and
//! the ratings table. Item popularity throughout is the fraction of users
//! who rated the item.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::anyhow;
use serde::Serialize;

use crate::dataset::Rating;

/// One row of a recommendations table, as written by a recommend run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecRow {
    pub user: u64,
    pub item: u64,
    pub score: f32,
}

/// Load a recommendations CSV (`user,item,score`).
pub fn load_recs(path: &Path) -> anyhow::Result<Vec<RecRow>> {
    let mut csv_reader = csv::Reader::from_path(path)?;

    let mut rows = vec![];
    for record in csv_reader.records() {
        let record = record?;
        let user = record
            .get(0)
            .ok_or(anyhow!("missing user column"))?
            .parse::<u64>()?;
        let item = record
            .get(1)
            .ok_or(anyhow!("missing item column"))?
            .parse::<u64>()?;
        let score = record
            .get(2)
            .ok_or(anyhow!("missing score column"))?
            .parse::<f32>()?;

        rows.push(RecRow { user, item, score });
    }
    Ok(rows)
}

/// Evaluation report over one recommendation table.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Users with at least one recommendation row.
    pub users: usize,
    /// Total recommendation rows.
    pub rows: usize,
    /// Distinct recommended items.
    pub distinct_recommended: usize,
    /// Distinct items observed in the ratings table.
    pub catalog_size: usize,
    /// distinct recommended / catalog size.
    pub catalog_coverage: f64,
    /// Gini index of per-item recommendation counts (0 = uniform exposure).
    pub gini_index: f64,
    /// Mean self-information of recommended items, -log2(popularity).
    pub novelty: f64,
    /// Relative change from profile popularity to recommendation popularity.
    pub delta_gap: f64,
}

/// Compute all metrics for a recommendation table against its ratings.
pub fn evaluate(recs: &[RecRow], ratings: &[Rating]) -> Report {
    let users_in_ratings: HashSet<u64> = ratings.iter().map(|r| r.user).collect();
    let catalog: HashSet<u64> = ratings.iter().map(|r| r.item).collect();

    let mut raters: HashMap<u64, HashSet<u64>> = HashMap::new();
    for r in ratings {
        raters.entry(r.item).or_default().insert(r.user);
    }
    let popularity: HashMap<u64, f64> = raters
        .iter()
        .map(|(item, users)| (*item, users.len() as f64 / users_in_ratings.len().max(1) as f64))
        .collect();

    let rec_users: HashSet<u64> = recs.iter().map(|r| r.user).collect();
    let recommended: HashSet<u64> = recs.iter().map(|r| r.item).collect();

    Report {
        users: rec_users.len(),
        rows: recs.len(),
        distinct_recommended: recommended.len(),
        catalog_size: catalog.len(),
        catalog_coverage: catalog_coverage(&recommended, &catalog),
        gini_index: gini_index(recs, &catalog),
        novelty: novelty(recs, &popularity),
        delta_gap: delta_gap(recs, ratings, &popularity),
    }
}

/// Fraction of the catalog that appears in the recommendations.
fn catalog_coverage(recommended: &HashSet<u64>, catalog: &HashSet<u64>) -> f64 {
    if catalog.is_empty() {
        return 0.0;
    }
    recommended.len() as f64 / catalog.len() as f64
}

/// Gini index over per-item recommendation counts, zeros included.
///
/// 0 means every catalog item gets equal exposure; 1 means all exposure
/// concentrates on a single item.
fn gini_index(recs: &[RecRow], catalog: &HashSet<u64>) -> f64 {
    if catalog.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<u64, usize> = catalog.iter().map(|item| (*item, 0)).collect();
    for rec in recs {
        *counts.entry(rec.item).or_insert(0) += 1;
    }

    let mut values: Vec<f64> = counts.values().map(|c| *c as f64).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = values.len() as f64;
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        return 0.0;
    }

    let weighted: f64 = values
        .iter()
        .enumerate()
        .map(|(i, value)| (2.0 * (i as f64 + 1.0) - n - 1.0) * value)
        .sum();
    weighted / (n * total)
}

/// Mean self-information of recommended items.
///
/// Items absent from the ratings table take the minimum observed
/// popularity, so unseen items count as maximally novel rather than
/// breaking the logarithm.
fn novelty(recs: &[RecRow], popularity: &HashMap<u64, f64>) -> f64 {
    if recs.is_empty() {
        return 0.0;
    }

    let min_popularity = popularity
        .values()
        .copied()
        .fold(f64::INFINITY, f64::min)
        .min(1.0);

    let total: f64 = recs
        .iter()
        .map(|rec| {
            let pop = popularity.get(&rec.item).copied().unwrap_or(min_popularity);
            -pop.log2()
        })
        .sum();
    total / recs.len() as f64
}

/// Relative popularity gap between user profiles and their recommendations.
///
/// GAP of a list is the mean item popularity; the result is
/// (GAP_recs - GAP_profiles) / GAP_profiles over users present in the
/// recommendation table. Negative values mean the recommender surfaces less
/// popular items than the users already rate.
fn delta_gap(recs: &[RecRow], ratings: &[Rating], popularity: &HashMap<u64, f64>) -> f64 {
    let mut rec_users: Vec<u64> = recs
        .iter()
        .map(|r| r.user)
        .collect::<HashSet<u64>>()
        .into_iter()
        .collect();
    rec_users.sort_unstable();
    if rec_users.is_empty() {
        return 0.0;
    }

    let mean_pop = |items: &[u64]| -> f64 {
        if items.is_empty() {
            return 0.0;
        }
        let total: f64 = items
            .iter()
            .map(|item| popularity.get(item).copied().unwrap_or(0.0))
            .sum();
        total / items.len() as f64
    };

    let mut profile_gap = 0.0;
    let mut recs_gap = 0.0;
    for user in &rec_users {
        let profile_items: Vec<u64> = ratings
            .iter()
            .filter(|r| r.user == *user)
            .map(|r| r.item)
            .collect();
        let rec_items: Vec<u64> = recs
            .iter()
            .filter(|r| r.user == *user)
            .map(|r| r.item)
            .collect();

        profile_gap += mean_pop(&profile_items);
        recs_gap += mean_pop(&rec_items);
    }
    profile_gap /= rec_users.len() as f64;
    recs_gap /= rec_users.len() as f64;

    if profile_gap == 0.0 {
        return 0.0;
    }
    (recs_gap - profile_gap) / profile_gap
}

/// Load both tables and compute the report.
pub fn run(recs_path: &Path, ratings_path: &Path) -> anyhow::Result<Report> {
    let recs = load_recs(recs_path)?;
    let ratings = crate::dataset::load_ratings(ratings_path)?;
    Ok(evaluate(&recs, &ratings))
}
