//! Source-table loading.
//!
//! All inputs are headered CSV files read with positional columns, so the
//! exact header names are free to vary between datasets. Any malformed row
//! is fatal: a broken source table aborts the run before output is written.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{anyhow, Context};

/// One row of the ratings table, read-only input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub user: u64,
    pub item: u64,
    pub rating: f32,
}

/// Load the ratings table: rows of (user, item, rating).
pub fn load_ratings(path: &Path) -> anyhow::Result<Vec<Rating>> {
    let mut csv_reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening ratings table {}", path.display()))?;

    let mut ratings = vec![];
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
        let rating = record
            .get(2)
            .ok_or(anyhow!("missing rating column"))?
            .parse::<f32>()?;

        ratings.push(Rating { user, item, rating });
    }

    log::info!("loaded {} ratings from {}", ratings.len(), path.display());
    Ok(ratings)
}

/// Load the item catalog: the ordered universe of candidate items.
///
/// The first column of each row is the item id. Duplicates keep their first
/// position; the resulting order defines candidate enumeration order for
/// the ranker.
pub fn load_catalog(path: &Path) -> anyhow::Result<Vec<u64>> {
    let mut csv_reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening catalog {}", path.display()))?;

    let mut items = vec![];
    let mut seen = HashSet::new();
    for record in csv_reader.records() {
        let record = record?;
        let item = record
            .get(0)
            .ok_or(anyhow!("missing item column"))?
            .parse::<u64>()?;
        if seen.insert(item) {
            items.push(item);
        }
    }

    log::info!("loaded {} catalog items from {}", items.len(), path.display());
    Ok(items)
}

/// Load a sparse (item, text) table such as tags or descriptions.
///
/// Not every catalog item needs a row here; absent items later contribute
/// an empty string. When an item appears twice the first row wins.
pub fn load_text_table(path: &Path) -> anyhow::Result<HashMap<u64, String>> {
    let mut csv_reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening text table {}", path.display()))?;

    let mut table = HashMap::new();
    for record in csv_reader.records() {
        let record = record?;
        let item = record
            .get(0)
            .ok_or(anyhow!("missing item column"))?
            .parse::<u64>()?;
        let text = record
            .get(1)
            .ok_or(anyhow!("missing text column"))?
            .to_string();

        table.entry(item).or_insert(text);
    }

    log::info!("loaded {} text rows from {}", table.len(), path.display());
    Ok(table)
}
