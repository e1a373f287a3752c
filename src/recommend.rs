//! Recommendation run orchestration.
//!
//! Loads the source tables, builds the catalog content maps once, then
//! walks users in first-appearance order and appends their top-K rows to
//! the output file. The per-user loop is sequential so that reruns over
//! identical inputs produce byte-identical output.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::RecommendConfig;
use crate::dataset::{self, Rating};
use crate::embedding::{self, VectorSpace};
use crate::rank::{self, Scored};
use crate::{content, profile};

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub users_total: usize,
    pub users_skipped: usize,
    pub rows_written: usize,
}

/// Run the full recommendation pass with the configured backend.
pub fn run(config: &RecommendConfig) -> anyhow::Result<RunSummary> {
    // fail on bad field selection before loading anything
    config.fields()?;

    let space = embedding::open_backend(&config.backend)?;
    run_with_space(config, space.as_ref())
}

/// Run the full recommendation pass against an already-open vector space.
pub fn run_with_space(
    config: &RecommendConfig,
    space: &dyn VectorSpace,
) -> anyhow::Result<RunSummary> {
    let _span = tracing::info_span!("recommend").entered();
    let fields = config.fields()?;

    let ratings = dataset::load_ratings(&config.ratings)?;
    let catalog = dataset::load_catalog(&config.catalog)?;
    let tags = if fields.tags {
        dataset::load_text_table(&config.tags)?
    } else {
        HashMap::new()
    };
    let descriptions = if fields.descr {
        dataset::load_text_table(&config.descriptions)?
    } else {
        HashMap::new()
    };

    log::info!("building content vectors for {} items", catalog.len());
    let contents = content::build_catalog(&catalog, &tags, &descriptions, fields, space)?;

    let (user_order, by_user) = group_by_user(&ratings);

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating output dir {}", config.output_dir.display()))?;
    let output_path = config.output_path();
    let mut writer = RecsWriter::create(&output_path)?;

    let mut summary = RunSummary {
        users_total: user_order.len(),
        ..Default::default()
    };

    let bar = ProgressBar::new(user_order.len() as u64).with_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} users")
            .expect("valid progress template"),
    );

    for user in user_order {
        let user_ratings = &by_user[&user];

        let profile = profile::build(user_ratings, config.min_positive_rating, &contents, space)?;
        let Some(profile) = profile else {
            log::debug!("skipping user {user}: no positive content");
            summary.users_skipped += 1;
            bar.inc(1);
            continue;
        };

        let rated: HashSet<u64> = user_ratings.iter().map(|r| r.item).collect();
        let recs = rank::rank(
            profile.query.as_deref(),
            &catalog,
            &rated,
            &contents,
            config.num_recs,
        );

        writer.append(user, &recs)?;
        summary.rows_written += recs.len();
        bar.inc(1);
    }
    bar.finish_and_clear();

    log::info!(
        "wrote {} rows for {} users ({} skipped) to {}",
        summary.rows_written,
        summary.users_total,
        summary.users_skipped,
        output_path.display()
    );

    Ok(summary)
}

/// Group ratings per user, preserving first-appearance order of users.
fn group_by_user(ratings: &[Rating]) -> (Vec<u64>, HashMap<u64, Vec<Rating>>) {
    let mut order = vec![];
    let mut by_user: HashMap<u64, Vec<Rating>> = HashMap::new();

    for rating in ratings {
        let entry = by_user.entry(rating.user).or_default();
        if entry.is_empty() {
            order.push(rating.user);
        }
        entry.push(*rating);
    }

    (order, by_user)
}

/// Appends (user, item, score) rows to the output table.
///
/// The file is created fresh (any previous run is overwritten) and flushed
/// after every user, so an interrupted run leaves a well-formed prefix of
/// complete rows.
pub struct RecsWriter {
    writer: csv::Writer<File>,
}

impl RecsWriter {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating output file {}", path.display()))?;
        writer.write_record(["user", "item", "score"])?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn append(&mut self, user: u64, recs: &[Scored]) -> anyhow::Result<()> {
        for rec in recs {
            self.writer.write_record([
                user.to_string(),
                rec.item.to_string(),
                rec.score.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
