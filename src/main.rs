use clap::Parser;

mod cli;
mod config;
mod content;
mod dataset;
mod embedding;
mod eval;
mod profile;
mod rank;
mod recommend;
#[cfg(test)]
mod tests;

use config::Config;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = cli::Args::parse();
    let config = Config::load(args.config.as_deref())?;

    match args.command {
        cli::Command::Recommend {
            output_dir,
            num_recs,
            min_positive_rating,
        } => {
            let mut rec_config = config.recommend;
            if let Some(dir) = output_dir {
                rec_config.output_dir = dir;
            }
            if let Some(k) = num_recs {
                rec_config.num_recs = k;
            }
            if let Some(threshold) = min_positive_rating {
                rec_config.min_positive_rating = threshold;
            }

            let summary = recommend::run(&rec_config)?;
            println!(
                "{} rows for {} users ({} skipped) -> {}",
                summary.rows_written,
                summary.users_total,
                summary.users_skipped,
                rec_config.output_path().display()
            );
            Ok(())
        }

        cli::Command::Evaluate {
            recs,
            ratings,
            json,
        } => {
            let ratings_path = ratings.unwrap_or(config.recommend.ratings);
            let report = eval::run(&recs, &ratings_path)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("users:                {}", report.users);
                println!("rows:                 {}", report.rows);
                println!("distinct recommended: {}", report.distinct_recommended);
                println!("catalog size:         {}", report.catalog_size);
                println!("catalog coverage:     {:.4}", report.catalog_coverage);
                println!("gini index:           {:.4}", report.gini_index);
                println!("novelty:              {:.4}", report.novelty);
                println!("delta gap:            {:+.4}", report.delta_gap);
            }
            Ok(())
        }
    }
}
