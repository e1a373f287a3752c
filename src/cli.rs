use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the config file (created with defaults when missing)
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute top-K content-based recommendations for every user
    Recommend {
        /// Override the configured output directory
        #[clap(long)]
        output_dir: Option<PathBuf>,

        /// Override the number of recommendations per user
        #[clap(short = 'k', long)]
        num_recs: Option<usize>,

        /// Override the positivity threshold
        #[clap(long)]
        min_positive_rating: Option<f32>,
    },
    /// Compute aggregate statistics over a recommendations table
    Evaluate {
        /// Recommendations CSV produced by `recommend`
        #[clap(long)]
        recs: PathBuf,

        /// Ratings CSV (defaults to the configured ratings table)
        #[clap(long)]
        ratings: Option<PathBuf>,

        /// Print the report as JSON
        #[clap(long, default_value = "false")]
        json: bool,
    },
}
