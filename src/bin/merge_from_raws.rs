// src/bin/merge_from_raws.rs
//! Fill empty cells of the delivery CSV from the raw reference exports,
//! matching rows on `uid`, and write the result as a new CSV.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use sweap_prep::{
    config::{self, MergeConfig},
    logging,
    merge::{self, MergeOutcome},
};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(about = "Fill empty cells of a target CSV from uid-matched reference CSVs")]
struct Args {
    /// YAML or JSON file overriding the built-in settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV whose empty cells get filled
    #[arg(long)]
    target: Option<PathBuf>,

    /// Directory of reference CSVs, scanned in file-name order
    #[arg(long = "source-dir")]
    source_dir: Option<PathBuf>,

    #[arg(long)]
    output: Option<PathBuf>,

    /// Identifier column
    #[arg(long)]
    key: Option<String>,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let mut cfg: MergeConfig = match &args.config {
        Some(path) => config::load(path)?,
        None => MergeConfig::default(),
    };
    if let Some(target) = args.target {
        cfg.target = target;
    }
    if let Some(dir) = args.source_dir {
        cfg.source_dir = dir;
    }
    if let Some(output) = args.output {
        cfg.output = output;
    }
    if let Some(key) = args.key {
        cfg.key = key;
    }

    match merge::run(&cfg)? {
        MergeOutcome::Skipped(reason) => warn!(%reason, "nothing written"),
        MergeOutcome::Completed(summary) => {
            info!("=== SUMMARY ===");
            info!("Input records: {}", summary.input_records);
            info!("Source records in lookup: {}", summary.index_size);
            info!(
                "Source files: {} indexed, {} skipped, {} without `{}`",
                summary.index.files_indexed,
                summary.index.files_skipped,
                summary.index.files_without_key,
                cfg.key
            );
            info!(
                "Rows filled: {} ({} cells)",
                summary.fill.rows_filled, summary.fill.cells_filled
            );
            info!("Output file: {}", summary.output.display());
        }
    }
    Ok(())
}
