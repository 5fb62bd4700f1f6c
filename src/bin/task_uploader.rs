// src/bin/task_uploader.rs
//! Reshape a raw batch export into the delivery column layout, and draw the
//! per-repository sample from an issue batch.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use sweap_prep::{
    config::{self, UploadConfig},
    logging, reshape,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(about = "Drop/rename export columns and take a stratified sample")]
struct Args {
    /// YAML or JSON file overriding the built-in settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Export to reshape
    #[arg(long = "project-input")]
    project_input: Option<PathBuf>,

    #[arg(long = "project-out-dir")]
    project_out_dir: Option<PathBuf>,

    /// Export to sample
    #[arg(long = "sample-input")]
    sample_input: Option<PathBuf>,

    #[arg(long = "sample-out-dir")]
    sample_out_dir: Option<PathBuf>,

    #[arg(long)]
    skip_project: bool,

    #[arg(long)]
    skip_sample: bool,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let mut cfg: UploadConfig = match &args.config {
        Some(path) => config::load(path)?,
        None => UploadConfig::default(),
    };
    if args.project_input.is_some() {
        cfg.project.input = args.project_input;
    }
    if let Some(dir) = args.project_out_dir {
        cfg.project.output_dir = dir;
    }
    if args.sample_input.is_some() {
        cfg.sample.input = args.sample_input;
    }
    if let Some(dir) = args.sample_out_dir {
        cfg.sample.output_dir = dir;
    }
    if args.skip_project {
        cfg.project.input = None;
    }
    if args.skip_sample {
        cfg.sample.input = None;
    }

    let summary = reshape::run(&cfg)?;

    if let Some(p) = &summary.projected {
        info!(
            "projected {} rows x {} columns -> {}",
            p.rows,
            p.columns,
            p.output.display()
        );
    }
    if let Some(s) = &summary.sampled {
        info!("distribution after sampling:");
        for c in &s.report.per_category {
            info!("  {:<40} {:>6} / {:<6}", c.category, c.selected, c.eligible);
        }
        info!(
            "original {} rows, {} after filter, {} sampled -> {}",
            s.report.rows_in,
            s.report.rows_after_filter,
            s.report.rows_out,
            s.output.display()
        );
    }
    Ok(())
}
