// src/merge/mod.rs
//! Fill-merge: complete a target table from reference CSVs keyed by identifier.

pub mod fill;
pub mod index;

use anyhow::{Context, Result};
use std::{fmt, path::PathBuf};
use tracing::{error, info, instrument};

use crate::config::MergeConfig;
use crate::table::{read_table, write_table};

pub use fill::{fill_gaps, FillReport};
pub use index::{build_source_index, list_source_files, IndexReport, SourceIndex};

/// Why a run stopped before writing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TargetMissing(PathBuf),
    SourceDirMissing(PathBuf),
    EmptyIndex(PathBuf),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TargetMissing(p) => write!(f, "target file not found: {}", p.display()),
            SkipReason::SourceDirMissing(p) => {
                write!(f, "source directory not found: {}", p.display())
            }
            SkipReason::EmptyIndex(p) => {
                write!(f, "no records loaded from {}", p.display())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub input_records: usize,
    pub index_size: usize,
    pub index: IndexReport,
    pub fill: FillReport,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Skipped(SkipReason),
    Completed(MergeSummary),
}

/// Run the whole fill-merge.
///
/// Missing inputs or an empty index are logged and reported as
/// [`MergeOutcome::Skipped`]; any other failure is logged and returned.
#[instrument(level = "info", skip_all, fields(target = %cfg.target.display()))]
pub fn run(cfg: &MergeConfig) -> Result<MergeOutcome> {
    if !cfg.target.is_file() {
        let reason = SkipReason::TargetMissing(cfg.target.clone());
        error!("{}", reason);
        return Ok(MergeOutcome::Skipped(reason));
    }
    if !cfg.source_dir.is_dir() {
        let reason = SkipReason::SourceDirMissing(cfg.source_dir.clone());
        error!("{}", reason);
        return Ok(MergeOutcome::Skipped(reason));
    }

    match merge(cfg) {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            error!(error = %format!("{e:#}"), "merge failed");
            Err(e)
        }
    }
}

fn merge(cfg: &MergeConfig) -> Result<MergeOutcome> {
    let (index, index_report) = build_source_index(&cfg.source_dir, cfg)?;
    if index.is_empty() {
        let reason = SkipReason::EmptyIndex(cfg.source_dir.clone());
        error!("{}", reason);
        return Ok(MergeOutcome::Skipped(reason));
    }

    info!(file = %cfg.target.display(), "loading target");
    let target = read_table(&cfg.target, &cfg.read)
        .with_context(|| format!("loading target {}", cfg.target.display()))?;
    let input_records = target.num_rows();
    info!(rows = input_records, "loaded target");

    let (filled, fill_report) = fill_gaps(target, &index);

    info!(file = %cfg.output.display(), "saving results");
    write_table(&cfg.output, &filled)
        .with_context(|| format!("writing {}", cfg.output.display()))?;

    let summary = MergeSummary {
        input_records,
        index_size: index.len(),
        index: index_report,
        fill: fill_report,
        output: cfg.output.clone(),
    };
    info!(
        input_records = summary.input_records,
        source_records = summary.index_size,
        rows_filled = summary.fill.rows_filled,
        output = %summary.output.display(),
        "merge complete"
    );
    Ok(MergeOutcome::Completed(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ReadOptions;
    use std::fs;
    use tempfile::tempdir;

    fn cfg_in(root: &std::path::Path) -> MergeConfig {
        MergeConfig {
            target: root.join("target.csv"),
            source_dir: root.join("sources"),
            output: root.join("out").join("delivered.csv"),
            ..MergeConfig::default()
        }
    }

    #[test]
    fn test_run_end_to_end() -> Result<()> {
        let dir = tempdir()?;
        let cfg = cfg_in(dir.path());
        fs::create_dir(&cfg.source_dir)?;
        fs::write(
            &cfg.target,
            "uid,name,score,extra\nA1,,5,x\nA2,NaN,,\nA3,,,\n",
        )?;
        fs::write(
            cfg.source_dir.join("01.csv"),
            "uid,name,score\nA1,Bob,\nA2,Ann,3\n",
        )?;
        fs::write(cfg.source_dir.join("02.csv"), "uid,name,score\nA2,Anna,4\n")?;

        let summary = match run(&cfg)? {
            MergeOutcome::Completed(s) => s,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(summary.input_records, 3);
        assert_eq!(summary.index_size, 2);
        assert_eq!(summary.fill.rows_filled, 2);

        let text = fs::read_to_string(&cfg.output)?;
        assert_eq!(
            text,
            "uid,name,score,extra\nA1,Bob,5,x\nA2,Anna,4,\nA3,,,\n"
        );

        let out = read_table(&cfg.output, &ReadOptions::default())?;
        assert_eq!(out.num_rows(), 3);
        Ok(())
    }

    #[test]
    fn test_run_skips_on_missing_inputs() -> Result<()> {
        let dir = tempdir()?;
        let cfg = cfg_in(dir.path());

        assert_eq!(
            run(&cfg)?,
            MergeOutcome::Skipped(SkipReason::TargetMissing(cfg.target.clone()))
        );

        fs::write(&cfg.target, "uid\nA\n")?;
        assert_eq!(
            run(&cfg)?,
            MergeOutcome::Skipped(SkipReason::SourceDirMissing(cfg.source_dir.clone()))
        );

        fs::create_dir(&cfg.source_dir)?;
        assert_eq!(
            run(&cfg)?,
            MergeOutcome::Skipped(SkipReason::EmptyIndex(cfg.source_dir.clone()))
        );
        assert!(!cfg.output.exists());
        Ok(())
    }

    #[test]
    fn test_run_target_without_key_written_unchanged() -> Result<()> {
        let dir = tempdir()?;
        let cfg = cfg_in(dir.path());
        fs::create_dir(&cfg.source_dir)?;
        fs::write(cfg.source_dir.join("s.csv"), "uid,v\nA,1\n")?;
        fs::write(&cfg.target, "id,v\nA,\n")?;

        let summary = match run(&cfg)? {
            MergeOutcome::Completed(s) => s,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(summary.input_records, 1);
        assert_eq!(summary.fill.rows_filled, 0);
        assert_eq!(fs::read_to_string(&cfg.output)?, "id,v\nA,\n");
        Ok(())
    }

    #[test]
    fn test_run_propagates_target_errors() -> Result<()> {
        let dir = tempdir()?;
        let cfg = cfg_in(dir.path());
        fs::create_dir(&cfg.source_dir)?;
        fs::write(cfg.source_dir.join("s.csv"), "uid,v\nA,1\n")?;
        // second row has more fields than the header
        fs::write(&cfg.target, "uid,v\nA,\nB,1,extra\n")?;

        assert!(run(&cfg).is_err());
        assert!(!cfg.output.exists());
        Ok(())
    }
}
