// src/reshape/mod.rs
//! Reshape & sample: column projection of one export and a stratified,
//! thresholded sample of another.

pub mod project;
pub mod sample;

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::config::{ProjectStep, SampleStep, UploadConfig};
use crate::table::{read_table, write_table, ReadOptions};

pub use project::project_columns;
pub use sample::{stratified_sample, CategoryCount, SampleReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub output: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSummary {
    pub output: PathBuf,
    pub report: SampleReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub projected: Option<ProjectSummary>,
    pub sampled: Option<SampleSummary>,
}

/// Run every enabled step. No guard clauses: a missing file or column fails
/// the run.
pub fn run(cfg: &UploadConfig) -> Result<UploadSummary> {
    let projected = cfg
        .project
        .input
        .as_deref()
        .map(|input| project_file(input, &cfg.project, &cfg.read))
        .transpose()?;
    let sampled = cfg
        .sample
        .input
        .as_deref()
        .map(|input| sample_file(input, &cfg.sample, &cfg.read))
        .transpose()?;
    Ok(UploadSummary { projected, sampled })
}

fn file_name(input: &Path) -> Result<&str> {
    input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("input path {} has no file name", input.display()))
}

/// Project `input` into `step.output_dir`, keeping the file name.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn project_file(
    input: &Path,
    step: &ProjectStep,
    read: &ReadOptions,
) -> Result<ProjectSummary> {
    let output = step.output_dir.join(file_name(input)?);
    let table = read_table(input, read)?;
    let projected = project_columns(table, &step.columns);
    write_table(&output, &projected)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(output = %output.display(), rows = projected.num_rows(), "saved projected table");
    Ok(ProjectSummary {
        output,
        rows: projected.num_rows(),
        columns: projected.columns().len(),
    })
}

/// Sample `input` into `step.output_dir/<stem>_sampled.csv`.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn sample_file(
    input: &Path,
    step: &SampleStep,
    read: &ReadOptions,
) -> Result<SampleSummary> {
    let name = file_name(input)?;
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    let output = step.output_dir.join(format!("{}_sampled.csv", stem));

    let table = read_table(input, read)?;
    let (sampled, report) = stratified_sample(&table, &step.sampling)
        .with_context(|| format!("sampling {}", input.display()))?;
    write_table(&output, &sampled)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(output = %output.display(), rows = report.rows_out, "saved sampled dataset");
    Ok(SampleSummary { output, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_run_both_steps() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        let raw_input = root.join("batch_without_issue.csv");
        fs::write(
            &raw_input,
            "uid,pr_url,tar_cds,evaluation_time\n1,http://a,x,3\n",
        )?;
        let sample_input = root.join("batch_with_issue.csv");
        fs::write(
            &sample_input,
            "uid,repo_name,src_file_lines_added\n1,r1,25\n2,r1,5\n3,r2,40\n",
        )?;

        let mut cfg = UploadConfig::default();
        cfg.project.input = Some(raw_input);
        cfg.project.output_dir = root.join("raw");
        cfg.sample.input = Some(sample_input);
        cfg.sample.output_dir = root.join("sampled");

        let summary = run(&cfg)?;
        let projected = summary.projected.expect("projection ran");
        assert_eq!(projected.output, root.join("raw").join("batch_without_issue.csv"));
        assert_eq!(
            fs::read_to_string(&projected.output)?,
            "uid,url_pr,languageCode\n1,http://a,en_US\n"
        );

        let sampled = summary.sampled.expect("sampling ran");
        assert_eq!(
            sampled.output,
            root.join("sampled").join("batch_with_issue_sampled.csv")
        );
        assert_eq!(sampled.report.rows_out, 2);
        assert_eq!(
            fs::read_to_string(&sampled.output)?,
            "uid,repo_name,src_file_lines_added\n1,r1,25\n3,r2,40\n"
        );
        Ok(())
    }

    #[test]
    fn test_disabled_steps_and_missing_input() -> Result<()> {
        let dir = tempdir()?;
        let mut cfg = UploadConfig::default();
        cfg.project.input = None;
        cfg.sample.input = None;
        assert_eq!(run(&cfg)?, UploadSummary::default());

        cfg.sample.input = Some(dir.path().join("absent.csv"));
        cfg.sample.output_dir = dir.path().join("out");
        assert!(run(&cfg).is_err());
        Ok(())
    }
}
