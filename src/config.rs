// src/config.rs
//! Pipeline settings. The `Default` impls reproduce the fixed paths and
//! constants the preparation scripts have always run with; a YAML or JSON file
//! can override any subset of fields.

use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use crate::table::ReadOptions;

/// Fill-merge: target file, reference directory, output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    pub target: PathBuf,
    pub source_dir: PathBuf,
    pub output: PathBuf,
    /// Column used to match target rows with reference records.
    pub key: String,
    /// Records read per chunk while indexing reference files.
    pub chunk_size: usize,
    pub read: ReadOptions,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            target: PathBuf::from("delivery/evals_internal_860_2.csv"),
            source_dir: PathBuf::from("nitin"),
            output: PathBuf::from("ready_to_deliver.csv"),
            key: "uid".to_string(),
            chunk_size: 10_000,
            read: ReadOptions::default(),
        }
    }
}

/// Column drop / rename / constant-column settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectionConfig {
    pub drop: Vec<String>,
    /// raw name -> delivery name
    pub rename: BTreeMap<String, String>,
    pub constant_column: String,
    pub constant_value: String,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        let drop = [
            "base_dockerfile",
            "base_image_name",
            "run_script_content",
            "selected_test_files_to_run",
            "parsing_script_content",
            "build_script_content",
            "before_repo_set_cmd",
            "after_repo_set_cmd",
            "instance_dockerfile",
            "before_test_log_cds",
            "after_test_log_cds",
            "before_test_result_cds",
            "after_test_result_cds",
            "fail_to_pass_select",
            "pass_to_pass_select",
            "fail_to_pass_full",
            "pass_to_pass_full",
            "evaluation_time",
            "tar_cds",
        ];
        let rename = [
            ("pr_url", "url_pr"),
            ("pr_message", "initial_problem_statement"),
            ("gold_patch_summary", "golden_patch"),
            ("issue_0", "synthetic_rewrite_problem_statement"),
            ("requirement_0", "synthetic_requirement"),
            ("hint_0", "synthetic_hint"),
            ("plan_0", "synthetic_plan"),
            ("issue_1", "synthetic_rewrite_problem_statement_1"),
            ("requirement_1", "synthetic_requirement_1"),
            ("hint_1", "synthetic_hint_1"),
            ("plan_1", "synthetic_plan_1"),
            ("issue_2", "synthetic_rewrite_problem_statement_2"),
            ("requirement_2", "synthetic_requirement_2"),
            ("hint_2", "synthetic_hint_2"),
            ("plan_2", "synthetic_plan_2"),
            ("gold_patch", "diff"),
            ("test_patch", "test_diff"),
        ];
        Self {
            drop: drop.iter().map(|s| s.to_string()).collect(),
            rename: rename
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            constant_column: "languageCode".to_string(),
            constant_value: "en_US".to_string(),
        }
    }
}

/// Threshold filter plus per-category cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingConfig {
    pub numeric_column: String,
    /// Rows with `numeric_column < threshold` are dropped.
    pub threshold: f64,
    pub category_column: String,
    /// Maximum rows kept per category.
    pub cap: usize,
    pub seed: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            numeric_column: "src_file_lines_added".to_string(),
            threshold: 20.0,
            category_column: "repo_name".to_string(),
            cap: 120,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectStep {
    /// Unset disables the step.
    pub input: Option<PathBuf>,
    /// Output keeps the input's file name.
    pub output_dir: PathBuf,
    pub columns: ProjectionConfig,
}

impl Default for ProjectStep {
    fn default() -> Self {
        Self {
            input: Some(PathBuf::from(
                "nitin/batch_77_data_samples_without_issue.csv",
            )),
            output_dir: PathBuf::from("evals/raw"),
            columns: ProjectionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SampleStep {
    /// Unset disables the step.
    pub input: Option<PathBuf>,
    /// Output is `<input stem>_sampled.csv`.
    pub output_dir: PathBuf,
    pub sampling: SamplingConfig,
}

impl Default for SampleStep {
    fn default() -> Self {
        Self {
            input: Some(PathBuf::from("raw/batch_77_data_samples_with_issue.csv")),
            output_dir: PathBuf::from("evals/sampled"),
            sampling: SamplingConfig::default(),
        }
    }
}

/// Reshape & sample: both steps run independently, projection first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    pub project: ProjectStep,
    pub sample: SampleStep,
    pub read: ReadOptions,
}

/// Load a config from `.yaml`/`.yml` or `.json`; missing fields take defaults.
pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let text =
        fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("parsing YAML config {}", path.display())),
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("parsing JSON config {}", path.display())),
        _ => bail!(
            "unsupported config format {} (expected .yaml, .yml or .json)",
            path.display()
        ),
    }
}
