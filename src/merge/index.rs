// src/merge/index.rs
use anyhow::{Context, Result};
use glob::{glob_with, MatchOptions, Pattern};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tracing::{error, info, instrument, warn};

use crate::config::MergeConfig;
use crate::table::{ChunkedReader, Record};

/// Identifier -> most recently scanned record carrying it.
///
/// Merge policy: a later insert for the same identifier replaces the earlier
/// record whole. Fields are never mixed across records.
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    key: String,
    records: HashMap<String, Record>,
}

impl SourceIndex {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            records: HashMap::new(),
        }
    }

    /// Name of the identifier column.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    /// Insert or replace; returns the record that was superseded.
    pub fn insert(&mut self, id: impl Into<String>, record: Record) -> Option<Record> {
        self.records.insert(id.into(), record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Counters collected while indexing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub files_found: usize,
    pub files_indexed: usize,
    /// Files that failed to open or parse.
    pub files_skipped: usize,
    /// Files read fine but lacking the identifier column.
    pub files_without_key: usize,
    pub rows_indexed: usize,
    pub rows_without_key: usize,
}

/// `*.csv` files directly inside `dir` (case-insensitive), sorted by file name.
/// Dot files are not matched.
///
/// The sort fixes which file wins when identifiers repeat across files.
pub fn list_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.csv", Pattern::escape(&dir.to_string_lossy()));
    let opts = MatchOptions {
        case_sensitive: false,
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let mut files: Vec<PathBuf> = glob_with(&pattern, opts)
        .with_context(|| format!("bad glob pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Rows from one file, deduplicated within the file (last row wins).
struct FileStage {
    records: HashMap<String, Record>,
    rows_without_key: usize,
    has_key: bool,
}

fn stage_file(path: &Path, cfg: &MergeConfig) -> Result<FileStage> {
    let reader = ChunkedReader::open(path, cfg.chunk_size, &cfg.read)?;
    let mut stage = FileStage {
        records: HashMap::new(),
        rows_without_key: 0,
        has_key: reader.has_column(&cfg.key),
    };
    if !stage.has_key {
        return Ok(stage);
    }

    for chunk in reader {
        for record in chunk? {
            let id = match record.get(&cfg.key) {
                Some(v) if !v.is_empty() => v.as_str().to_string(),
                _ => {
                    stage.rows_without_key += 1;
                    continue;
                }
            };
            stage.records.insert(id, record);
        }
    }
    Ok(stage)
}

/// Scan every CSV in `dir` and index its rows by `cfg.key`.
///
/// A file that cannot be read is logged and skipped as a whole; nothing it
/// contained reaches the index.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub fn build_source_index(dir: &Path, cfg: &MergeConfig) -> Result<(SourceIndex, IndexReport)> {
    let files = list_source_files(dir)?;
    info!(count = files.len(), "found source CSV files");

    let mut index = SourceIndex::new(cfg.key.clone());
    let mut report = IndexReport {
        files_found: files.len(),
        ..IndexReport::default()
    };

    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!(file = %name, "processing");

        let stage = match stage_file(path, cfg) {
            Ok(stage) => stage,
            Err(e) => {
                error!(file = %name, error = %format!("{e:#}"), "skipping unreadable file");
                report.files_skipped += 1;
                continue;
            }
        };

        if !stage.has_key {
            warn!(file = %name, key = %cfg.key, "no identifier column; nothing indexed");
            report.files_without_key += 1;
            continue;
        }

        let rows = stage.records.len();
        report.rows_without_key += stage.rows_without_key;
        report.rows_indexed += rows;
        report.files_indexed += 1;
        for (id, record) in stage.records {
            index.insert(id, record);
        }
        info!(file = %name, rows, "completed");
    }

    info!(records = index.len(), "total records loaded");
    Ok((index, report))
}
