// src/merge/fill.rs
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::SourceIndex;
use crate::table::Table;

const PROGRESS_EVERY: usize = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub rows_total: usize,
    /// Rows whose identifier was found in the index.
    pub rows_matched: usize,
    /// Rows that received at least one value.
    pub rows_filled: usize,
    pub cells_filled: usize,
}

/// For each target column, its position in `source` (first match), if any.
fn column_map(target: &[String], source: &[String]) -> Vec<Option<usize>> {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(source.len());
    for (i, name) in source.iter().enumerate() {
        positions.entry(name.as_str()).or_insert(i);
    }
    target
        .iter()
        .map(|name| positions.get(name.as_str()).copied())
        .collect()
}

/// Fill every empty cell of `target` from the index record that shares the
/// row's identifier, when that record holds a non-empty value for the same
/// column.
///
/// Non-empty cells are never touched; rows, columns and row order are kept.
/// A target without the identifier column comes back unchanged.
pub fn fill_gaps(mut target: Table, index: &SourceIndex) -> (Table, FillReport) {
    let mut report = FillReport {
        rows_total: target.num_rows(),
        ..FillReport::default()
    };
    let Some(key_idx) = target.column_index(index.key()) else {
        warn!(key = %index.key(), "target has no identifier column; nothing filled");
        return (target, report);
    };
    info!(rows = report.rows_total, "filling empty values");

    // records of one source file share a header, so one map per file
    let mut maps: HashMap<*const String, Vec<Option<usize>>> = HashMap::new();
    let columns: Vec<String> = target.columns().to_vec();

    for (i, row) in target.rows_mut().iter_mut().enumerate() {
        if i % PROGRESS_EVERY == 0 && i > 0 {
            info!(
                "processing record {}/{} ({:.1}%)",
                i,
                report.rows_total,
                i as f64 / report.rows_total as f64 * 100.0
            );
        }

        let id = &row[key_idx];
        if id.is_empty() {
            continue;
        }
        let Some(source) = index.get(id.as_str()) else {
            continue;
        };
        report.rows_matched += 1;

        let header = source.header();
        let map = maps
            .entry(Arc::as_ptr(header) as *const String)
            .or_insert_with(|| column_map(&columns, header));
        let values = source.values();

        let mut filled = 0;
        for (cell, pos) in row.iter_mut().zip(map.iter()) {
            if !cell.is_empty() {
                continue;
            }
            if let Some(value) = pos.map(|j| &values[j]).filter(|v| !v.is_empty()) {
                *cell = value.clone();
                filled += 1;
            }
        }
        if filled > 0 {
            report.rows_filled += 1;
            report.cells_filled += filled;
        }
    }

    info!(
        rows_filled = report.rows_filled,
        cells_filled = report.cells_filled,
        "filled empty values"
    );
    (target, report)
}
