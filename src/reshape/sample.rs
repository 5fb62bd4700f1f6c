// src/reshape/sample.rs
use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::config::SamplingConfig;
use crate::table::{Table, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub eligible: usize,
    pub selected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleReport {
    pub rows_in: usize,
    pub rows_after_filter: usize,
    /// Eligible rows dropped because their category cell is empty.
    pub rows_without_category: usize,
    pub rows_out: usize,
    /// In category visitation order.
    pub per_category: Vec<CategoryCount>,
}

/// Keep rows whose numeric column reaches the threshold, then cap each
/// category at `cfg.cap` rows.
///
/// Categories are visited in order of first appearance. A category at or
/// under the cap keeps all its rows in input order; a larger one is sampled
/// with a fresh `StdRng` seeded from `cfg.seed`, and its rows come out in
/// sampled order. Same table and seed, same output.
pub fn stratified_sample(table: &Table, cfg: &SamplingConfig) -> Result<(Table, SampleReport)> {
    let num_idx = table.require_column(&cfg.numeric_column)?;
    let cat_idx = table.require_column(&cfg.category_column)?;

    let mut report = SampleReport {
        rows_in: table.num_rows(),
        ..SampleReport::default()
    };

    // category -> row positions, in first-seen order
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for (i, row) in table.rows().iter().enumerate() {
        let passes = match &row[num_idx] {
            Value::Empty => false,
            Value::Number { value, .. } => *value >= cfg.threshold,
            Value::Text(raw) => bail!(
                "row {}: `{}` is not numeric in column `{}`",
                i,
                raw,
                cfg.numeric_column
            ),
        };
        if !passes {
            continue;
        }
        report.rows_after_filter += 1;

        let category = &row[cat_idx];
        if category.is_empty() {
            report.rows_without_category += 1;
            continue;
        }
        let pos = *slot.entry(category.as_str()).or_insert_with(|| {
            groups.push((category.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[pos].1.push(i);
    }

    info!(
        rows_in = report.rows_in,
        rows_after_filter = report.rows_after_filter,
        filtered_out = report.rows_in - report.rows_after_filter,
        "applied {} >= {}",
        cfg.numeric_column,
        cfg.threshold
    );
    if report.rows_without_category > 0 {
        warn!(
            rows = report.rows_without_category,
            column = %cfg.category_column,
            "dropping rows with empty category"
        );
    }

    let mut selected: Vec<usize> = Vec::new();
    for (category, rows) in &groups {
        let picked: Vec<usize> = if rows.len() <= cfg.cap {
            info!(category, "taking all {} rows", rows.len());
            rows.clone()
        } else {
            let mut rng = StdRng::seed_from_u64(cfg.seed);
            info!(category, "sampled {} out of {} rows", cfg.cap, rows.len());
            index::sample(&mut rng, rows.len(), cfg.cap)
                .into_iter()
                .map(|j| rows[j])
                .collect()
        };
        report.per_category.push(CategoryCount {
            category: category.to_string(),
            eligible: rows.len(),
            selected: picked.len(),
        });
        selected.extend(picked);
    }

    let out_rows = selected.iter().map(|&i| table.rows()[i].clone()).collect();
    let out = Table::from_parts_unchecked(table.columns().to_vec(), out_rows);
    report.rows_out = out.num_rows();
    info!(rows_out = report.rows_out, "sampled dataset size");
    Ok((out, report))
}
