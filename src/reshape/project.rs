// src/reshape/project.rs
use std::collections::HashSet;
use tracing::debug;

use crate::config::ProjectionConfig;
use crate::table::{Table, Value};

/// Drop, rename, then set the constant column.
///
/// Dropping a column that is not there is a no-op. The constant column is
/// appended unless a column of that name already exists, in which case its
/// values are replaced in place.
pub fn project_columns(table: Table, cfg: &ProjectionConfig) -> Table {
    let (columns, rows) = table.into_parts();
    let drop: HashSet<&str> = cfg.drop.iter().map(String::as_str).collect();
    let keep: Vec<bool> = columns.iter().map(|c| !drop.contains(c.as_str())).collect();

    let mut out_columns: Vec<String> = columns
        .into_iter()
        .zip(&keep)
        .filter(|(_, k)| **k)
        .map(|(c, _)| cfg.rename.get(&c).cloned().unwrap_or(c))
        .collect();

    let mut out_rows: Vec<Vec<Value>> = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v)
                .collect()
        })
        .collect();

    let constant = Value::from(cfg.constant_value.as_str());
    match out_columns.iter().position(|c| *c == cfg.constant_column) {
        Some(pos) => {
            for row in &mut out_rows {
                row[pos] = constant.clone();
            }
        }
        None => {
            out_columns.push(cfg.constant_column.clone());
            for row in &mut out_rows {
                row.push(constant.clone());
            }
        }
    }

    debug!(
        dropped = keep.iter().filter(|k| !**k).count(),
        columns = out_columns.len(),
        "projected columns"
    );
    Table::from_parts_unchecked(out_columns, out_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::BTreeMap;

    fn cfg() -> ProjectionConfig {
        ProjectionConfig {
            drop: vec!["tar_cds".into(), "not_present".into()],
            rename: BTreeMap::from([
                ("pr_url".to_string(), "url_pr".to_string()),
                ("gold_patch".to_string(), "diff".to_string()),
            ]),
            constant_column: "languageCode".into(),
            constant_value: "en_US".into(),
        }
    }

    #[test]
    fn test_drop_rename_append() -> Result<()> {
        let table = Table::from_rows(
            &["uid", "pr_url", "tar_cds", "gold_patch"],
            &[&["1", "http://x", "blob", "+a"], &["2", "", "blob", ""]],
        )?;

        let out = project_columns(table, &cfg());
        assert_eq!(out.columns(), ["uid", "url_pr", "diff", "languageCode"]);
        assert_eq!(out.num_rows(), 2);
        assert_eq!(out.cell(0, "url_pr"), Some(&Value::from("http://x")));
        assert_eq!(out.cell(1, "diff"), Some(&Value::Empty));
        assert!(out
            .rows()
            .iter()
            .all(|r| r[3] == Value::from("en_US")));
        Ok(())
    }

    #[test]
    fn test_existing_constant_column_overwritten_in_place() -> Result<()> {
        let table = Table::from_rows(&["languageCode", "uid"], &[&["fr_FR", "1"], &["", "2"]])?;
        let out = project_columns(table, &cfg());
        assert_eq!(out.columns(), ["languageCode", "uid"]);
        assert_eq!(out.cell(0, "languageCode"), Some(&Value::from("en_US")));
        assert_eq!(out.cell(1, "languageCode"), Some(&Value::from("en_US")));
        Ok(())
    }

    #[test]
    fn test_default_projection_on_raw_header() -> Result<()> {
        let defaults = ProjectionConfig::default();
        let mut header: Vec<&str> = vec!["uid", "repo_name"];
        header.extend(defaults.drop.iter().map(String::as_str));
        header.extend(defaults.rename.keys().map(String::as_str));
        let row: Vec<&str> = header.iter().map(|_| "v").collect();
        let table = Table::from_rows(&header, &[row.as_slice()])?;

        let out = project_columns(table, &defaults);
        assert_eq!(out.columns().len(), 2 + defaults.rename.len() + 1);
        for dropped in &defaults.drop {
            assert!(out.column_index(dropped).is_none());
        }
        for renamed in defaults.rename.values() {
            assert!(out.column_index(renamed).is_some());
        }
        Ok(())
    }
}
