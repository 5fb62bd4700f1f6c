// src/table/mod.rs
//! Typed in-memory tables read from and written to CSV.
//!
//! A cell is a [`Value`]; emptiness is decided once, at parse time, so the
//! pipelines never have to guess whether `""`, `NaN` or `NULL` means "missing".

pub mod reader;
pub mod writer;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use reader::{read_table, ChunkedReader};
pub use writer::write_table;

/// One CSV cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Empty string or a configured null token.
    Empty,
    /// A finite numeric literal. `raw` is the text as read, so writing it back
    /// reproduces the input byte for byte.
    Number { raw: String, value: f64 },
    Text(String),
}

impl Value {
    /// Classify a raw cell. `null_tokens` are compared against the untrimmed text.
    pub fn parse(raw: &str, null_tokens: &[String]) -> Self {
        if raw.is_empty() || null_tokens.iter().any(|t| t == raw) {
            return Value::Empty;
        }
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Value::Number {
                raw: raw.to_string(),
                value,
            },
            _ => Value::Text(raw.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Text as it is written to CSV; `Empty` renders as `""`.
    pub fn as_str(&self) -> &str {
        match self {
            Value::Empty => "",
            Value::Number { raw, .. } => raw,
            Value::Text(s) => s,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number { value, .. } => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    /// Parse with only the empty string treated as missing.
    fn from(raw: &str) -> Self {
        Value::parse(raw, &[])
    }
}

/// How raw CSV text is turned into [`Value`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadOptions {
    /// Cell texts read as [`Value::Empty`] in addition to the empty string.
    pub null_tokens: Vec<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        let tokens = [
            "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A",
            "<NA>",
        ];
        Self {
            null_tokens: tokens.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ReadOptions {
    /// Only the empty string counts as missing.
    pub fn strict() -> Self {
        Self {
            null_tokens: Vec::new(),
        }
    }
}

/// A row detached from its table, keyed by column name.
///
/// Records read from the same file share one header allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    /// `values` shorter than `columns` are padded with [`Value::Empty`].
    pub fn new(columns: Arc<[String]>, mut values: Vec<Value>) -> Result<Self> {
        if values.len() > columns.len() {
            bail!(
                "record has {} fields but header has {} columns",
                values.len(),
                columns.len()
            );
        }
        values.resize(columns.len(), Value::Empty);
        Ok(Self { columns, values })
    }

    /// Build a record from `(column, raw text)` pairs, treating only `""` as empty.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(c, v)| (c.to_string(), Value::from(v)))
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    /// Value of `column`, or `None` when the record has no such column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Header shared by every record read from the same file.
    pub fn header(&self) -> &Arc<[String]> {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Ordered columns plus rows; every row holds exactly one value per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from string literals; handy for fixtures.
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        let mut table = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|v| Value::from(*v)).collect())?;
        }
        Ok(table)
    }

    /// Append a row, padding a short one with [`Value::Empty`].
    pub fn push_row(&mut self, mut row: Vec<Value>) -> Result<()> {
        if row.len() > self.columns.len() {
            bail!(
                "row {} has {} fields but table has {} columns",
                self.rows.len(),
                row.len(),
                self.columns.len()
            );
        }
        row.resize(self.columns.len(), Value::Empty);
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Position of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| anyhow!("column `{}` not found", name))
    }

    /// Cell at (`row`, `column`), if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Value>] {
        &mut self.rows
    }

    /// Caller guarantees every row is exactly `columns.len()` wide.
    pub(crate) fn from_parts_unchecked(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }
}
