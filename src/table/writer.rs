// src/table/writer.rs
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::{fs, io::BufWriter, path::Path};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{Table, Value};

/// Write `table` as CSV with a header row, replacing any file at `path`.
///
/// The data goes to a temp file in the destination directory first and is
/// renamed into place, so readers never observe a half-written file.
pub fn write_table(path: impl AsRef<Path>, table: &Table) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    {
        let mut wtr = WriterBuilder::new().from_writer(BufWriter::new(tmp.as_file_mut()));
        if !table.columns().is_empty() {
            wtr.write_record(table.columns())
                .context("writing CSV header")?;
        }
        for row in table.rows() {
            wtr.write_record(row.iter().map(Value::as_str))
                .context("writing CSV row")?;
        }
        wtr.flush().context("flushing CSV writer")?;
    }

    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("renaming temp file -> {}", path.display()))?;
    debug!(file = %path.display(), rows = table.num_rows(), "wrote table");
    Ok(())
}
