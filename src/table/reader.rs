// src/table/reader.rs
use anyhow::{bail, Context, Result};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::debug;

use super::{ReadOptions, Record, Table, Value};

fn open_csv(path: &Path) -> Result<Reader<File>> {
    ReaderBuilder::new()
        .has_headers(true)
        // short rows are padded, long rows rejected per record
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))
}

fn read_header(rdr: &mut Reader<File>, path: &Path) -> Result<Vec<String>> {
    let headers = rdr
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?;
    Ok(headers.iter().map(str::to_string).collect())
}

fn parse_fields(
    record: &StringRecord,
    width: usize,
    opts: &ReadOptions,
    path: &Path,
) -> Result<Vec<Value>> {
    if record.len() > width {
        let line = record.position().map_or(0, |p| p.line());
        bail!(
            "{}:{}: expected {} fields, saw {}",
            path.display(),
            line,
            width,
            record.len()
        );
    }
    Ok(record
        .iter()
        .map(|raw| Value::parse(raw, &opts.null_tokens))
        .collect())
}

/// Read a whole CSV file into memory.
pub fn read_table(path: impl AsRef<Path>, opts: &ReadOptions) -> Result<Table> {
    let path = path.as_ref();
    let mut rdr = open_csv(path)?;
    let columns = read_header(&mut rdr, path)?;
    let width = columns.len();
    let mut table = Table::new(columns);

    let mut record = StringRecord::new();
    while rdr
        .read_record(&mut record)
        .with_context(|| format!("CSV parse error in {}", path.display()))?
    {
        table.push_row(parse_fields(&record, width, opts, path)?)?;
    }
    debug!(file = %path.display(), rows = table.num_rows(), "read table");
    Ok(table)
}

/// Reads a CSV file `chunk_size` records at a time.
///
/// Only one chunk is materialised at once, which bounds memory when scanning
/// large reference files.
pub struct ChunkedReader {
    path: PathBuf,
    rdr: Reader<File>,
    columns: Arc<[String]>,
    chunk_size: usize,
    opts: ReadOptions,
    done: bool,
}

impl ChunkedReader {
    pub fn open(path: impl AsRef<Path>, chunk_size: usize, opts: &ReadOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut rdr = open_csv(&path)?;
        let columns = read_header(&mut rdr, &path)?;
        Ok(Self {
            path,
            rdr,
            columns: columns.into(),
            chunk_size: chunk_size.max(1),
            opts: opts.clone(),
            done: false,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Next batch of up to `chunk_size` records, or `None` at end of file.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<Record>>> {
        if self.done {
            return Ok(None);
        }
        let width = self.columns.len();
        let mut chunk = Vec::with_capacity(self.chunk_size);
        let mut record = StringRecord::new();
        while chunk.len() < self.chunk_size {
            let more = self
                .rdr
                .read_record(&mut record)
                .with_context(|| format!("CSV parse error in {}", self.path.display()))?;
            if !more {
                self.done = true;
                break;
            }
            let values = parse_fields(&record, width, &self.opts, &self.path)?;
            chunk.push(Record::new(Arc::clone(&self.columns), values)?);
        }
        if chunk.is_empty() {
            return Ok(None);
        }
        Ok(Some(chunk))
    }
}

impl Iterator for ChunkedReader {
    type Item = Result<Vec<Record>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => {
                // a parse error ends the stream
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_read_table_pads_short_rows() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.csv");
        fs::write(&path, "uid,name,score\nA1,Bob,5\nA2,\nA3,NaN,7\n")?;

        let table = read_table(&path, &ReadOptions::default())?;
        assert_eq!(table.columns(), ["uid", "name", "score"]);
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.cell(1, "score"), Some(&Value::Empty));
        assert_eq!(table.cell(2, "name"), Some(&Value::Empty));
        assert_eq!(table.cell(2, "score").and_then(Value::as_f64), Some(7.0));
        Ok(())
    }

    #[test]
    fn test_read_table_rejects_long_rows() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.csv");
        fs::write(&path, "a,b\n1,2\n1,2,3\n")?;
        assert!(read_table(&path, &ReadOptions::default()).is_err());
        Ok(())
    }

    #[test]
    fn test_chunked_reader_batches() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("big.csv");
        let mut body = String::from("uid,v\n");
        for i in 0..25 {
            body.push_str(&format!("u{},{}\n", i, i));
        }
        fs::write(&path, body)?;

        let reader = ChunkedReader::open(&path, 10, &ReadOptions::default())?;
        assert!(reader.has_column("uid"));
        let sizes: Vec<usize> = reader
            .map(|chunk| chunk.map(|c| c.len()))
            .collect::<Result<_>>()?;
        assert_eq!(sizes, vec![10, 10, 5]);
        Ok(())
    }

    #[test]
    fn test_chunked_reader_stops_after_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.csv");
        fs::write(&path, "uid,v\na,1\nb,2,3\nc,4\n")?;

        let mut reader = ChunkedReader::open(&path, 1, &ReadOptions::default())?;
        assert_eq!(reader.next().map(|c| c.map(|c| c.len()).ok()), Some(Some(1)));
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
        Ok(())
    }

    #[test]
    fn test_chunked_reader_missing_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(ChunkedReader::open(missing, 10, &ReadOptions::default()).is_err());
    }
}
