//! Columnar table files.
//!
//! A table file is a single JSON document:
//!
//! ```json
//! {
//!   "format": "surveysim-weather",
//!   "version": 1,
//!   "meta": { ... },
//!   "checksum": "<sha256 of the serialized columns>",
//!   "columns": { "mjd": [...], ... }
//! }
//! ```
//!
//! The `format` tag names the table kind so that a weather file cannot be
//! restored as a night plan and vice versa.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use super::checksum::calculate_checksum;
use crate::error::{Result, SurveyError};

/// Layout version written by [`write_table`].
pub const TABLE_FILE_VERSION: u32 = 1;

#[derive(Serialize)]
struct TableFileRef<'a, M, C> {
    format: &'a str,
    version: u32,
    meta: &'a M,
    checksum: String,
    columns: &'a C,
}

#[derive(Deserialize)]
struct TableFile<M, C> {
    format: String,
    version: u32,
    meta: M,
    checksum: String,
    columns: C,
}

fn columns_checksum<C: Serialize>(columns: &C) -> Result<String> {
    Ok(calculate_checksum(&serde_json::to_string(columns)?))
}

/// Write a table file.
///
/// Fails with an I/O error of kind `AlreadyExists` when `path` exists and
/// `overwrite` is false. Missing parent directories are created.
pub fn write_table<M, C>(
    path: &Path,
    format: &str,
    meta: &M,
    columns: &C,
    overwrite: bool,
) -> Result<()>
where
    M: Serialize,
    C: Serialize,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let file = options.open(path).map_err(|e| {
        if e.kind() == ErrorKind::AlreadyExists {
            SurveyError::Io(std::io::Error::new(
                ErrorKind::AlreadyExists,
                format!("{} exists and overwrite is false", path.display()),
            ))
        } else {
            SurveyError::Io(e)
        }
    })?;

    let table = TableFileRef {
        format,
        version: TABLE_FILE_VERSION,
        meta,
        checksum: columns_checksum(columns)?,
        columns,
    };

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &table)?;
    writer.flush()?;
    Ok(())
}

/// Read a table file written by [`write_table`] with the same `format` tag.
///
/// The format tag, layout version and column checksum are all verified.
pub fn read_table<M, C>(path: &Path, format: &str) -> Result<(M, C)>
where
    M: DeserializeOwned,
    C: DeserializeOwned + Serialize,
{
    let reader = BufReader::new(File::open(path)?);
    let table: TableFile<M, C> = serde_json::from_reader(reader)?;

    if table.format != format {
        return Err(SurveyError::format(format!(
            "{}: expected format {:?}, found {:?}",
            path.display(),
            format,
            table.format
        )));
    }

    if table.version != TABLE_FILE_VERSION {
        return Err(SurveyError::format(format!(
            "{}: unsupported version {} (expected {})",
            path.display(),
            table.version,
            TABLE_FILE_VERSION
        )));
    }

    let checksum = columns_checksum(&table.columns)?;
    if checksum != table.checksum {
        return Err(SurveyError::format(format!(
            "{}: column checksum mismatch",
            path.display()
        )));
    }

    Ok((table.meta, table.columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Meta {
        steps: usize,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Columns {
        mjd: Vec<f64>,
        seeing: Vec<f32>,
    }

    fn sample() -> (Meta, Columns) {
        (
            Meta { steps: 288 },
            Columns {
                mjd: vec![58849.791_666_666_664, 58849.795_138_888_89],
                seeing: vec![1.137_2, 0.981],
            },
        )
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.json");
        let (meta, columns) = sample();

        write_table(&path, "test-table", &meta, &columns, false).unwrap();
        let (meta_back, columns_back): (Meta, Columns) = read_table(&path, "test-table").unwrap();

        assert_eq!(meta_back, meta);
        assert_eq!(columns_back, columns);
    }

    #[test]
    fn test_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.json");
        let (meta, columns) = sample();

        write_table(&path, "test-table", &meta, &columns, false).unwrap();
        let err = write_table(&path, "test-table", &meta, &columns, false).unwrap_err();
        match err {
            SurveyError::Io(e) => assert_eq!(e.kind(), ErrorKind::AlreadyExists),
            other => panic!("unexpected error {other:?}"),
        }

        write_table(&path, "test-table", &meta, &columns, true).unwrap();
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("table.json");
        let (meta, columns) = sample();
        write_table(&path, "test-table", &meta, &columns, false).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_wrong_format_tag() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.json");
        let (meta, columns) = sample();
        write_table(&path, "test-table", &meta, &columns, false).unwrap();

        let err = read_table::<Meta, Columns>(&path, "other-table").unwrap_err();
        assert!(matches!(err, SurveyError::Format(_)));
    }

    #[test]
    fn test_detects_edited_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.json");
        let (meta, columns) = sample();
        write_table(&path, "test-table", &meta, &columns, false).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, text.replace("0.981", "0.5")).unwrap();

        let err = read_table::<Meta, Columns>(&path, "test-table").unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_table::<Meta, Columns>(&dir.path().join("nope.json"), "t").unwrap_err();
        assert!(matches!(err, SurveyError::Io(_)));
    }
}
