//! Raw table and source metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about the source data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Column separator the file was read with.
    pub delimiter: char,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of raw rows, header and skipped rows included.
    pub raw_row_count: usize,
    /// When the file was read.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been read.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        delimiter: u8,
        raw_row_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            delimiter: delimiter as char,
            format: super::format_name(delimiter),
            raw_row_count,
            loaded_at: Utc::now(),
        }
    }
}

/// Two-dimensional raw text table, before any header interpretation.
///
/// Rows are padded to the width of the widest row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Create a raw table, padding ragged rows with empty cells.
    pub fn new(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows }
    }

    /// Build from string slices.
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        Self::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.as_ref().to_string()).collect())
                .collect(),
        )
    }

    /// Row data as strings (row-major order), header row included.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// Index of the last row whose cells, joined by `delimiter`, start with `prefix`.
    pub fn find_row_starting_with(&self, prefix: &str, delimiter: char) -> Option<usize> {
        let separator = delimiter.to_string();
        self.rows
            .iter()
            .rposition(|row| row.join(separator.as_str()).starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_rows_are_padded() {
        let raw = RawTable::from_rows(&[vec!["a", "b", "c"], vec!["1"]]);
        assert_eq!(raw.column_count(), 3);
        assert_eq!(raw.get(1, 2), Some(""));
        assert!(raw.rows().iter().all(|r| r.len() == 3));
    }

    #[test]
    fn test_find_row_starting_with() {
        let raw = RawTable::from_rows(&[
            vec!["Station report", ""],
            vec!["name", "temp"],
            vec!["Melbourne", "12"],
        ]);
        assert_eq!(raw.find_row_starting_with("name,", ','), Some(1));
        assert_eq!(raw.find_row_starting_with("zzz", ','), None);

        let repeated = RawTable::from_rows(&[
            vec!["name", "temp"],
            vec!["Melbourne", "12"],
            vec!["name", "temp"],
            vec!["Geelong", "9"],
        ]);
        assert_eq!(repeated.find_row_starting_with("name", ','), Some(2));
    }
}
