//! Error types for the tabula library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tabula operations.
///
/// Configuration-shape errors ([`TabulaError::UnknownOperation`],
/// [`TabulaError::InvalidParameter`]) are raised while a pipeline is built.
/// Data-shape errors are raised while a table is resolved or transformed and
/// reach the caller wrapped in [`TabulaError::Step`] when a pipeline step
/// produced them.
#[derive(Debug, Error)]
pub enum TabulaError {
    /// Type or format mismatch while parsing or coercing values.
    #[error("Schema error{}{}: {message}", column_suffix(.column), row_suffix(.row))]
    Schema {
        column: Option<String>,
        row: Option<usize>,
        message: String,
    },

    /// A referenced column does not exist.
    #[error("Unknown column '{column}'")]
    UnknownColumn { column: String },

    /// A column name would appear twice in a table.
    #[error("Duplicate column '{column}'")]
    DuplicateColumn { column: String },

    /// An operation name is not in the catalogue.
    #[error("Unknown operation '{name}' at position {position}")]
    UnknownOperation { position: usize, name: String },

    /// Operation parameters do not have the required shape.
    #[error("Invalid parameters for '{operation}' at position {position}: {message}")]
    InvalidParameter {
        position: usize,
        operation: String,
        message: String,
    },

    /// An expression was applied to values of the wrong type.
    #[error("Type mismatch{}: {message}", row_suffix(.row))]
    TypeMismatch { row: Option<usize>, message: String },

    /// Arithmetic failure such as division by zero.
    #[error("Arithmetic error at row {row}: {message}")]
    Arithmetic { row: usize, message: String },

    /// A pipeline step failed.
    #[error("Step {index} ({operation}) failed: {source}")]
    Step {
        index: usize,
        operation: String,
        #[source]
        source: Box<TabulaError>,
    },

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Empty file or no data to transform.
    #[error("Empty data: {0}")]
    EmptyData(String),
}

impl TabulaError {
    /// Build a schema error for a column, optionally at a row.
    pub fn schema(column: impl Into<String>, row: Option<usize>, message: impl Into<String>) -> Self {
        TabulaError::Schema {
            column: Some(column.into()),
            row,
            message: message.into(),
        }
    }

    pub fn unknown_column(column: impl Into<String>) -> Self {
        TabulaError::UnknownColumn {
            column: column.into(),
        }
    }

    pub fn duplicate_column(column: impl Into<String>) -> Self {
        TabulaError::DuplicateColumn {
            column: column.into(),
        }
    }

    /// Build a type mismatch error at a row.
    pub fn type_mismatch(row: usize, message: impl Into<String>) -> Self {
        TabulaError::TypeMismatch {
            row: Some(row),
            message: message.into(),
        }
    }

    /// The innermost error, looking through [`TabulaError::Step`] wrappers.
    pub fn root(&self) -> &TabulaError {
        match self {
            TabulaError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// Index of the pipeline step that failed, if any.
    pub fn step_index(&self) -> Option<usize> {
        match self {
            TabulaError::Step { index, .. } => Some(*index),
            TabulaError::UnknownOperation { position, .. }
            | TabulaError::InvalidParameter { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Row named by the innermost error, if any.
    pub fn row(&self) -> Option<usize> {
        match self.root() {
            TabulaError::Schema { row, .. } | TabulaError::TypeMismatch { row, .. } => *row,
            TabulaError::Arithmetic { row, .. } => Some(*row),
            _ => None,
        }
    }
}

fn column_suffix(column: &Option<String>) -> String {
    column
        .as_ref()
        .map(|c| format!(" in column '{}'", c))
        .unwrap_or_default()
}

fn row_suffix(row: &Option<usize>) -> String {
    row.map(|r| format!(" at row {}", r)).unwrap_or_default()
}

/// Result type alias for tabula operations.
pub type Result<T> = std::result::Result<T, TabulaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_column_and_row() {
        let err = TabulaError::schema("time", Some(4), "does not match '%d/%m/%Y'");
        let msg = err.to_string();
        assert!(msg.contains("'time'"));
        assert!(msg.contains("row 4"));
    }

    #[test]
    fn test_step_wrapper_exposes_root() {
        let err = TabulaError::Step {
            index: 2,
            operation: "formula".to_string(),
            source: Box::new(TabulaError::Arithmetic {
                row: 7,
                message: "division by zero".to_string(),
            }),
        };

        assert_eq!(err.step_index(), Some(2));
        assert_eq!(err.row(), Some(7));
        assert!(matches!(err.root(), TabulaError::Arithmetic { row: 7, .. }));
        assert!(err.to_string().contains("Step 2 (formula)"));
    }
}
