//! Core type definitions for column typing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared data type for a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    /// Free text.
    Text,
    /// Text limited to a maximum number of characters.
    FixedText { width: usize },
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Real,
    /// Boolean values (true/false).
    Boolean,
    /// Date and/or time values, with the pattern they were read with.
    DateTime {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Real)
    }

    /// Returns true if this type holds text.
    pub fn is_textual(&self) -> bool {
        matches!(self, ColumnType::Text | ColumnType::FixedText { .. })
    }

    /// Returns true if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::DateTime { .. })
    }

    /// Date/time column with an explicit pattern.
    pub fn date_time(pattern: impl Into<String>) -> Self {
        ColumnType::DateTime {
            pattern: Some(pattern.into()),
        }
    }
}

impl Default for ColumnType {
    fn default() -> Self {
        ColumnType::Text
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => write!(f, "text"),
            ColumnType::FixedText { width } => write!(f, "text[{}]", width),
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Real => write!(f, "real"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::DateTime { pattern: Some(p) } => write!(f, "date:{}", p),
            ColumnType::DateTime { pattern: None } => write!(f, "date"),
        }
    }
}
