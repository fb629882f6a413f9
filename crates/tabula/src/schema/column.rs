//! Column definition.

use serde::{Deserialize, Serialize};

use super::types::ColumnType;

/// A named, typed column of a table.
///
/// The ordinal position of a column is its index in the owning table's
/// column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within a table.
    pub name: String,
    /// Declared data type.
    pub column_type: ColumnType,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    /// Create a text column.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    /// Same column under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: self.column_type.clone(),
        }
    }
}

/// Find the position of a column by name.
pub fn position_of(columns: &[Column], name: &str) -> Option<usize> {
    columns.iter().position(|c| c.name == name)
}
