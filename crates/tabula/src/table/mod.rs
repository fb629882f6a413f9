//! In-memory table model.
//!
//! A [`Table`] is an ordered list of [`Column`]s plus an ordered list of rows.
//! Every row holds exactly one [`Value`] per column, in column order, and
//! column names are unique. Constructors and mutators uphold both invariants.

mod value;

pub use value::Value;

use std::collections::HashSet;

use crate::error::{Result, TabulaError};
use crate::schema::{Column, ColumnType};

/// One row of values, in column order.
pub type Row = Vec<Value>;

/// An ordered-columns, ordered-rows table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    /// Create a table, checking name uniqueness and row widths.
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Result<Self> {
        ensure_unique(&columns)?;
        let width = columns.len();
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(TabulaError::Schema {
                column: None,
                row: Some(idx),
                message: format!("row has {} values but the table has {} columns", row.len(), width),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Create a table with columns and no rows.
    pub fn empty(columns: Vec<Column>) -> Result<Self> {
        Self::new(columns, Vec::new())
    }

    /// Build a table from text cells, every column typed as text.
    ///
    /// Empty cells become [`Value::Missing`].
    pub fn from_text<S: AsRef<str>>(headers: &[S], rows: &[Vec<S>]) -> Result<Self> {
        let columns = headers.iter().map(|h| Column::text(h.as_ref())).collect();
        let rows = rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|c| {
                        let c = c.as_ref();
                        if c.trim().is_empty() {
                            Value::Missing
                        } else {
                            Value::text(c)
                        }
                    })
                    .collect()
            })
            .collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get all column names, in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get the position of a column, failing if it does not exist.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| TabulaError::unknown_column(name))
    }

    /// Get a column definition by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Get a cell by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[index])
    }

    /// Decompose into columns and rows.
    pub fn into_parts(self) -> (Vec<Column>, Vec<Row>) {
        (self.columns, self.rows)
    }

    /// Append a column at the end.
    pub fn push_column(&mut self, column: Column, values: Vec<Value>) -> Result<()> {
        if self.column_index(&column.name).is_some() {
            return Err(TabulaError::duplicate_column(column.name));
        }
        self.check_length(&values)?;
        self.columns.push(column);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Replace the values (and type) of an existing column in place.
    pub fn replace_column(
        &mut self,
        index: usize,
        column_type: ColumnType,
        values: Vec<Value>,
    ) -> Result<()> {
        self.check_length(&values)?;
        self.columns[index].column_type = column_type;
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[index] = value;
        }
        Ok(())
    }

    /// Write a column by name: overwrite in place if present, append otherwise.
    pub fn upsert_column(
        &mut self,
        name: &str,
        column_type: ColumnType,
        values: Vec<Value>,
    ) -> Result<()> {
        match self.column_index(name) {
            Some(index) => self.replace_column(index, column_type, values),
            None => self.push_column(Column::new(name, column_type), values),
        }
    }

    /// Rename every column at once; the resulting names must be unique.
    pub fn set_column_names(&mut self, names: Vec<String>) -> Result<()> {
        let renamed: Vec<Column> = self
            .columns
            .iter()
            .zip(names)
            .map(|(c, n)| c.renamed(n))
            .collect();
        ensure_unique(&renamed)?;
        self.columns = renamed;
        Ok(())
    }

    /// Keep only the columns at `indices`, in that order.
    pub fn select(self, indices: &[usize]) -> Result<Table> {
        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Table::new(columns, rows)
    }

    /// Keep rows for which `keep` is true, preserving order.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.rows.retain(|_| flags.next().copied().unwrap_or(false));
    }

    fn check_length(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(TabulaError::Schema {
                column: None,
                row: None,
                message: format!(
                    "column has {} values but the table has {} rows",
                    values.len(),
                    self.rows.len()
                ),
            });
        }
        Ok(())
    }
}

/// Fail with the first name that appears twice.
pub(crate) fn ensure_unique(columns: &[Column]) -> Result<()> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.name.as_str()) {
            return Err(TabulaError::duplicate_column(&column.name));
        }
    }
    Ok(())
}
