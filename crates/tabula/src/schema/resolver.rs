//! Turns a raw text table into a typed [`Table`].

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, TabulaError};
use crate::input::RawTable;
use crate::table::{Table, Value};

use super::column::Column;
use super::hint::{self, FormatHint};

/// Row skipping applied before the header row is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipRows {
    /// Rows before the header row.
    pub header: usize,
    /// Rows at the end of the data to drop.
    pub footer: usize,
}

/// Resolves raw rows into typed columns using per-column format hints.
#[derive(Debug, Clone, Default)]
pub struct SchemaResolver {
    hints: IndexMap<String, FormatHint>,
    only_load: Vec<String>,
    infer_types: bool,
}

impl SchemaResolver {
    /// Create a resolver with no hints: every column is text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a format hint to a column.
    pub fn with_hint(mut self, column: impl Into<String>, hint: FormatHint) -> Self {
        self.hints.insert(column.into(), hint);
        self
    }

    /// Load only these columns (kept in file order).
    pub fn only_load(mut self, columns: Vec<String>) -> Self {
        self.only_load = columns;
        self
    }

    /// Infer integer/real types for unhinted columns.
    pub fn infer_types(mut self, infer: bool) -> Self {
        self.infer_types = infer;
        self
    }

    pub fn hints(&self) -> &IndexMap<String, FormatHint> {
        &self.hints
    }

    /// Resolve a raw table into a typed table.
    pub fn resolve(&self, raw: &RawTable, skip: SkipRows) -> Result<Table> {
        let total = raw.row_count();
        if skip.header >= total {
            return Err(TabulaError::Schema {
                column: None,
                row: None,
                message: format!(
                    "cannot skip {} rows before the header: only {} rows available",
                    skip.header, total
                ),
            });
        }

        let data_start = skip.header + 1;
        let available = total - data_start;
        if skip.footer > available {
            return Err(TabulaError::Schema {
                column: None,
                row: None,
                message: format!(
                    "cannot skip {} footer rows: only {} data rows available",
                    skip.footer, available
                ),
            });
        }
        let data = &raw.rows()[data_start..total - skip.footer];

        debug!(
            header_skip = skip.header,
            footer_skip = skip.footer,
            data_rows = data.len(),
            "Resolving schema"
        );

        let headers = header_names(&raw.rows()[skip.header]);
        let all_columns: Vec<Column> = headers.iter().map(Column::text).collect();
        crate::table::ensure_unique(&all_columns)?;

        for name in self.hints.keys() {
            if !headers.contains(name) {
                return Err(TabulaError::schema(
                    name.as_str(),
                    None,
                    "column named in format hints is not in the header",
                ));
            }
        }

        let selected: Vec<usize> = if self.only_load.is_empty() {
            (0..headers.len()).collect()
        } else {
            if let Some(missing) = self.only_load.iter().find(|n| !headers.contains(n)) {
                return Err(TabulaError::unknown_column(missing.as_str()));
            }
            (0..headers.len())
                .filter(|i| self.only_load.contains(&headers[*i]))
                .collect()
        };

        let mut columns = Vec::with_capacity(selected.len());
        let mut typed_columns: Vec<Vec<Value>> = Vec::with_capacity(selected.len());

        for &index in &selected {
            let column = all_columns[index].clone();
            let values: Vec<Value> = data
                .iter()
                .map(|row| cell_value(row.get(index).map_or("", String::as_str)))
                .collect();

            let (column_type, values) = match self.hints.get(&column.name) {
                Some(hint) => hint.coerce(&column, values)?,
                None if self.infer_types => hint::infer(&column, values),
                None => (column.column_type.clone(), values),
            };

            debug!(column = %column.name, column_type = %column_type, "Resolved column");
            columns.push(Column::new(column.name, column_type));
            typed_columns.push(values);
        }

        let rows = transpose(typed_columns, data.len());
        Table::new(columns, rows)
    }
}

/// Header cell text, with empty headers named by position.
fn header_names(row: &[String]) -> Vec<String> {
    row.iter()
        .enumerate()
        .map(|(i, h)| {
            let trimmed = h.trim();
            if trimmed.is_empty() {
                format!("column_{}", i + 1)
            } else {
                trimmed.to_string()
            }
        })
        .collect()
}

fn cell_value(cell: &str) -> Value {
    if cell.trim().is_empty() {
        Value::Missing
    } else {
        Value::text(cell)
    }
}

fn transpose(columns: Vec<Vec<Value>>, row_count: usize) -> Vec<Vec<Value>> {
    let mut rows: Vec<Vec<Value>> = (0..row_count)
        .map(|_| Vec::with_capacity(columns.len()))
        .collect();
    for column in columns {
        for (row, value) in rows.iter_mut().zip(column) {
            row.push(value);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn weather() -> RawTable {
        RawTable::from_rows(&[
            vec!["Bureau of Meteorology", "", ""],
            vec!["name[80]", "local_date_time_full[80]", "air_temp"],
            vec!["Melbourne", "20140113120000", "21.5"],
            vec!["Melbourne", "20140113123000", "22.1"],
            vec!["Copyright", "", ""],
        ])
    }

    #[test]
    fn test_skip_header_and_footer() {
        let table = SchemaResolver::new()
            .resolve(&weather(), SkipRows { header: 1, footer: 1 })
            .unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column_names(),
            vec!["name[80]", "local_date_time_full[80]", "air_temp"]
        );
        assert!(table.columns().iter().all(|c| c.column_type == ColumnType::Text));
    }

    #[test]
    fn test_hints_type_columns() {
        let table = SchemaResolver::new()
            .with_hint("local_date_time_full[80]", FormatHint::Date)
            .with_hint("air_temp", FormatHint::Real)
            .with_hint("name[80]", FormatHint::FixedText(80))
            .resolve(&weather(), SkipRows { header: 1, footer: 1 })
            .unwrap();

        assert!(table.columns()[1].column_type.is_temporal());
        assert_eq!(table.value(1, "air_temp"), Some(&Value::Real(22.1)));
        assert_eq!(table.columns()[0].column_type, ColumnType::FixedText { width: 80 });
    }

    #[test]
    fn test_skip_counts_exceeding_rows_fail() {
        let err = SchemaResolver::new()
            .resolve(&weather(), SkipRows { header: 5, footer: 0 })
            .unwrap_err();
        assert!(matches!(err, TabulaError::Schema { .. }));

        let err = SchemaResolver::new()
            .resolve(&weather(), SkipRows { header: 1, footer: 4 })
            .unwrap_err();
        assert!(matches!(err, TabulaError::Schema { .. }));
    }

    #[test]
    fn test_hint_for_absent_column_fails() {
        let err = SchemaResolver::new()
            .with_hint("humidity", FormatHint::Real)
            .resolve(&weather(), SkipRows { header: 1, footer: 1 })
            .unwrap_err();
        assert!(matches!(err, TabulaError::Schema { column: Some(c), .. } if c == "humidity"));
    }

    #[test]
    fn test_unparseable_date_names_row() {
        let raw = RawTable::from_rows(&[vec!["when"], vec!["13/01/2014"], vec!["not a date"]]);
        let err = SchemaResolver::new()
            .with_hint("when", FormatHint::DatePattern("%d/%m/%Y".to_string()))
            .resolve(&raw, SkipRows::default())
            .unwrap_err();
        assert!(matches!(err, TabulaError::Schema { row: Some(1), .. }));
    }

    #[test]
    fn test_short_rows_resolve_to_missing() {
        let raw = RawTable::from_rows(&[vec!["a", "b"], vec!["1"], vec!["2", "3"]]);
        let table = SchemaResolver::new()
            .with_hint("b", FormatHint::Integer)
            .resolve(&raw, SkipRows::default())
            .unwrap();
        assert_eq!(table.value(0, "b"), Some(&Value::Missing));
        assert_eq!(table.value(1, "b"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_only_load_keeps_file_order() {
        let raw = RawTable::from_rows(&[vec!["a", "b", "c"], vec!["1", "2", "3"]]);
        let table = SchemaResolver::new()
            .only_load(vec!["c".to_string(), "a".to_string()])
            .resolve(&raw, SkipRows::default())
            .unwrap();
        assert_eq!(table.column_names(), vec!["a", "c"]);

        let err = SchemaResolver::new()
            .only_load(vec!["z".to_string()])
            .resolve(&raw, SkipRows::default())
            .unwrap_err();
        assert!(matches!(err, TabulaError::UnknownColumn { .. }));
    }

    #[test]
    fn test_empty_header_cells_are_named() {
        let raw = RawTable::from_rows(&[vec!["a", ""], vec!["1", "2"]]);
        let table = SchemaResolver::new().resolve(&raw, SkipRows::default()).unwrap();
        assert_eq!(table.column_names(), vec!["a", "column_2"]);
    }

    #[test]
    fn test_duplicate_headers_fail() {
        let raw = RawTable::from_rows(&[vec!["a", "a"], vec!["1", "2"]]);
        let err = SchemaResolver::new().resolve(&raw, SkipRows::default()).unwrap_err();
        assert!(matches!(err, TabulaError::DuplicateColumn { .. }));
    }
}
