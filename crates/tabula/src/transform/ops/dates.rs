//! Date/time re-rendering and in-pipeline type coercion.

use crate::error::{Result, TabulaError};
use crate::schema::{temporal, ColumnType};
use crate::table::{Table, Value};

use super::super::operation::{DateFormatChange, FormatRequirement};

pub(crate) fn change_date_or_time_format(mut table: Table, changes: &[DateFormatChange]) -> Result<Table> {
    for change in changes {
        let index = table.require_column(&change.column)?;
        let column_type = table.columns()[index].column_type.clone();

        let from_format = match (&column_type, &change.from_format) {
            (ColumnType::DateTime { .. }, _) => None,
            (t, Some(pattern)) if t.is_textual() => Some(pattern.as_str()),
            (t, None) if t.is_textual() => {
                return Err(TabulaError::schema(
                    change.column.as_str(),
                    None,
                    "column holds text; give from_format to read it",
                ));
            }
            (other, _) => {
                return Err(TabulaError::TypeMismatch {
                    row: None,
                    message: format!(
                        "column '{}' is {}, expected a date/time or text column",
                        change.column, other
                    ),
                });
            }
        };

        let values = table
            .column_values(index)
            .enumerate()
            .map(|(row, value)| {
                let parsed = match (value, from_format) {
                    (Value::Missing, _) => return Ok(Value::Missing),
                    (Value::DateTime(dt), _) => Some(*dt),
                    (Value::Text(text), Some(pattern)) => temporal::parse_with_pattern(text, pattern),
                    _ => None,
                };
                let rendered = parsed.and_then(|dt| temporal::render(&dt, &change.to_format));
                rendered.map(Value::Text).ok_or_else(|| {
                    TabulaError::schema(
                        change.column.as_str(),
                        Some(row),
                        match from_format {
                            Some(pattern) => format!("'{}' does not match '{}'", value, pattern),
                            None => format!("'{}' cannot be rendered as '{}'", value, change.to_format),
                        },
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        table.upsert_column(&change.result_column, ColumnType::Text, values)?;
    }
    Ok(table)
}

/// Coerce columns to the type named by a format hint, in place.
pub(crate) fn ensure_format(mut table: Table, requirements: &[FormatRequirement]) -> Result<Table> {
    for requirement in requirements {
        let index = table.require_column(&requirement.column)?;
        let column = table.columns()[index].clone();
        let values = table.column_values(index).cloned().collect();
        let (column_type, values) = requirement.hint.coerce(&column, values)?;
        table.replace_column(index, column_type, values)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, FormatHint};

    fn change(column: &str, result: &str, to: &str, from: Option<&str>) -> DateFormatChange {
        DateFormatChange {
            column: column.to_string(),
            result_column: result.to_string(),
            to_format: to.to_string(),
            from_format: from.map(str::to_string),
        }
    }

    #[test]
    fn test_reformat_text_dates() {
        let table = Table::from_text(&["when"], &[vec!["20140113120000"], vec![""]]).unwrap();
        let table = change_date_or_time_format(
            table,
            &[change("when", "date", "%d/%m/%Y %H:%M", Some("%Y%m%d%H%M%S"))],
        )
        .unwrap();
        assert_eq!(table.value(0, "date"), Some(&Value::text("13/01/2014 12:00")));
        assert_eq!(table.value(1, "date"), Some(&Value::Missing));
        assert_eq!(table.value(0, "when"), Some(&Value::text("20140113120000")));
    }

    #[test]
    fn test_reformat_typed_dates_in_place() {
        let dt = temporal::parse_iso("2014-01-13").unwrap();
        let table = Table::new(
            vec![Column::new("when", ColumnType::date_time("%Y-%m-%d"))],
            vec![vec![Value::DateTime(dt)]],
        )
        .unwrap();
        let table =
            change_date_or_time_format(table, &[change("when", "when", "%d %B %Y", None)]).unwrap();
        assert_eq!(table.value(0, "when"), Some(&Value::text("13 January 2014")));
        assert_eq!(table.columns()[0].column_type, ColumnType::Text);
    }

    #[test]
    fn test_unparseable_cell_names_row() {
        let table = Table::from_text(&["when"], &[vec!["13/01/2014"], vec!["soon"]]).unwrap();
        let err = change_date_or_time_format(
            table,
            &[change("when", "when", "%Y-%m-%d", Some("%d/%m/%Y"))],
        )
        .unwrap_err();
        assert!(matches!(err, TabulaError::Schema { row: Some(1), .. }));
    }

    #[test]
    fn test_text_column_needs_from_format() {
        let table = Table::from_text(&["when"], &[vec!["13/01/2014"]]).unwrap();
        let err = change_date_or_time_format(table, &[change("when", "when", "%Y", None)]).unwrap_err();
        assert!(matches!(err, TabulaError::Schema { .. }));
    }

    #[test]
    fn test_ensure_format_coerces_in_place() {
        let table = Table::from_text(&["n", "s"], &[vec!["1", "a"], vec!["x", "b"]]).unwrap();
        let requirement = FormatRequirement {
            column: "s".to_string(),
            hint: FormatHint::FixedText(1),
        };
        let table = ensure_format(table, &[requirement]).unwrap();
        assert_eq!(table.columns()[1].column_type, ColumnType::FixedText { width: 1 });

        let requirement = FormatRequirement {
            column: "n".to_string(),
            hint: FormatHint::Integer,
        };
        let err = ensure_format(table, &[requirement]).unwrap_err();
        assert!(matches!(err, TabulaError::Schema { row: Some(1), .. }));
    }
}
