//! String extraction and mutation.
//!
//! All of these read a text column, leave missing cells missing and write a
//! text column. Extractions that find nothing produce missing cells rather
//! than errors.

use regex::Regex;

use crate::error::{Result, TabulaError};
use crate::schema::ColumnType;
use crate::table::{Table, Value};

use super::super::operation::{Extraction, QueryExtract, TextChange, TextEdit, TextExtract};

pub(crate) fn extract_text(mut table: Table, extracts: &[TextExtract]) -> Result<Table> {
    for extract in extracts {
        let values = map_text(&table, &extract.column, |text| match &extract.extraction {
            Extraction::Range { start, length } => substring(text, *start, *length),
            Extraction::Pattern(regex) => first_capture(regex, text),
        })?;
        table.upsert_column(&extract.target, ColumnType::Text, values)?;
    }
    Ok(table)
}

pub(crate) fn extract_query_string(mut table: Table, extracts: &[QueryExtract]) -> Result<Table> {
    for extract in extracts {
        let values = map_text(&table, &extract.column, |url| first_capture(&extract.pattern, url))?;
        table.upsert_column(&extract.target, ColumnType::Text, values)?;
    }
    Ok(table)
}

pub(crate) fn edit_text(mut table: Table, edits: &[TextEdit]) -> Result<Table> {
    for edit in edits {
        let values = map_text(&table, &edit.column, |text| {
            Some(match &edit.change {
                TextChange::Replace { find, replacement } => text.replace(find.as_str(), replacement),
                TextChange::Prepend(prefix) => format!("{}{}", prefix, text),
                TextChange::Append(suffix) => format!("{}{}", text, suffix),
            })
        })?;
        let column_type = if edit.result_column == edit.column {
            let column_type = table.columns()[table.require_column(&edit.column)?].column_type.clone();
            if let ColumnType::FixedText { width } = column_type {
                check_width(&edit.column, width, &values)?;
            }
            column_type
        } else {
            ColumnType::Text
        };
        table.upsert_column(&edit.result_column, column_type, values)?;
    }
    Ok(table)
}

/// Fail on the first cell longer than a fixed-width column allows.
fn check_width(column: &str, width: usize, values: &[Value]) -> Result<()> {
    for (row, value) in values.iter().enumerate() {
        if let Value::Text(text) = value {
            let len = text.chars().count();
            if len > width {
                return Err(TabulaError::schema(
                    column,
                    Some(row),
                    format!("value has {} characters, limit is {}", len, width),
                ));
            }
        }
    }
    Ok(())
}

/// Pattern matching the last `key=value` in a URL query string; group 1 is
/// the value.
pub(crate) fn query_pattern(key: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!(r".*[?&]{}=([^&#]*)", regex::escape(key)))
}

/// Apply `f` to every text cell of `column`.
///
/// `None` or an empty string from `f` becomes a missing cell.
fn map_text<F>(table: &Table, column: &str, f: F) -> Result<Vec<Value>>
where
    F: Fn(&str) -> Option<String>,
{
    let index = table.require_column(column)?;
    let column_type = &table.columns()[index].column_type;
    if !column_type.is_textual() {
        return Err(TabulaError::TypeMismatch {
            row: None,
            message: format!("column '{}' is {}, expected text", column, column_type),
        });
    }

    table
        .column_values(index)
        .enumerate()
        .map(|(row, value)| match value {
            Value::Missing => Ok(Value::Missing),
            Value::Text(text) => Ok(match f(text) {
                Some(s) if !s.is_empty() => Value::Text(s),
                _ => Value::Missing,
            }),
            other => Err(TabulaError::type_mismatch(
                row,
                format!("column '{}' holds {} value '{}'", column, other.type_name(), other),
            )),
        })
        .collect()
}

/// Characters `start..start + length`; `None` when `start` is past the end.
fn substring(text: &str, start: usize, length: Option<usize>) -> Option<String> {
    if start >= text.chars().count() {
        return None;
    }
    let chars = text.chars().skip(start);
    Some(match length {
        Some(n) => chars.take(n).collect(),
        None => chars.collect(),
    })
}

fn first_capture(regex: &Regex, text: &str) -> Option<String> {
    let captures = regex.captures(text)?;
    let matched = if captures.len() > 1 {
        captures.get(1)?
    } else {
        captures.get(0)?
    };
    Some(matched.as_str().to_string())
}
