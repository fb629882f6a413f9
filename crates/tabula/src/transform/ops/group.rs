//! Grouping with per-group sums.

use indexmap::IndexMap;

use crate::error::{Result, TabulaError};
use crate::schema::{Column, FormatHint};
use crate::table::{Row, Table, Value};

use super::columns::{ensure_distinct, require_all};

/// One row per distinct group key, in first-seen order: the group-by columns
/// followed by the summed columns.
///
/// Missing addends are skipped and a group with no present values sums to
/// missing. Integer columns sum as integers.
///
/// Without an explicit sum list every other column is summed. Text sum
/// columns are read as numbers first, and a column that cannot be summed is
/// an error rather than being dropped.
pub(crate) fn sum_up_by(mut table: Table, group_by: &[String], sum: Option<&[String]>) -> Result<Table> {
    ensure_distinct(group_by)?;
    let group_indices = require_all(&table, group_by)?;

    let sum_indices = match sum {
        Some(names) => {
            ensure_distinct(names)?;
            let indices = require_all(&table, names)?;
            table = numeric_columns(table, &indices)?;
            indices
        }
        None => {
            let indices: Vec<usize> = (0..table.column_count())
                .filter(|i| !group_indices.contains(i))
                .collect();
            table = numeric_columns(table, &indices)?;
            indices
        }
    };

    let mut groups: IndexMap<Vec<Value>, Vec<Value>> = IndexMap::new();
    for (row_index, row) in table.rows().iter().enumerate() {
        let key: Vec<Value> = group_indices.iter().map(|&i| row[i].clone()).collect();
        let totals = groups
            .entry(key)
            .or_insert_with(|| vec![Value::Missing; sum_indices.len()]);
        for (total, &index) in totals.iter_mut().zip(&sum_indices) {
            *total = add(total, &row[index], row_index)?;
        }
    }

    let columns = group_indices
        .iter()
        .chain(&sum_indices)
        .map(|&i| table.columns()[i].clone())
        .collect();
    let rows: Vec<Row> = groups
        .into_iter()
        .map(|(mut key, totals)| {
            key.extend(totals);
            key
        })
        .collect();
    Table::new(columns, rows)
}

/// Read the text columns at `indices` as numbers, failing on any column that
/// is not numeric afterwards.
fn numeric_columns(mut table: Table, indices: &[usize]) -> Result<Table> {
    for &index in indices {
        let column = table.columns()[index].clone();
        if column.column_type.is_numeric() {
            continue;
        }
        if !column.column_type.is_textual() {
            return Err(not_summable(&column, None, format!("{} column", column.column_type)));
        }
        let values = table.column_values(index).cloned().collect();
        let (column_type, values) = FormatHint::Number
            .coerce(&column, values)
            .map_err(|err| match err {
                TabulaError::Schema { row, message, .. } => not_summable(&column, row, message),
                other => other,
            })?;
        table.replace_column(index, column_type, values)?;
    }
    Ok(table)
}

fn not_summable(column: &Column, row: Option<usize>, reason: String) -> TabulaError {
    TabulaError::TypeMismatch {
        row,
        message: format!(
            "cannot sum column '{}' ({}); list the columns to sum to leave it out",
            column.name, reason
        ),
    }
}

fn add(total: &Value, value: &Value, row: usize) -> Result<Value> {
    match (total, value) {
        (_, Value::Missing) => Ok(total.clone()),
        (Value::Missing, v) if v.is_numeric() => Ok(v.clone()),
        (Value::Integer(a), Value::Integer(b)) => {
            a.checked_add(*b)
                .map(Value::Integer)
                .ok_or_else(|| TabulaError::Arithmetic {
                    row,
                    message: format!("sum overflows adding {}", b),
                })
        }
        (t, v) if v.is_numeric() => match (t.as_f64(), v.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Real(a + b)),
            _ => Ok(Value::Missing),
        },
        (_, v) => Err(TabulaError::type_mismatch(
            row,
            format!("cannot sum {} value '{}'", v.type_name(), v),
        )),
    }
}
