//! Expression-driven and row-selection operations.

use std::collections::HashSet;

use crate::error::{Result, TabulaError};
use crate::expr::BoundExpression;
use crate::schema::ColumnType;
use crate::table::{Table, Value};

use super::super::operation::{Assignment, ParsedExpression, RowEdit};
use super::columns::require_all;

pub(crate) fn formula(mut table: Table, assignments: &[Assignment]) -> Result<Table> {
    for assignment in assignments {
        let bound = assignment.value.expression.bind(table.columns())?;
        let values = table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| bound.evaluate(row, i))
            .collect::<Result<Vec<_>>>()?;
        table.upsert_column(&assignment.column, bound.result_type().clone(), values)?;
    }
    Ok(table)
}

pub(crate) fn filter_rows(mut table: Table, conditions: &[ParsedExpression]) -> Result<Table> {
    for condition in conditions {
        let keep = selected_rows(&table, condition)?;
        table.retain_rows(&keep);
    }
    Ok(table)
}

/// Overwrite fields of the rows selected by each edit's condition.
///
/// The selection is made once per edit, before any of its assignments run.
pub(crate) fn edit_specific_rows(mut table: Table, edits: &[RowEdit]) -> Result<Table> {
    for edit in edits {
        let selected = selected_rows(&table, &edit.condition)?;

        for assignment in &edit.assignments {
            let index = table.require_column(&assignment.column)?;
            let bound = assignment.value.expression.bind(table.columns())?;
            let current = &table.columns()[index];
            let target = storage_type(&current.column_type, bound.result_type()).ok_or_else(|| {
                TabulaError::TypeMismatch {
                    row: None,
                    message: format!(
                        "cannot store {} values from '{}' in {} column '{}'",
                        bound.result_type(),
                        assignment.value,
                        current.column_type,
                        current.name
                    ),
                }
            })?;

            let mut values: Vec<Value> = table
                .column_values(index)
                .map(|v| widen(v.clone(), &target))
                .collect();
            for (row_index, row) in table.rows().iter().enumerate() {
                if selected[row_index] {
                    let value = bound.evaluate(row, row_index)?;
                    values[row_index] = store(value, &target, &assignment.column, row_index)?;
                }
            }
            table.replace_column(index, target, values)?;
        }
    }
    Ok(table)
}

/// Keep the first row of each set of equal rows.
pub(crate) fn remove_duplicates(mut table: Table, subset: Option<&[String]>) -> Result<Table> {
    let indices = match subset {
        Some(names) => require_all(&table, names)?,
        None => (0..table.column_count()).collect(),
    };

    let keep: Vec<bool> = {
        let mut seen: HashSet<Vec<&Value>> = HashSet::new();
        table
            .rows()
            .iter()
            .map(|row| seen.insert(indices.iter().map(|&i| &row[i]).collect()))
            .collect()
    };
    table.retain_rows(&keep);
    Ok(table)
}

/// Evaluate a condition for every row; only exact `true` selects a row.
fn selected_rows(table: &Table, condition: &ParsedExpression) -> Result<Vec<bool>> {
    let bound = bind_condition(table, condition)?;
    table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| bound.matches(row, i))
        .collect()
}

fn bind_condition(table: &Table, condition: &ParsedExpression) -> Result<BoundExpression> {
    let bound = condition.expression.bind(table.columns())?;
    if *bound.result_type() != ColumnType::Boolean {
        return Err(TabulaError::TypeMismatch {
            row: None,
            message: format!(
                "condition '{}' produces {} values, expected boolean",
                condition,
                bound.result_type()
            ),
        });
    }
    Ok(bound)
}

/// Column type after storing values of type `produced` into a column of
/// type `existing`, or `None` when the two do not mix.
fn storage_type(existing: &ColumnType, produced: &ColumnType) -> Option<ColumnType> {
    if existing.is_textual() || existing == produced {
        Some(existing.clone())
    } else if existing.is_numeric() && produced.is_numeric() {
        Some(ColumnType::Real)
    } else if existing.is_temporal() && produced.is_temporal() {
        Some(existing.clone())
    } else {
        None
    }
}

fn widen(value: Value, target: &ColumnType) -> Value {
    match (value, target) {
        (Value::Integer(i), ColumnType::Real) => Value::Real(i as f64),
        (value, _) => value,
    }
}

fn store(value: Value, target: &ColumnType, column: &str, row: usize) -> Result<Value> {
    if value.is_missing() {
        return Ok(value);
    }
    match target {
        ColumnType::Text => Ok(Value::Text(value.render(None))),
        ColumnType::FixedText { width } => {
            let text = value.render(None);
            let len = text.chars().count();
            if len > *width {
                return Err(TabulaError::schema(
                    column,
                    Some(row),
                    format!("value has {} characters, limit is {}", len, width),
                ));
            }
            Ok(Value::Text(text))
        }
        _ => Ok(widen(value, target)),
    }
}
