//! Operations on column names and column selection.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::{Result, TabulaError};
use crate::schema::Column;
use crate::table::Table;

use super::super::operation::ColumnMapping;

// Runs of characters that cannot appear in an alphanumeric column name.
static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Rename all pairs at once: `from` names refer to the incoming table, and
/// only the final set of names has to be unique, so columns can swap names.
pub(crate) fn rename(mut table: Table, mappings: &[ColumnMapping]) -> Result<Table> {
    let mut names: Vec<String> = table.columns().iter().map(|c| c.name.clone()).collect();
    for mapping in mappings {
        let index = table.require_column(&mapping.from)?;
        names[index] = mapping.to.clone();
    }
    table.set_column_names(names)?;
    Ok(table)
}

pub(crate) fn copy(mut table: Table, mappings: &[ColumnMapping]) -> Result<Table> {
    for mapping in mappings {
        let index = table.require_column(&mapping.from)?;
        let column_type = table.columns()[index].column_type.clone();
        let values = table.column_values(index).cloned().collect();
        table.push_column(Column::new(mapping.to.as_str(), column_type), values)?;
    }
    Ok(table)
}

pub(crate) fn filter_columns(table: Table, names: &[String]) -> Result<Table> {
    let indices = names
        .iter()
        .map(|name| table.require_column(name))
        .collect::<Result<Vec<_>>>()?;
    table.select(&indices)
}

/// Drop the named columns; names that are not in the table are skipped.
pub(crate) fn remove_columns(table: Table, names: &[String]) -> Result<Table> {
    let absent: Vec<&str> = names
        .iter()
        .filter(|n| table.column_index(n).is_none())
        .map(|n| n.as_str())
        .collect();
    if !absent.is_empty() {
        warn!(columns = ?absent, "Ignoring columns to remove that are not in the table");
    }

    let keep: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| !names.contains(&c.name))
        .map(|(i, _)| i)
        .collect();
    table.select(&keep)
}

pub(crate) fn lowercase_names(mut table: Table) -> Result<Table> {
    let names = table.columns().iter().map(|c| c.name.to_lowercase()).collect();
    table.set_column_names(names)?;
    Ok(table)
}

pub(crate) fn alphanumeric_names(mut table: Table) -> Result<Table> {
    let names = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| alphanumeric(&c.name, i))
        .collect();
    table.set_column_names(names)?;
    Ok(table)
}

/// `"Air Temp (°C)"` becomes `"Air_Temp_C"`; names with nothing left are
/// named by their 1-based position.
fn alphanumeric(name: &str, index: usize) -> String {
    let replaced = NON_ALPHANUMERIC.replace_all(name, "_");
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        format!("column_{}", index + 1)
    } else {
        trimmed.to_string()
    }
}

/// Positions of `names` in `table`, failing on the first unknown name.
pub(crate) fn require_all(table: &Table, names: &[String]) -> Result<Vec<usize>> {
    names.iter().map(|n| table.require_column(n)).collect()
}

/// Fail if `names` lists a column twice.
pub(crate) fn ensure_distinct(names: &[String]) -> Result<()> {
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(TabulaError::duplicate_column(name.as_str()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn table() -> Table {
        Table::from_text(
            &["Name", "Air Temp (°C)", "city"],
            &[vec!["a", "1", "x"], vec!["b", "2", "y"]],
        )
        .unwrap()
    }

    fn mapping(from: &str, to: &str) -> ColumnMapping {
        ColumnMapping {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    #[test]
    fn test_rename_then_reverse_restores_table() {
        let original = table();
        let renamed = rename(original.clone(), &[mapping("city", "town")]).unwrap();
        assert_eq!(renamed.column_names(), vec!["Name", "Air Temp (°C)", "town"]);
        let restored = rename(renamed, &[mapping("town", "city")]).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_rename_errors() {
        let err = rename(table(), &[mapping("nope", "x")]).unwrap_err();
        assert!(matches!(err, TabulaError::UnknownColumn { .. }));
        let err = rename(table(), &[mapping("city", "Name")]).unwrap_err();
        assert!(matches!(err, TabulaError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_rename_swaps_names() {
        let swapped = rename(table(), &[mapping("Name", "city"), mapping("city", "Name")]).unwrap();
        assert_eq!(swapped.column_names(), vec!["city", "Air Temp (°C)", "Name"]);
        assert_eq!(swapped.value(0, "Name"), Some(&Value::text("x")));
        assert_eq!(swapped.value(0, "city"), Some(&Value::text("a")));
    }

    #[test]
    fn test_copy_appends_column() {
        let copied = copy(table(), &[mapping("city", "city2")]).unwrap();
        assert_eq!(copied.column_count(), 4);
        assert_eq!(copied.value(1, "city2"), Some(&Value::text("y")));
        let err = copy(table(), &[mapping("city", "Name")]).unwrap_err();
        assert!(matches!(err, TabulaError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_filter_columns_orders_and_is_idempotent() {
        let names = vec!["city".to_string(), "Name".to_string()];
        let once = filter_columns(table(), &names).unwrap();
        assert_eq!(once.column_names(), vec!["city", "Name"]);
        let twice = filter_columns(once.clone(), &names).unwrap();
        assert_eq!(once, twice);

        let err = filter_columns(table(), &["zzz".to_string()]).unwrap_err();
        assert!(matches!(err, TabulaError::UnknownColumn { .. }));
    }

    #[test]
    fn test_remove_columns_ignores_unknown() {
        let removed = remove_columns(table(), &["city".to_string(), "gone".to_string()]).unwrap();
        assert_eq!(removed.column_names(), vec!["Name", "Air Temp (°C)"]);
    }

    #[test]
    fn test_name_transforms() {
        let lower = lowercase_names(table()).unwrap();
        assert_eq!(lower.column_names(), vec!["name", "air temp (°c)", "city"]);

        let alnum = alphanumeric_names(table()).unwrap();
        assert_eq!(alnum.column_names(), vec!["Name", "Air_Temp_C", "city"]);
    }

    #[test]
    fn test_name_transforms_detect_collisions() {
        let table = Table::from_text(&["City", "city"], &[]).unwrap();
        let err = lowercase_names(table).unwrap_err();
        assert!(matches!(err, TabulaError::DuplicateColumn { column } if column == "city"));

        let table = Table::from_text(&["a b", "a-b"], &[]).unwrap();
        assert!(alphanumeric_names(table).is_err());
    }

    #[test]
    fn test_alphanumeric_empty_name_uses_position() {
        assert_eq!(alphanumeric("%%", 2), "column_3");
    }
}
