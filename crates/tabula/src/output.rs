//! Table sinks: delimited text and JSON.

use std::io::Write;

use serde_json::{Map, Number, Value as Json};

use crate::error::Result;
use crate::schema::ColumnType;
use crate::table::{Table, Value};

/// Write the table as delimited text with a header row.
///
/// Date/time cells are rendered with their column's pattern; missing cells
/// are empty.
pub fn write_delimited<W: Write>(table: &Table, writer: W, delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    writer.write_record(table.column_names())?;
    let patterns = patterns(table);
    for row in table.rows() {
        writer.write_record(
            row.iter()
                .zip(&patterns)
                .map(|(value, pattern)| value.render(*pattern)),
        )?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Render the table as a JSON array with one object per row.
///
/// Keys follow column order. Missing cells are `null`.
pub fn to_json(table: &Table) -> Json {
    let patterns = patterns(table);
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            let object: Map<String, Json> = table
                .columns()
                .iter()
                .zip(row)
                .zip(&patterns)
                .map(|((column, value), pattern)| (column.name.clone(), json_value(value, *pattern)))
                .collect();
            Json::Object(object)
        })
        .collect();
    Json::Array(rows)
}

/// Write [`to_json`] output, pretty-printed.
pub fn write_json<W: Write>(table: &Table, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, &to_json(table))?;
    Ok(())
}

fn patterns(table: &Table) -> Vec<Option<&str>> {
    table
        .columns()
        .iter()
        .map(|c| match &c.column_type {
            ColumnType::DateTime { pattern } => pattern.as_deref(),
            _ => None,
        })
        .collect()
}

fn json_value(value: &Value, pattern: Option<&str>) -> Json {
    match value {
        Value::Missing => Json::Null,
        Value::Text(s) => Json::String(s.clone()),
        Value::Integer(i) => Json::Number((*i).into()),
        Value::Real(r) => Number::from_f64(*r).map(Json::Number).unwrap_or(Json::Null),
        Value::Boolean(b) => Json::Bool(*b),
        Value::DateTime(_) => Json::String(value.render(pattern)),
    }
}
