//! Column format hints and value coercion.
//!
//! A hint is a short string attached to a column in the configuration:
//!
//! | Hint | Column type |
//! |------|-------------|
//! | `text` | text |
//! | `text[80]`, `[80]` | text of at most 80 characters |
//! | `integer`, `int` | integer |
//! | `real`, `float` | real |
//! | `number` | integer or real, ignoring `,` and `$` |
//! | `boolean`, `bool` | boolean |
//! | `date`, `datetime`, `time` | date/time, pattern detected from the data |
//! | `%d/%m/%Y %H:%M`, `date:%Y` | date/time with an explicit pattern |

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TabulaError};
use crate::table::Value;

use super::column::Column;
use super::temporal;
use super::types::ColumnType;

/// A parsed column format hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatHint {
    Text,
    FixedText(usize),
    Integer,
    Real,
    Number,
    Boolean,
    /// Date/time with the pattern detected from the values.
    Date,
    /// Date/time with an explicit chrono pattern.
    DatePattern(String),
}

impl FromStr for FormatHint {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();

        if trimmed.contains('%') {
            let pattern = strip_date_prefix(trimmed);
            if !temporal::is_valid_pattern(pattern) {
                return Err(format!("invalid date/time pattern '{}'", pattern));
            }
            return Ok(FormatHint::DatePattern(pattern.to_string()));
        }

        let lower = trimmed.to_lowercase();
        if let Some(width) = fixed_width(&lower) {
            return width.map(FormatHint::FixedText);
        }

        match lower.as_str() {
            "text" | "string" | "str" => Ok(FormatHint::Text),
            "integer" | "int" => Ok(FormatHint::Integer),
            "real" | "float" | "decimal" => Ok(FormatHint::Real),
            "number" | "numeric" => Ok(FormatHint::Number),
            "boolean" | "bool" => Ok(FormatHint::Boolean),
            "date" | "datetime" | "date_time" | "time" => Ok(FormatHint::Date),
            _ => Err(format!("unknown format hint '{}'", trimmed)),
        }
    }
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatHint::Text => write!(f, "text"),
            FormatHint::FixedText(w) => write!(f, "text[{}]", w),
            FormatHint::Integer => write!(f, "integer"),
            FormatHint::Real => write!(f, "real"),
            FormatHint::Number => write!(f, "number"),
            FormatHint::Boolean => write!(f, "boolean"),
            FormatHint::Date => write!(f, "date"),
            FormatHint::DatePattern(p) => write!(f, "{}", p),
        }
    }
}

fn strip_date_prefix(hint: &str) -> &str {
    for prefix in ["datetime:", "date:", "time:"] {
        if let Some(head) = hint.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return hint[prefix.len()..].trim();
            }
        }
    }
    hint
}

/// Parse `[N]` or `text[N]`. Outer `None` means the hint is not fixed-width.
fn fixed_width(hint: &str) -> Option<std::result::Result<usize, String>> {
    let inner = hint
        .strip_prefix("text")
        .unwrap_or(hint)
        .trim()
        .strip_prefix('[')?
        .strip_suffix(']')?;
    Some(match inner.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(format!("invalid fixed width '{}'", inner)),
        Ok(width) => Ok(width),
    })
}

/// Check if raw text represents a missing/null value in a typed column.
pub fn is_null_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("nil")
        || trimmed == "."
        || trimmed == "-"
}

impl FormatHint {
    /// Coerce the values of `column` to this hint's type.
    ///
    /// Fails with a schema error naming the column and the first offending
    /// row. Missing values stay missing.
    pub fn coerce(&self, column: &Column, values: Vec<Value>) -> Result<(ColumnType, Vec<Value>)> {
        let name = column.name.as_str();
        match self {
            FormatHint::Text => Ok((ColumnType::Text, to_text(column, values))),
            FormatHint::FixedText(width) => {
                let values = to_text(column, values);
                for (row, value) in values.iter().enumerate() {
                    if let Value::Text(s) = value {
                        let len = s.chars().count();
                        if len > *width {
                            return Err(TabulaError::schema(
                                name,
                                Some(row),
                                format!("value has {} characters, limit is {}", len, width),
                            ));
                        }
                    }
                }
                Ok((ColumnType::FixedText { width: *width }, values))
            }
            FormatHint::Integer => map_cells(name, values, ColumnType::Integer, to_integer),
            FormatHint::Real => map_cells(name, values, ColumnType::Real, to_real),
            FormatHint::Boolean => map_cells(name, values, ColumnType::Boolean, to_boolean),
            FormatHint::Number => coerce_number(column, values),
            FormatHint::Date => coerce_detected_date(column, values),
            FormatHint::DatePattern(pattern) => {
                let column_type = ColumnType::date_time(pattern.as_str());
                map_cells(name, values, column_type, |v| match v {
                    Value::Text(s) => temporal::parse_with_pattern(s, pattern)
                        .map(Value::DateTime)
                        .ok_or_else(|| format!("'{}' does not match '{}'", s, pattern)),
                    Value::DateTime(_) => Ok(v.clone()),
                    other => Err(format!("{} value is not a date/time", other.type_name())),
                })
            }
        }
    }
}

/// Infer integer, then real, then text for an unhinted column.
pub fn infer(column: &Column, values: Vec<Value>) -> (ColumnType, Vec<Value>) {
    let present: Vec<&str> = values
        .iter()
        .filter_map(|v| v.as_str())
        .filter(|s| !is_null_token(s))
        .collect();

    if present.is_empty() {
        return (column.column_type.clone(), values);
    }
    if present.iter().all(|s| s.trim().parse::<i64>().is_ok()) {
        if let Ok(result) = map_cells(&column.name, values.clone(), ColumnType::Integer, to_integer) {
            return result;
        }
    } else if present.iter().all(|s| s.trim().parse::<f64>().is_ok()) {
        if let Ok(result) = map_cells(&column.name, values.clone(), ColumnType::Real, to_real) {
            return result;
        }
    }
    (column.column_type.clone(), values)
}

fn to_text(column: &Column, values: Vec<Value>) -> Vec<Value> {
    let pattern = match &column.column_type {
        ColumnType::DateTime { pattern } => pattern.as_deref(),
        _ => None,
    };
    values
        .into_iter()
        .map(|v| match v {
            Value::Missing | Value::Text(_) => v,
            other => Value::Text(other.render(pattern)),
        })
        .collect()
}

/// Convert every present cell, treating null tokens in text as missing.
fn map_cells<F>(
    name: &str,
    values: Vec<Value>,
    column_type: ColumnType,
    convert: F,
) -> Result<(ColumnType, Vec<Value>)>
where
    F: Fn(&Value) -> std::result::Result<Value, String>,
{
    let converted = values
        .iter()
        .enumerate()
        .map(|(row, v)| match v {
            Value::Missing => Ok(Value::Missing),
            Value::Text(s) if is_null_token(s) => Ok(Value::Missing),
            other => convert(other).map_err(|msg| TabulaError::schema(name, Some(row), msg)),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((column_type, converted))
}

fn to_integer(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Integer(_) => Ok(value.clone()),
        Value::Real(r) if r.fract() == 0.0 && r.abs() < i64::MAX as f64 => {
            Ok(Value::Integer(*r as i64))
        }
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| format!("'{}' is not an integer", s)),
        other => Err(format!("{} value is not an integer", other.type_name())),
    }
}

fn to_real(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Real(_) => Ok(value.clone()),
        Value::Integer(i) => Ok(Value::Real(*i as f64)),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Real)
            .map_err(|_| format!("'{}' is not a number", s)),
        other => Err(format!("{} value is not a number", other.type_name())),
    }
}

fn to_boolean(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Boolean(_) => Ok(value.clone()),
        Value::Integer(0) => Ok(Value::Boolean(false)),
        Value::Integer(1) => Ok(Value::Boolean(true)),
        Value::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Ok(Value::Boolean(true)),
            "false" | "f" | "no" | "n" | "0" => Ok(Value::Boolean(false)),
            _ => Err(format!("'{}' is not a boolean", s)),
        },
        other => Err(format!("{} value is not a boolean", other.type_name())),
    }
}

fn coerce_number(column: &Column, values: Vec<Value>) -> Result<(ColumnType, Vec<Value>)> {
    let (_, cleaned) = map_cells(&column.name, values, ColumnType::Real, |v| match v {
        Value::Integer(_) | Value::Real(_) => Ok(v.clone()),
        Value::Text(s) => {
            let stripped: String = s.trim().chars().filter(|c| *c != ',' && *c != '$').collect();
            if let Ok(i) = stripped.parse::<i64>() {
                Ok(Value::Integer(i))
            } else {
                stripped
                    .parse::<f64>()
                    .map(Value::Real)
                    .map_err(|_| format!("'{}' is not a number", s))
            }
        }
        other => Err(format!("{} value is not a number", other.type_name())),
    })?;

    let keep_real = column.column_type == ColumnType::Real && cleaned.iter().all(Value::is_missing);
    if keep_real || cleaned.iter().any(|v| matches!(v, Value::Real(_))) {
        let reals = cleaned
            .into_iter()
            .map(|v| match v {
                Value::Integer(i) => Value::Real(i as f64),
                other => other,
            })
            .collect();
        Ok((ColumnType::Real, reals))
    } else {
        Ok((ColumnType::Integer, cleaned))
    }
}

fn coerce_detected_date(column: &Column, values: Vec<Value>) -> Result<(ColumnType, Vec<Value>)> {
    let texts = || {
        values
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|s| !is_null_token(s))
    };

    if texts().next().is_none() {
        // Nothing to detect from: keep the pattern the column already has.
        let column_type = match &column.column_type {
            ColumnType::DateTime { .. } => column.column_type.clone(),
            _ => ColumnType::DateTime { pattern: None },
        };
        return map_cells(&column.name, values, column_type, |v| match v {
            Value::DateTime(_) => Ok(v.clone()),
            other => Err(format!("{} value is not a date/time", other.type_name())),
        });
    }

    let Some(pattern) = temporal::detect_pattern(texts()) else {
        let row = first_undated_row(&values);
        return Err(TabulaError::schema(
            &column.name,
            Some(row),
            format!("'{}' is not a recognised date/time", values[row]),
        ));
    };

    FormatHint::DatePattern(pattern.to_string()).coerce(column, values)
}

/// Row of the first text cell that the leading candidate pattern rejects.
fn first_undated_row(values: &[Value]) -> usize {
    let texts: Vec<(usize, &str)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.as_str().map(|s| (i, s)))
        .filter(|(_, s)| !is_null_token(s))
        .collect();

    let candidate = texts.first().and_then(|(_, first)| {
        temporal::AUTO_PATTERNS
            .iter()
            .find(|p| temporal::parse_with_pattern(first, p).is_some())
    });

    match candidate {
        Some(pattern) => texts
            .iter()
            .find(|(_, s)| temporal::parse_with_pattern(s, pattern).is_none())
            .map(|(i, _)| *i)
            .unwrap_or(0),
        None => texts.first().map(|(i, _)| *i).unwrap_or(0),
    }
}
