//! Builds validated [`Operation`]s from the configuration's action list.
//!
//! The action list is a sequence whose entries are single-key maps from an
//! operation name to that operation's parameters:
//!
//! ```json
//! [
//!   { "rename": ["town = city"] },
//!   { "formula": ["fahrenheit = celsius * 9 / 5 + 32"] },
//!   "remove_duplicates"
//! ]
//! ```
//!
//! Operations without parameters may be written as a bare name. Everything
//! here depends on the configuration alone; no table is consulted.

use indexmap::IndexMap;
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as Json;

use crate::error::{Result, TabulaError};
use crate::expr::Expression;
use crate::schema::{temporal, FormatHint};

use super::operation::{
    Assignment, ColumnMapping, DateFormatChange, Extraction, FormatRequirement, Operation,
    ParsedExpression, QueryExtract, RowEdit, TextChange, TextEdit, TextExtract,
};
use super::ops::text::query_pattern;

/// Every accepted operation name, aliases included.
pub const OPERATION_NAMES: &[&str] = &[
    "rename",
    "copy",
    "formula",
    "filter_rows",
    "edit_specific_rows",
    "filter_columns",
    "remove_columns",
    "remove_duplicates",
    "change_date_or_time_format",
    "extract_text",
    "extract_query_string",
    "replace_text",
    "add_text_at_start",
    "prepend_text",
    "add_text_at_end",
    "append_text",
    "sum_up_by",
    "make_column_names_lowercase",
    "make_column_names_alphanumeric",
    "ensure_column_is_in_this_format",
];

/// Build every entry of an action list, failing on the first bad entry.
pub fn build_operations(actions: &Json) -> Result<Vec<Operation>> {
    let entries = match actions {
        Json::Null => return Ok(Vec::new()),
        Json::Array(entries) => entries,
        _ => {
            return Err(TabulaError::Config(
                "list_of_actions must be a list".to_string(),
            ));
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(position, entry)| match entry {
            Json::String(name) => build_operation(position, name, &Json::Null),
            Json::Object(map) if map.len() == 1 => {
                let (name, params) = map.iter().next().ok_or_else(|| {
                    TabulaError::Config(format!("action {} is empty", position))
                })?;
                build_operation(position, name, params)
            }
            other => Err(TabulaError::InvalidParameter {
                position,
                operation: "?".to_string(),
                message: format!(
                    "each action must be a map with exactly one operation name, found {}",
                    other
                ),
            }),
        })
        .collect()
}

/// Build one operation from its name and parameters.
pub fn build_operation(position: usize, name: &str, params: &Json) -> Result<Operation> {
    let ctx = Context { position, name };
    match name {
        "rename" => Ok(Operation::Rename(ctx.mappings(params)?)),
        "copy" => Ok(Operation::Copy(ctx.mappings(params)?)),
        "formula" => {
            let assignments = ctx
                .strings(params)?
                .iter()
                .map(|s| ctx.assignment(s))
                .collect::<Result<Vec<_>>>()?;
            Ok(Operation::Formula(assignments))
        }
        "filter_rows" => {
            let conditions = ctx
                .strings(params)?
                .iter()
                .map(|s| ctx.expression(s))
                .collect::<Result<Vec<_>>>()?;
            Ok(Operation::FilterRows(conditions))
        }
        "edit_specific_rows" => {
            let edits = ctx
                .entries::<RowEditParams>(params, "{ filter_rows, formula }")?
                .into_iter()
                .map(|p| {
                    let assignments = p
                        .formula
                        .into_vec()
                        .iter()
                        .map(|s| ctx.assignment(s))
                        .collect::<Result<Vec<_>>>()?;
                    if assignments.is_empty() {
                        return Err(ctx.invalid("each edit needs at least one formula"));
                    }
                    Ok(RowEdit {
                        condition: ctx.expression(&p.filter_rows)?,
                        assignments,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Operation::EditSpecificRows(edits))
        }
        "filter_columns" => {
            let names = ctx.strings(params)?;
            ctx.distinct(&names)?;
            Ok(Operation::FilterColumns(names))
        }
        "remove_columns" => Ok(Operation::RemoveColumns(ctx.strings(params)?)),
        "remove_duplicates" => {
            let subset = match params {
                Json::Null => None,
                Json::Array(items) if items.is_empty() => None,
                _ => Some(ctx.strings(params)?),
            };
            Ok(Operation::RemoveDuplicates(subset))
        }
        "change_date_or_time_format" => {
            let changes = ctx
                .entries::<DateFormatParams>(
                    params,
                    "{ date_or_time_column, date_format, from_format?, result_column? }",
                )?
                .into_iter()
                .map(|p| {
                    ctx.pattern(&p.date_format)?;
                    if let Some(from) = &p.from_format {
                        ctx.pattern(from)?;
                    }
                    Ok(DateFormatChange {
                        result_column: p.result_column.unwrap_or_else(|| p.date_or_time_column.clone()),
                        column: p.date_or_time_column,
                        to_format: p.date_format,
                        from_format: p.from_format,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Operation::ChangeDateOrTimeFormat(changes))
        }
        "extract_text" => {
            let extracts = ctx
                .entries::<ExtractParams>(
                    params,
                    "{ text_column, column_to_store_extract, start and length, or regex }",
                )?
                .into_iter()
                .map(|p| {
                    let extraction = match (p.start, p.length, p.regex) {
                        (Some(start), length, None) => Extraction::Range { start, length },
                        (None, None, Some(pattern)) => Extraction::Pattern(
                            RegexBuilder::new(&pattern)
                                .ignore_whitespace(true)
                                .build()
                                .map_err(|e| ctx.invalid(format!("bad regex: {}", e)))?,
                        ),
                        _ => return Err(ctx.invalid("give either start (and length) or regex")),
                    };
                    Ok(TextExtract {
                        column: p.text_column,
                        target: p.column_to_store_extract,
                        extraction,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Operation::ExtractText(extracts))
        }
        "extract_query_string" => {
            let extracts = ctx
                .entries::<QueryParams>(
                    params,
                    "{ url_column, column_to_store_extract, query_string }",
                )?
                .into_iter()
                .map(|p| {
                    if p.query_string.is_empty() {
                        return Err(ctx.invalid("query_string must not be empty"));
                    }
                    let pattern = query_pattern(&p.query_string)?;
                    Ok(QueryExtract {
                        column: p.url_column,
                        target: p.column_to_store_extract,
                        key: p.query_string,
                        pattern,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Operation::ExtractQueryString(extracts))
        }
        "replace_text" => {
            let edits = ctx
                .entries::<ReplaceParams>(
                    params,
                    "{ target_column, text_to_find, replacement_text, result_column? }",
                )?
                .into_iter()
                .map(|p| {
                    let change = match p.text_to_find.as_str() {
                        "^" => TextChange::Prepend(p.replacement_text),
                        "$" => TextChange::Append(p.replacement_text),
                        "" => return Err(ctx.invalid("text_to_find must not be empty")),
                        _ => TextChange::Replace {
                            find: p.text_to_find,
                            replacement: p.replacement_text,
                        },
                    };
                    Ok(text_edit(p.target_column, p.result_column, change))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Operation::ReplaceText(edits))
        }
        "add_text_at_start" | "prepend_text" => {
            let edits = ctx
                .entries::<AddTextParams>(params, "{ target_column, text, result_column? }")?
                .into_iter()
                .map(|p| text_edit(p.target_column, p.result_column, TextChange::Prepend(p.text)))
                .collect();
            Ok(Operation::AddTextAtStart(edits))
        }
        "add_text_at_end" | "append_text" => {
            let edits = ctx
                .entries::<AddTextParams>(params, "{ target_column, text, result_column? }")?
                .into_iter()
                .map(|p| text_edit(p.target_column, p.result_column, TextChange::Append(p.text)))
                .collect();
            Ok(Operation::AddTextAtEnd(edits))
        }
        "sum_up_by" => {
            let (group_by, sum) = match params {
                Json::Object(_) => {
                    let p: SumParams = ctx.parse(params, "{ group_by, sum? }")?;
                    (p.group_by.into_vec(), p.sum.map(OneOrMany::into_vec))
                }
                _ => (ctx.strings(params)?, None),
            };
            if group_by.is_empty() {
                return Err(ctx.invalid("group_by needs at least one column"));
            }
            ctx.distinct(&group_by)?;
            if let Some(sum) = &sum {
                ctx.distinct(sum)?;
                if let Some(both) = sum.iter().find(|s| group_by.contains(s)) {
                    return Err(ctx.invalid(format!("'{}' is both grouped and summed", both)));
                }
            }
            Ok(Operation::SumUpBy { group_by, sum })
        }
        "make_column_names_lowercase" => {
            ctx.no_params(params)?;
            Ok(Operation::MakeColumnNamesLowercase)
        }
        "make_column_names_alphanumeric" => {
            ctx.no_params(params)?;
            Ok(Operation::MakeColumnNamesAlphanumeric)
        }
        "ensure_column_is_in_this_format" => {
            let pairs: Vec<(String, String)> = match params {
                Json::Object(map) if !map.contains_key("column") => {
                    let map: IndexMap<String, String> = ctx.parse(params, "{ column: format }")?;
                    map.into_iter().collect()
                }
                _ => ctx
                    .entries::<FormatParams>(params, "{ column, format }")?
                    .into_iter()
                    .map(|p| (p.column, p.format))
                    .collect(),
            };
            let requirements = pairs
                .into_iter()
                .map(|(column, format)| {
                    let hint = format
                        .parse::<FormatHint>()
                        .map_err(|e| ctx.invalid(format!("column '{}': {}", column, e)))?;
                    Ok(FormatRequirement { column, hint })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Operation::EnsureFormat(requirements))
        }
        _ => Err(TabulaError::UnknownOperation {
            position,
            name: name.to_string(),
        }),
    }
}

/// Split `"name = expression"` at the assignment sign.
///
/// The name may be back-quoted. Returns `None` when there is no name or no
/// single `=`.
pub fn split_assignment(source: &str) -> Option<(String, &str)> {
    let source = source.trim();
    let (name, rest) = if let Some(quoted) = source.strip_prefix('`') {
        let end = quoted.find('`')?;
        let rest = quoted[end + 1..].trim_start().strip_prefix('=')?;
        (quoted[..end].to_string(), rest)
    } else {
        let (name, rest) = source.split_once('=')?;
        (name.trim().to_string(), rest)
    };
    if name.is_empty() || rest.starts_with('=') {
        return None;
    }
    Some((name, rest.trim()))
}

fn text_edit(column: String, result_column: Option<String>, change: TextChange) -> TextEdit {
    TextEdit {
        result_column: result_column.unwrap_or_else(|| column.clone()),
        column,
        change,
    }
}

/// Position and name of the operation being built, for error reports.
struct Context<'a> {
    position: usize,
    name: &'a str,
}

impl Context<'_> {
    fn invalid(&self, message: impl Into<String>) -> TabulaError {
        TabulaError::InvalidParameter {
            position: self.position,
            operation: self.name.to_string(),
            message: message.into(),
        }
    }

    fn parse<T: DeserializeOwned>(&self, params: &Json, shape: &str) -> Result<T> {
        T::deserialize(params).map_err(|e| self.invalid(format!("expected {}: {}", shape, e)))
    }

    /// One entry or a non-empty list of entries.
    fn entries<T: DeserializeOwned>(&self, params: &Json, shape: &str) -> Result<Vec<T>> {
        let entries = self.parse::<OneOrMany<T>>(params, shape)?.into_vec();
        if entries.is_empty() {
            return Err(self.invalid(format!("expected at least one {}", shape)));
        }
        Ok(entries)
    }

    fn strings(&self, params: &Json) -> Result<Vec<String>> {
        let strings = self.entries::<String>(params, "a string or a list of strings")?;
        if strings.iter().any(|s| s.trim().is_empty()) {
            return Err(self.invalid("empty string in parameter list"));
        }
        Ok(strings.into_iter().map(|s| s.trim().to_string()).collect())
    }

    fn distinct(&self, names: &[String]) -> Result<()> {
        match names.iter().enumerate().find(|(i, n)| names[..*i].contains(n)) {
            Some((_, name)) => Err(self.invalid(format!("'{}' is listed twice", name))),
            None => Ok(()),
        }
    }

    fn no_params(&self, params: &Json) -> Result<()> {
        let empty = match params {
            Json::Null => true,
            Json::Array(items) => items.is_empty(),
            Json::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            Ok(())
        } else {
            Err(self.invalid("takes no parameters"))
        }
    }

    fn expression(&self, source: &str) -> Result<ParsedExpression> {
        let expression = Expression::parse(source)
            .map_err(|e| self.invalid(format!("cannot parse '{}': {}", source, e)))?;
        Ok(ParsedExpression {
            source: source.trim().to_string(),
            expression,
        })
    }

    fn assignment(&self, source: &str) -> Result<Assignment> {
        let (column, expression) = split_assignment(source)
            .ok_or_else(|| self.invalid(format!("expected 'name = expression', found '{}'", source)))?;
        Ok(Assignment {
            column,
            value: self.expression(expression)?,
        })
    }

    /// `"new = old"` strings or a map from old to new names.
    fn mappings(&self, params: &Json) -> Result<Vec<ColumnMapping>> {
        let mappings = match params {
            Json::Object(_) => {
                let map: IndexMap<String, String> = self.parse(params, "{ old: new }")?;
                map.into_iter()
                    .map(|(from, to)| ColumnMapping { from, to })
                    .collect::<Vec<_>>()
            }
            _ => self
                .strings(params)?
                .iter()
                .map(|s| {
                    let (to, from) = split_assignment(s)
                        .ok_or_else(|| self.invalid(format!("expected 'new = old', found '{}'", s)))?;
                    Ok(ColumnMapping {
                        from: from.to_string(),
                        to,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        };
        if mappings.is_empty() {
            return Err(self.invalid("expected at least one column pair"));
        }
        if let Some(m) = mappings.iter().find(|m| m.from.is_empty() || m.to.is_empty()) {
            return Err(self.invalid(format!("empty column name in '{} = {}'", m.to, m.from)));
        }
        Ok(mappings)
    }

    fn pattern(&self, pattern: &str) -> Result<()> {
        if temporal::is_valid_pattern(pattern) {
            Ok(())
        } else {
            Err(self.invalid(format!("invalid date/time pattern '{}'", pattern)))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RowEditParams {
    #[serde(alias = "condition")]
    filter_rows: String,
    formula: OneOrMany<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DateFormatParams {
    #[serde(alias = "column")]
    date_or_time_column: String,
    #[serde(default)]
    result_column: Option<String>,
    #[serde(alias = "to_format")]
    date_format: String,
    #[serde(default)]
    from_format: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ExtractParams {
    #[serde(alias = "target_column")]
    text_column: String,
    #[serde(alias = "result_column")]
    column_to_store_extract: String,
    #[serde(default)]
    start: Option<usize>,
    #[serde(default)]
    length: Option<usize>,
    #[serde(default)]
    regex: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct QueryParams {
    #[serde(alias = "target_column")]
    url_column: String,
    #[serde(alias = "result_column")]
    column_to_store_extract: String,
    query_string: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ReplaceParams {
    target_column: String,
    #[serde(default)]
    result_column: Option<String>,
    text_to_find: String,
    replacement_text: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AddTextParams {
    target_column: String,
    #[serde(default)]
    result_column: Option<String>,
    #[serde(alias = "replacement_text")]
    text: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SumParams {
    group_by: OneOrMany<String>,
    #[serde(default)]
    sum: Option<OneOrMany<String>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FormatParams {
    column: String,
    format: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_assignment() {
        assert_eq!(split_assignment("x = 1 + 2"), Some(("x".to_string(), "1 + 2")));
        assert_eq!(
            split_assignment("`name[80]` = a == b"),
            Some(("name[80]".to_string(), "a == b"))
        );
        assert_eq!(split_assignment("x == 1"), None);
        assert_eq!(split_assignment("= 1"), None);
        assert_eq!(split_assignment("no sign"), None);
    }

    #[test]
    fn test_unknown_operation_reports_position() {
        let actions = json!([{ "rename": ["b = a"] }, { "explode": [] }]);
        let err = build_operations(&actions).unwrap_err();
        assert!(matches!(
            err,
            TabulaError::UnknownOperation { position: 1, ref name } if name == "explode"
        ));
    }

    #[test]
    fn test_rename_shapes() {
        let from_strings = build_operation(0, "rename", &json!(["town = city"])).unwrap();
        let from_map = build_operation(0, "rename", &json!({ "city": "town" })).unwrap();
        let expected = vec![ColumnMapping {
            from: "city".to_string(),
            to: "town".to_string(),
        }];
        assert!(matches!(from_strings, Operation::Rename(ref m) if *m == expected));
        assert!(matches!(from_map, Operation::Rename(ref m) if *m == expected));

        let err = build_operation(3, "rename", &json!(["town"])).unwrap_err();
        assert!(matches!(err, TabulaError::InvalidParameter { position: 3, .. }));
    }

    #[test]
    fn test_formula_parse_error_is_invalid_parameter() {
        let err = build_operation(0, "formula", &json!(["x = (a + "])).unwrap_err();
        assert!(matches!(err, TabulaError::InvalidParameter { ref operation, .. } if operation == "formula"));
    }

    #[test]
    fn test_bare_names_for_parameterless_operations() {
        let ops = build_operations(&json!(["remove_duplicates", "make_column_names_lowercase"])).unwrap();
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], Operation::RemoveDuplicates(None)));
        assert!(build_operation(0, "make_column_names_lowercase", &json!(["x"])).is_err());
    }

    #[test]
    fn test_entry_with_two_keys_is_rejected() {
        let err = build_operations(&json!([{ "rename": ["b = a"], "copy": ["c = a"] }])).unwrap_err();
        assert!(matches!(err, TabulaError::InvalidParameter { position: 0, .. }));
    }

    #[test]
    fn test_edit_specific_rows_shape() {
        let op = build_operation(
            0,
            "edit_specific_rows",
            &json!([{ "filter_rows": "1 < b < 3", "formula": "a = 666" }]),
        )
        .unwrap();
        match op {
            Operation::EditSpecificRows(edits) => {
                assert_eq!(edits.len(), 1);
                assert_eq!(edits[0].assignments[0].column, "a");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_extract_text_needs_one_method() {
        let both = json!({
            "text_column": "a",
            "column_to_store_extract": "b",
            "start": 1,
            "regex": "x"
        });
        assert!(build_operation(0, "extract_text", &both).is_err());

        let regex = json!({ "target_column": "a", "result_column": "b", "regex": "(\\d+) # digits" });
        assert!(build_operation(0, "extract_text", &regex).is_ok());
    }

    #[test]
    fn test_replace_text_anchors() {
        let op = build_operation(
            0,
            "replace_text",
            &json!([{ "target_column": "a", "text_to_find": "^", "replacement_text": "#" }]),
        )
        .unwrap();
        match op {
            Operation::ReplaceText(edits) => {
                assert_eq!(edits[0].change, TextChange::Prepend("#".to_string()));
                assert_eq!(edits[0].result_column, "a");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sum_up_by_shapes() {
        let op = build_operation(0, "sum_up_by", &json!(["name"])).unwrap();
        assert!(matches!(op, Operation::SumUpBy { sum: None, .. }));

        let op = build_operation(0, "sum_up_by", &json!({ "group_by": "name", "sum": ["v"] })).unwrap();
        assert!(matches!(op, Operation::SumUpBy { sum: Some(ref s), .. } if s == &["v".to_string()]));

        let err = build_operation(0, "sum_up_by", &json!({ "group_by": ["v"], "sum": ["v"] }));
        assert!(err.is_err());
    }

    #[test]
    fn test_change_date_format_validates_patterns() {
        let bad = json!({ "date_or_time_column": "d", "date_format": "%Q" });
        assert!(build_operation(0, "change_date_or_time_format", &bad).is_err());
    }

    #[test]
    fn test_ensure_format_shapes() {
        let op = build_operation(0, "ensure_column_is_in_this_format", &json!({ "n": "integer" })).unwrap();
        assert!(matches!(op, Operation::EnsureFormat(ref r) if r[0].hint == FormatHint::Integer));

        let err = build_operation(
            0,
            "ensure_column_is_in_this_format",
            &json!([{ "column": "n", "format": "colour" }]),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_every_listed_name_builds_with_some_shape() {
        for name in OPERATION_NAMES {
            let err = build_operation(0, name, &json!(42)).err();
            if let Some(err) = err {
                assert!(
                    !matches!(err, TabulaError::UnknownOperation { .. }),
                    "{} is not recognised",
                    name
                );
            }
        }
    }
}
