//! The operation catalogue and the validated parameters of each operation.

use std::fmt;

use regex::Regex;

use crate::error::Result;
use crate::expr::Expression;
use crate::schema::FormatHint;
use crate::table::Table;

use super::ops;

/// An expression together with the text it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpression {
    pub source: String,
    pub expression: Expression,
}

impl fmt::Display for ParsedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// `from` → `to` column name pair for `rename` and `copy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub from: String,
    pub to: String,
}

/// `column = expression`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: ParsedExpression,
}

/// Assignments applied to the rows selected by a condition.
#[derive(Debug, Clone, PartialEq)]
pub struct RowEdit {
    pub condition: ParsedExpression,
    pub assignments: Vec<Assignment>,
}

/// Re-render a date/time column with another pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormatChange {
    pub column: String,
    pub result_column: String,
    pub to_format: String,
    /// Pattern used to read text cells; date/time cells need none.
    pub from_format: Option<String>,
}

/// How `extract_text` selects part of a value.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// Zero-based character offset and optional character count.
    Range { start: usize, length: Option<usize> },
    /// First capture group of the pattern, or the whole match without groups.
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub struct TextExtract {
    pub column: String,
    pub target: String,
    pub extraction: Extraction,
}

/// Pull one query-string parameter out of a URL column.
#[derive(Debug, Clone)]
pub struct QueryExtract {
    pub column: String,
    pub target: String,
    pub key: String,
    pub(crate) pattern: Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextChange {
    Replace { find: String, replacement: String },
    Prepend(String),
    Append(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub column: String,
    pub result_column: String,
    pub change: TextChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRequirement {
    pub column: String,
    pub hint: FormatHint,
}

/// A validated pipeline step.
#[derive(Debug, Clone)]
pub enum Operation {
    Rename(Vec<ColumnMapping>),
    Copy(Vec<ColumnMapping>),
    Formula(Vec<Assignment>),
    FilterRows(Vec<ParsedExpression>),
    EditSpecificRows(Vec<RowEdit>),
    FilterColumns(Vec<String>),
    RemoveColumns(Vec<String>),
    /// Equality over these columns; every column when `None`.
    RemoveDuplicates(Option<Vec<String>>),
    ChangeDateOrTimeFormat(Vec<DateFormatChange>),
    ExtractText(Vec<TextExtract>),
    ExtractQueryString(Vec<QueryExtract>),
    ReplaceText(Vec<TextEdit>),
    AddTextAtStart(Vec<TextEdit>),
    AddTextAtEnd(Vec<TextEdit>),
    /// Sum columns per group; every other column when `sum` is `None`.
    SumUpBy {
        group_by: Vec<String>,
        sum: Option<Vec<String>>,
    },
    MakeColumnNamesLowercase,
    MakeColumnNamesAlphanumeric,
    EnsureFormat(Vec<FormatRequirement>),
}

impl Operation {
    /// Configuration name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Rename(_) => "rename",
            Operation::Copy(_) => "copy",
            Operation::Formula(_) => "formula",
            Operation::FilterRows(_) => "filter_rows",
            Operation::EditSpecificRows(_) => "edit_specific_rows",
            Operation::FilterColumns(_) => "filter_columns",
            Operation::RemoveColumns(_) => "remove_columns",
            Operation::RemoveDuplicates(_) => "remove_duplicates",
            Operation::ChangeDateOrTimeFormat(_) => "change_date_or_time_format",
            Operation::ExtractText(_) => "extract_text",
            Operation::ExtractQueryString(_) => "extract_query_string",
            Operation::ReplaceText(_) => "replace_text",
            Operation::AddTextAtStart(_) => "add_text_at_start",
            Operation::AddTextAtEnd(_) => "add_text_at_end",
            Operation::SumUpBy { .. } => "sum_up_by",
            Operation::MakeColumnNamesLowercase => "make_column_names_lowercase",
            Operation::MakeColumnNamesAlphanumeric => "make_column_names_alphanumeric",
            Operation::EnsureFormat(_) => "ensure_column_is_in_this_format",
        }
    }

    /// Apply the operation to a table.
    pub fn apply(&self, table: Table) -> Result<Table> {
        match self {
            Operation::Rename(mappings) => ops::columns::rename(table, mappings),
            Operation::Copy(mappings) => ops::columns::copy(table, mappings),
            Operation::Formula(assignments) => ops::rows::formula(table, assignments),
            Operation::FilterRows(conditions) => ops::rows::filter_rows(table, conditions),
            Operation::EditSpecificRows(edits) => ops::rows::edit_specific_rows(table, edits),
            Operation::FilterColumns(names) => ops::columns::filter_columns(table, names),
            Operation::RemoveColumns(names) => ops::columns::remove_columns(table, names),
            Operation::RemoveDuplicates(subset) => {
                ops::rows::remove_duplicates(table, subset.as_deref())
            }
            Operation::ChangeDateOrTimeFormat(changes) => {
                ops::dates::change_date_or_time_format(table, changes)
            }
            Operation::ExtractText(extracts) => ops::text::extract_text(table, extracts),
            Operation::ExtractQueryString(extracts) => {
                ops::text::extract_query_string(table, extracts)
            }
            Operation::ReplaceText(edits)
            | Operation::AddTextAtStart(edits)
            | Operation::AddTextAtEnd(edits) => ops::text::edit_text(table, edits),
            Operation::SumUpBy { group_by, sum } => {
                ops::group::sum_up_by(table, group_by, sum.as_deref())
            }
            Operation::MakeColumnNamesLowercase => ops::columns::lowercase_names(table),
            Operation::MakeColumnNamesAlphanumeric => ops::columns::alphanumeric_names(table),
            Operation::EnsureFormat(requirements) => ops::dates::ensure_format(table, requirements),
        }
    }

    /// Human-readable one-line description.
    pub fn description(&self) -> String {
        match self {
            Operation::Rename(mappings) => format!("Rename {}", list_mappings(mappings)),
            Operation::Copy(mappings) => format!("Copy {}", list_mappings(mappings)),
            Operation::Formula(assignments) => {
                let items: Vec<String> = assignments
                    .iter()
                    .map(|a| format!("'{}' = {}", a.column, a.value))
                    .collect();
                format!("Compute {}", items.join("; "))
            }
            Operation::FilterRows(conditions) => {
                let items: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();
                format!("Keep rows where {}", items.join(" and then "))
            }
            Operation::EditSpecificRows(edits) => {
                let items: Vec<String> = edits
                    .iter()
                    .map(|e| {
                        let fields: Vec<&str> =
                            e.assignments.iter().map(|a| a.column.as_str()).collect();
                        format!("set {} where {}", quote_all(&fields), e.condition)
                    })
                    .collect();
                format!("Edit rows: {}", items.join("; "))
            }
            Operation::FilterColumns(names) => format!("Keep only columns {}", quote_all(names)),
            Operation::RemoveColumns(names) => format!("Remove columns {}", quote_all(names)),
            Operation::RemoveDuplicates(None) => "Remove duplicate rows".to_string(),
            Operation::RemoveDuplicates(Some(names)) => {
                format!("Remove rows repeating {}", quote_all(names))
            }
            Operation::ChangeDateOrTimeFormat(changes) => {
                let items: Vec<String> = changes
                    .iter()
                    .map(|c| {
                        let target = if c.result_column == c.column {
                            String::new()
                        } else {
                            format!(" into '{}'", c.result_column)
                        };
                        format!("'{}' as {}{}", c.column, c.to_format, target)
                    })
                    .collect();
                format!("Reformat dates {}", items.join(", "))
            }
            Operation::ExtractText(extracts) => {
                let items: Vec<String> = extracts
                    .iter()
                    .map(|e| {
                        let how = match &e.extraction {
                            Extraction::Range { start, length: Some(n) } => {
                                format!("characters {}..{}", start, start.saturating_add(*n))
                            }
                            Extraction::Range { start, length: None } => {
                                format!("characters from {}", start)
                            }
                            Extraction::Pattern(re) => format!("/{}/", re.as_str().trim()),
                        };
                        format!("{} of '{}' into '{}'", how, e.column, e.target)
                    })
                    .collect();
                format!("Extract {}", items.join(", "))
            }
            Operation::ExtractQueryString(extracts) => {
                let items: Vec<String> = extracts
                    .iter()
                    .map(|e| format!("'{}' from '{}' into '{}'", e.key, e.column, e.target))
                    .collect();
                format!("Extract query parameter {}", items.join(", "))
            }
            Operation::ReplaceText(edits)
            | Operation::AddTextAtStart(edits)
            | Operation::AddTextAtEnd(edits) => {
                let items: Vec<String> = edits.iter().map(describe_text_edit).collect();
                items.join(", ")
            }
            Operation::SumUpBy { group_by, sum } => match sum {
                Some(sum) => format!("Sum {} by {}", quote_all(sum), quote_all(group_by)),
                None => format!("Sum all other columns by {}", quote_all(group_by)),
            },
            Operation::MakeColumnNamesLowercase => "Lowercase column names".to_string(),
            Operation::MakeColumnNamesAlphanumeric => {
                "Make column names alphanumeric".to_string()
            }
            Operation::EnsureFormat(requirements) => {
                let items: Vec<String> = requirements
                    .iter()
                    .map(|r| format!("'{}' as {}", r.column, r.hint))
                    .collect();
                format!("Require {}", items.join(", "))
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn list_mappings(mappings: &[ColumnMapping]) -> String {
    mappings
        .iter()
        .map(|m| format!("'{}' → '{}'", m.from, m.to))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quote_all<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_text_edit(edit: &TextEdit) -> String {
    let target = if edit.result_column == edit.column {
        String::new()
    } else {
        format!(" into '{}'", edit.result_column)
    };
    match &edit.change {
        TextChange::Replace { find, replacement } => format!(
            "Replace '{}' with '{}' in '{}'{}",
            find, replacement, edit.column, target
        ),
        TextChange::Prepend(text) => format!("Prefix '{}' with '{}'{}", edit.column, text, target),
        TextChange::Append(text) => format!("Suffix '{}' with '{}'{}", edit.column, text, target),
    }
}
