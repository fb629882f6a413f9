//! The transformation configuration document.
//!
//! The document arrives as a generic `serde_json::Value` (or JSON text); any
//! loader that produces that structure can feed it. Keys:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `column_headers_are_on_row_number` | 1-based header row (default 1) |
//! | `number_of_rows_to_skip_at_file_start` | rows before the header; wins over the row number |
//! | `number_of_rows_to_skip_at_file_end` | footer rows to drop |
//! | `read_from_row_that_starts_with` | header is the first row starting with this text |
//! | `column_separator` | single character; detected when absent |
//! | `read_these_columns_in_these_formats` | `column: hint` or `hint: [columns]` |
//! | `columns_with_dates_or_times` | columns read with the `date` hint |
//! | `only_load_these_columns` | columns to keep while loading |
//! | `infer_column_types` | type unhinted numeric columns |
//! | `encoding` | `utf-8` only |
//! | `list_of_actions` | the ordered operations |

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::{Result, TabulaError};
use crate::schema::{FormatHint, SchemaResolver, SkipRows};
use crate::transform::Pipeline;

/// Parsed configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_headers_are_on_row_number: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_rows_to_skip_at_file_start: Option<usize>,
    #[serde(default)]
    pub number_of_rows_to_skip_at_file_end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_from_row_that_starts_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_separator: Option<String>,
    /// Either `column → hint` or `hint → [columns]` entries, freely mixed.
    #[serde(default)]
    pub read_these_columns_in_these_formats: IndexMap<String, HintEntry>,
    #[serde(default)]
    pub columns_with_dates_or_times: Vec<String>,
    #[serde(default)]
    pub only_load_these_columns: Vec<String>,
    #[serde(default)]
    pub infer_column_types: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default)]
    pub list_of_actions: Json,
}

/// Value side of a `read_these_columns_in_these_formats` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HintEntry {
    /// The key is a column, the value its hint.
    Hint(String),
    /// The key is a hint, the value the columns it applies to.
    Columns(Vec<String>),
}

impl TransformConfig {
    /// Read a configuration from a generic document and validate it.
    pub fn from_value(value: &Json) -> Result<Self> {
        let config = Self::deserialize(value).map_err(|e| TabulaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration from JSON text and validate it.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Json = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Check settings that do not depend on the data.
    pub fn validate(&self) -> Result<()> {
        if let Some(encoding) = &self.encoding {
            let normalized = encoding.trim().to_lowercase().replace(['-', '_'], "");
            if normalized != "utf8" {
                return Err(TabulaError::Config(format!(
                    "unsupported encoding '{}': only UTF-8 is read",
                    encoding
                )));
            }
        }
        if self.column_headers_are_on_row_number == Some(0) {
            return Err(TabulaError::Config(
                "column_headers_are_on_row_number counts from 1".to_string(),
            ));
        }
        if matches!(&self.read_from_row_that_starts_with, Some(prefix) if prefix.is_empty()) {
            return Err(TabulaError::Config(
                "read_from_row_that_starts_with must not be empty".to_string(),
            ));
        }
        self.delimiter()?;
        self.hints()?;
        Ok(())
    }

    /// Rows skipped before the header and after the data.
    pub fn skip_rows(&self) -> SkipRows {
        let header = self
            .number_of_rows_to_skip_at_file_start
            .or_else(|| self.column_headers_are_on_row_number.map(|n| n.saturating_sub(1)))
            .unwrap_or(0);
        SkipRows {
            header,
            footer: self.number_of_rows_to_skip_at_file_end,
        }
    }

    /// Configured column separator, or `None` to detect it.
    pub fn delimiter(&self) -> Result<Option<u8>> {
        let Some(separator) = &self.column_separator else {
            return Ok(None);
        };
        match separator.as_str() {
            "\t" | "\\t" | "tab" => Ok(Some(b'\t')),
            s if s.len() == 1 && s.is_ascii() => Ok(Some(s.as_bytes()[0])),
            s => Err(TabulaError::Config(format!(
                "column_separator must be a single ASCII character, found '{}'",
                s
            ))),
        }
    }

    /// Per-column format hints, in configuration order.
    pub fn hints(&self) -> Result<IndexMap<String, FormatHint>> {
        let mut hints = IndexMap::new();
        for (key, entry) in &self.read_these_columns_in_these_formats {
            match entry {
                HintEntry::Hint(hint) => {
                    hints.insert(key.clone(), parse_hint(key, hint)?);
                }
                HintEntry::Columns(columns) => {
                    let hint = key.parse::<FormatHint>().map_err(TabulaError::Config)?;
                    for column in columns {
                        hints.insert(column.clone(), hint.clone());
                    }
                }
            }
        }
        for column in &self.columns_with_dates_or_times {
            let dated = matches!(
                hints.get(column),
                Some(FormatHint::Date | FormatHint::DatePattern(_))
            );
            if !dated {
                hints.insert(column.clone(), FormatHint::Date);
            }
        }
        Ok(hints)
    }

    /// Schema resolver for the configured hints and projection.
    pub fn resolver(&self) -> Result<SchemaResolver> {
        let resolver = self
            .hints()?
            .into_iter()
            .fold(SchemaResolver::new(), |r, (column, hint)| r.with_hint(column, hint));
        Ok(resolver
            .only_load(self.only_load_these_columns.clone())
            .infer_types(self.infer_column_types))
    }

    /// Build the operation pipeline from `list_of_actions`.
    pub fn pipeline(&self) -> Result<Pipeline> {
        Pipeline::from_actions(&self.list_of_actions)
    }
}

fn parse_hint(column: &str, hint: &str) -> Result<FormatHint> {
    hint.parse::<FormatHint>()
        .map_err(|e| TabulaError::schema(column, None, e))
}
