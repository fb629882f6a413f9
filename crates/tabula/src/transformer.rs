//! `Transformer`: load, resolve and transform in one call.

use std::path::Path;

use serde_json::Value as Json;
use tracing::debug;

use crate::config::TransformConfig;
use crate::error::{Result, TabulaError};
use crate::input::{Parser, ParserConfig, RawTable, SourceMetadata};
use crate::schema::{Column, SchemaResolver, SkipRows};
use crate::table::Table;
use crate::transform::Pipeline;

/// Result of transforming a file.
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Metadata about the source file.
    pub source: SourceMetadata,
    /// The transformed table.
    pub table: Table,
}

/// A configuration compiled into a schema resolver and a pipeline.
///
/// Building a transformer validates the whole configuration without reading
/// any data; the same transformer can then be run on many inputs.
#[derive(Debug, Clone)]
pub struct Transformer {
    config: TransformConfig,
    resolver: SchemaResolver,
    pipeline: Pipeline,
}

impl Transformer {
    /// Compile a parsed configuration.
    pub fn new(config: TransformConfig) -> Result<Self> {
        config.validate()?;
        let resolver = config.resolver()?;
        let pipeline = config.pipeline()?;
        Ok(Self {
            config,
            resolver,
            pipeline,
        })
    }

    /// Compile a configuration document.
    pub fn from_value(value: &Json) -> Result<Self> {
        Self::new(TransformConfig::from_value(value)?)
    }

    /// Compile a configuration written as JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::new(TransformConfig::from_json_str(text)?)
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Read a delimited file and transform it.
    pub fn transform_file(&self, path: impl AsRef<Path>) -> Result<TransformResult> {
        let (raw, source) = self.parser()?.parse_file(path)?;
        debug!(file = %source.file, format = %source.format, rows = raw.row_count(), "Loaded file");

        let table = self.resolve(&raw, source.delimiter as u8)?;
        let table = self.pipeline.execute(table)?;
        Ok(TransformResult { source, table })
    }

    /// Read a file's columns and check the pipeline against them.
    ///
    /// Cells are typed but no operation runs on a row. Returns the columns
    /// the pipeline would produce.
    pub fn plan_file(&self, path: impl AsRef<Path>) -> Result<Vec<Column>> {
        let (raw, source) = self.parser()?.parse_file(path)?;
        let table = self.resolve(&raw, source.delimiter as u8)?;
        self.pipeline.plan(table.columns())
    }

    /// Transform delimited text held in memory.
    pub fn transform_bytes(&self, bytes: &[u8]) -> Result<Table> {
        let parser = self.parser()?;
        let delimiter = parser.delimiter_for(bytes)?;
        let raw = parser.parse_bytes(bytes, delimiter)?;
        self.pipeline.execute(self.resolve(&raw, delimiter)?)
    }

    /// Transform an already-loaded raw table.
    ///
    /// `read_from_row_that_starts_with` matches rows joined with the configured
    /// separator, or `,` when none is configured.
    pub fn transform_raw(&self, raw: &RawTable) -> Result<Table> {
        let delimiter = self.config.delimiter()?.unwrap_or(b',');
        self.pipeline.execute(self.resolve(raw, delimiter)?)
    }

    fn parser(&self) -> Result<Parser> {
        Ok(Parser::with_config(ParserConfig {
            delimiter: self.config.delimiter()?,
            ..ParserConfig::default()
        }))
    }

    fn resolve(&self, raw: &RawTable, delimiter: u8) -> Result<Table> {
        let skip = self.skip_rows(raw, delimiter)?;
        let table = self.resolver.resolve(raw, skip)?;
        debug!(
            rows = table.row_count(),
            columns = table.column_count(),
            "Resolved table"
        );
        Ok(table)
    }

    fn skip_rows(&self, raw: &RawTable, delimiter: u8) -> Result<SkipRows> {
        let mut skip = self.config.skip_rows();
        if let Some(prefix) = &self.config.read_from_row_that_starts_with {
            skip.header = raw
                .find_row_starting_with(prefix, delimiter as char)
                .ok_or_else(|| TabulaError::Schema {
                    column: None,
                    row: None,
                    message: format!("no row starts with '{}'", prefix),
                })?;
        }
        Ok(skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use serde_json::json;

    #[test]
    fn test_transform_bytes() {
        let transformer = Transformer::from_value(&json!({
            "read_these_columns_in_these_formats": { "v": "integer" },
            "list_of_actions": [
                { "sum_up_by": ["name"] }
            ]
        }))
        .unwrap();

        let table = transformer
            .transform_bytes(b"name,v\nA,1\nA,2\nB,5\n")
            .unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value(0, "v"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_read_from_row_that_starts_with() {
        let transformer = Transformer::from_value(&json!({
            "read_from_row_that_starts_with": "name,",
            "number_of_rows_to_skip_at_file_end": 1
        }))
        .unwrap();
        let raw = RawTable::from_rows(&[
            vec!["Weather report", ""],
            vec!["name", "temp"],
            vec!["Melbourne", "21"],
            vec!["Copyright", ""],
        ]);

        let table = transformer.transform_raw(&raw).unwrap();
        assert_eq!(table.column_names(), vec!["name", "temp"]);
        assert_eq!(table.row_count(), 1);

        let missing = Transformer::from_value(&json!({ "read_from_row_that_starts_with": "zzz" }))
            .unwrap()
            .transform_raw(&raw)
            .unwrap_err();
        assert!(matches!(missing, TabulaError::Schema { .. }));
    }

    #[test]
    fn test_build_fails_without_data() {
        let err = Transformer::from_value(&json!({
            "list_of_actions": [{ "rename": ["a = b"] }, { "frobnicate": [] }]
        }))
        .unwrap_err();
        assert!(matches!(err, TabulaError::UnknownOperation { position: 1, .. }));
    }
}
