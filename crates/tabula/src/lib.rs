//! Tabula: declarative ETL engine for tabular datasets.
//!
//! A configuration document describes how to read a delimited file (header
//! position, skipped rows, per-column format hints) and an ordered list of
//! actions to apply to it. Tabula compiles the document once, checks every
//! action against the columns it will see, then runs the actions in order.
//!
//! # Core Principles
//!
//! - **Fail before data**: unknown operations, bad parameters and malformed
//!   expressions are rejected when the configuration is compiled
//! - **Fail before rows**: column references are checked for every step
//!   before the first step touches a row
//! - **Typed columns**: every column carries one type and every cell agrees
//!   with it
//!
//! # Example
//!
//! ```no_run
//! use tabula::Transformer;
//!
//! let transformer = Transformer::from_json_str(r#"{
//!     "read_these_columns_in_these_formats": { "air_temp": "number" },
//!     "list_of_actions": [
//!         { "filter_rows": ["air_temp > 20"] },
//!         { "filter_columns": ["name", "air_temp"] }
//!     ]
//! }"#).unwrap();
//!
//! let result = transformer.transform_file("weather.csv").unwrap();
//! println!("Rows: {}", result.table.row_count());
//! ```

pub mod config;
pub mod error;
pub mod expr;
pub mod input;
pub mod output;
pub mod schema;
pub mod table;
pub mod transform;

mod transformer;

pub use crate::transformer::{TransformResult, Transformer};
pub use config::TransformConfig;
pub use error::{Result, TabulaError};
pub use expr::{Expression, ParseError};
pub use input::{RawTable, SourceMetadata};
pub use schema::{Column, ColumnType, FormatHint};
pub use table::{Row, Table, Value};
pub use transform::{Operation, Pipeline};
