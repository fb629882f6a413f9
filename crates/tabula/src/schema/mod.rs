//! Column typing: types, format hints and schema resolution.

mod column;
mod hint;
mod resolver;
pub mod temporal;
mod types;

pub use column::{position_of, Column};
pub use hint::{infer, is_null_token, FormatHint};
pub use resolver::{SchemaResolver, SkipRows};
pub use types::ColumnType;
