//! Input parsing and raw data handling.

mod parser;
mod source;

pub use parser::{format_name, Parser, ParserConfig};
pub use source::{RawTable, SourceMetadata};
