//! Operation catalogue, pipeline builder and executor.

mod builder;
mod operation;
mod ops;
mod pipeline;

pub use builder::{build_operation, build_operations, split_assignment, OPERATION_NAMES};
pub use operation::{
    Assignment, ColumnMapping, DateFormatChange, Extraction, FormatRequirement, Operation,
    ParsedExpression, QueryExtract, RowEdit, TextChange, TextEdit, TextExtract,
};
pub use pipeline::Pipeline;
