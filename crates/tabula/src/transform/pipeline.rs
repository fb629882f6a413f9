//! Ordered, validated sequence of operations and its executor.

use serde_json::Value as Json;
use tracing::{debug, info};

use crate::error::{Result, TabulaError};
use crate::schema::Column;
use crate::table::Table;

use super::builder::build_operations;
use super::operation::Operation;

/// An immutable list of operations, reusable across input tables.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    operations: Vec<Operation>,
}

impl Pipeline {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    /// Build a pipeline from the configuration's action list.
    ///
    /// Fails with [`TabulaError::UnknownOperation`] or
    /// [`TabulaError::InvalidParameter`] naming the offending position.
    pub fn from_actions(actions: &Json) -> Result<Self> {
        let operations = build_operations(actions)?;
        debug!(operations = operations.len(), "Built pipeline");
        Ok(Self::new(operations))
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// One description line per operation.
    pub fn describe(&self) -> Vec<String> {
        self.operations.iter().map(Operation::description).collect()
    }

    /// Check the pipeline against input columns without touching any row.
    ///
    /// Every step runs on a table with these columns and no rows, so column
    /// references, name collisions and expression identifiers are checked for
    /// all steps. Returns the columns the pipeline would produce.
    pub fn plan(&self, columns: &[Column]) -> Result<Vec<Column>> {
        let mut table = Table::empty(columns.to_vec())?;
        for (index, operation) in self.operations.iter().enumerate() {
            table = operation
                .apply(table)
                .map_err(|e| step_error(index, operation, e))?;
        }
        let (columns, _) = table.into_parts();
        Ok(columns)
    }

    /// Run every operation in order.
    ///
    /// The whole pipeline is planned first; the first failing step aborts the
    /// run and no partially transformed table is returned.
    pub fn execute(&self, table: Table) -> Result<Table> {
        self.plan(table.columns())?;

        let mut table = table;
        for (index, operation) in self.operations.iter().enumerate() {
            table = operation
                .apply(table)
                .map_err(|e| step_error(index, operation, e))?;
            info!(
                step = index,
                operation = operation.name(),
                rows = table.row_count(),
                columns = table.column_count(),
                "Applied operation"
            );
        }
        Ok(table)
    }
}

fn step_error(index: usize, operation: &Operation, source: TabulaError) -> TabulaError {
    TabulaError::Step {
        index,
        operation: operation.name().to_string(),
        source: Box::new(source),
    }
}
