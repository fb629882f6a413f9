//! Expression language for `formula` and `filter_rows`.
//!
//! An expression is parsed once into an [`Expression`] tree, then bound to a
//! table's columns with [`Expression::bind`]. Binding resolves every column
//! name to its position, so unknown names are reported before any row is
//! evaluated and evaluation itself only indexes into rows.
//!
//! ```
//! use tabula::expr::Expression;
//! use tabula::schema::{Column, ColumnType};
//! use tabula::Value;
//!
//! let expr = Expression::parse("price * quantity").unwrap();
//! let columns = vec![
//!     Column::new("price", ColumnType::Real),
//!     Column::new("quantity", ColumnType::Integer),
//! ];
//! let bound = expr.bind(&columns).unwrap();
//! let row = vec![Value::Real(2.5), Value::Integer(4)];
//! assert_eq!(bound.evaluate(&row, 0).unwrap(), Value::Real(10.0));
//! ```

mod eval;
mod lexer;
mod parser;

pub use eval::BoundExpression;

use std::fmt;

use indexmap::IndexSet;
use thiserror::Error;

use crate::error::{Result, TabulaError};
use crate::schema::{position_of, Column};
use crate::table::Value;

/// Failure to parse an expression, with the byte offset where it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at offset {position})")]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

impl ParseError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Binary operators, grouped by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Lt
                | BinaryOperator::Gt
                | BinaryOperator::Le
                | BinaryOperator::Ge
                | BinaryOperator::Eq
                | BinaryOperator::Ne
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::Le => "<=",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::And => "&",
            BinaryOperator::Or => "|",
        }
    }
}

/// A parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Number or string literal.
    Literal(Value),
    /// Column reference by name.
    Column(String),
    /// Arithmetic negation.
    Negate(Box<Expression>),
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    /// Parse expression source text.
    pub fn parse(source: &str) -> std::result::Result<Expression, ParseError> {
        parser::parse(source)
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Expression {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Column names referenced by the expression, in first-use order.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut names = IndexSet::new();
        self.collect_columns(&mut names);
        names.into_iter().collect()
    }

    fn collect_columns<'a>(&'a self, names: &mut IndexSet<&'a str>) {
        match self {
            Expression::Literal(_) => {}
            Expression::Column(name) => {
                names.insert(name.as_str());
            }
            Expression::Negate(inner) => inner.collect_columns(names),
            Expression::Binary { left, right, .. } => {
                left.collect_columns(names);
                right.collect_columns(names);
            }
        }
    }

    /// Resolve column names to positions in `columns`.
    ///
    /// Fails with [`TabulaError::UnknownColumn`] for the first name that is
    /// not a column.
    pub fn bind(&self, columns: &[Column]) -> Result<BoundExpression> {
        if let Some(missing) = self
            .referenced_columns()
            .into_iter()
            .find(|name| position_of(columns, name).is_none())
        {
            return Err(TabulaError::unknown_column(missing));
        }
        Ok(BoundExpression::new(self, columns))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(Value::Text(s)) => {
                write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            Expression::Literal(Value::Real(r)) => {
                // Keep the point so the literal reads back as a real
                let text = r.to_string();
                if text.contains('.') || !r.is_finite() {
                    write!(f, "{}", text)
                } else {
                    write!(f, "{}.0", text)
                }
            }
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Column(name) => {
                let plain = name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
                    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                if plain {
                    write!(f, "{}", name)
                } else {
                    write!(f, "`{}`", name)
                }
            }
            Expression::Negate(inner) => write!(f, "-{}", inner),
            Expression::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
        }
    }
}
