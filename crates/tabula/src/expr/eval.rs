//! Row-wise evaluation of bound expressions.

use std::cmp::Ordering;

use crate::error::{Result, TabulaError};
use crate::schema::{position_of, Column, ColumnType};
use crate::table::Value;

use super::{BinaryOperator, Expression};

/// An expression whose column references are resolved to positions.
///
/// Built by [`Expression::bind`]; reusable across every row of a table with
/// the columns it was bound against.
#[derive(Debug, Clone)]
pub struct BoundExpression {
    node: Node,
    result_type: ColumnType,
}

#[derive(Debug, Clone)]
enum Node {
    Literal(Value),
    Column(usize),
    Negate(Box<Node>),
    Binary {
        op: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl BoundExpression {
    /// Callers must have checked that every referenced column exists.
    pub(super) fn new(expression: &Expression, columns: &[Column]) -> Self {
        let (node, result_type) = lower(expression, columns);
        Self { node, result_type }
    }

    /// Declared type of the values this expression produces.
    pub fn result_type(&self) -> &ColumnType {
        &self.result_type
    }

    /// Evaluate against one row. `row_index` is used in error reports.
    pub fn evaluate(&self, row: &[Value], row_index: usize) -> Result<Value> {
        self.node.evaluate(row, row_index)
    }

    /// Evaluate as a row predicate: only an exact `true` selects the row.
    pub fn matches(&self, row: &[Value], row_index: usize) -> Result<bool> {
        match self.evaluate(row, row_index)? {
            Value::Boolean(b) => Ok(b),
            Value::Missing => Ok(false),
            other => Err(TabulaError::type_mismatch(
                row_index,
                format!("condition produced {} value '{}', expected boolean", other.type_name(), other),
            )),
        }
    }
}

/// Lower a tree to positional form, computing its static result type.
fn lower(expression: &Expression, columns: &[Column]) -> (Node, ColumnType) {
    match expression {
        Expression::Literal(value) => {
            let column_type = match value {
                Value::Integer(_) => ColumnType::Integer,
                Value::Real(_) => ColumnType::Real,
                Value::Boolean(_) => ColumnType::Boolean,
                Value::DateTime(_) => ColumnType::DateTime { pattern: None },
                Value::Text(_) | Value::Missing => ColumnType::Text,
            };
            (Node::Literal(value.clone()), column_type)
        }
        Expression::Column(name) => {
            // Binding has already rejected unknown names.
            let index = position_of(columns, name).unwrap_or_default();
            let column_type = columns
                .get(index)
                .map(|c| c.column_type.clone())
                .unwrap_or_default();
            (Node::Column(index), column_type)
        }
        Expression::Negate(inner) => {
            let (node, inner_type) = lower(inner, columns);
            let column_type = if inner_type == ColumnType::Integer {
                ColumnType::Integer
            } else {
                ColumnType::Real
            };
            (Node::Negate(Box::new(node)), column_type)
        }
        Expression::Binary { op, left, right } => {
            let (left, left_type) = lower(left, columns);
            let (right, right_type) = lower(right, columns);
            let column_type = if !op.is_arithmetic() {
                ColumnType::Boolean
            } else if *op != BinaryOperator::Divide
                && left_type == ColumnType::Integer
                && right_type == ColumnType::Integer
            {
                ColumnType::Integer
            } else {
                ColumnType::Real
            };
            let node = Node::Binary {
                op: *op,
                left: Box::new(left),
                right: Box::new(right),
            };
            (node, column_type)
        }
    }
}

impl Node {
    fn evaluate(&self, row: &[Value], row_index: usize) -> Result<Value> {
        match self {
            Node::Literal(value) => Ok(value.clone()),
            Node::Column(index) => Ok(row.get(*index).cloned().unwrap_or_default()),
            Node::Negate(inner) => match inner.evaluate(row, row_index)? {
                Value::Missing => Ok(Value::Missing),
                Value::Integer(i) => i.checked_neg().map(Value::Integer).ok_or_else(|| {
                    TabulaError::Arithmetic {
                        row: row_index,
                        message: format!("negating {} overflows", i),
                    }
                }),
                Value::Real(r) => Ok(Value::Real(-r)),
                other => Err(TabulaError::type_mismatch(
                    row_index,
                    format!("cannot negate {} value '{}'", other.type_name(), other),
                )),
            },
            Node::Binary { op, left, right } => {
                let left = left.evaluate(row, row_index)?;
                let right = right.evaluate(row, row_index)?;
                if op.is_arithmetic() {
                    arithmetic(*op, &left, &right, row_index)
                } else if op.is_comparison() {
                    compare(*op, &left, &right, row_index)
                } else {
                    logical(*op, &left, &right, row_index)
                }
            }
        }
    }
}

fn arithmetic(op: BinaryOperator, left: &Value, right: &Value, row: usize) -> Result<Value> {
    if left.is_missing() || right.is_missing() {
        return Ok(Value::Missing);
    }
    if !left.is_numeric() || !right.is_numeric() {
        return Err(TabulaError::type_mismatch(
            row,
            format!(
                "cannot apply '{}' to {} value '{}' and {} value '{}'",
                op.symbol(),
                left.type_name(),
                left,
                right.type_name(),
                right
            ),
        ));
    }

    let overflow = || TabulaError::Arithmetic {
        row,
        message: format!("'{} {} {}' overflows", left, op.symbol(), right),
    };

    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        match op {
            BinaryOperator::Add => return a.checked_add(*b).map(Value::Integer).ok_or_else(overflow),
            BinaryOperator::Subtract => {
                return a.checked_sub(*b).map(Value::Integer).ok_or_else(overflow);
            }
            BinaryOperator::Multiply => {
                return a.checked_mul(*b).map(Value::Integer).ok_or_else(overflow);
            }
            _ => {}
        }
    }

    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Ok(Value::Missing);
    };
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        _ => {
            if b == 0.0 {
                return Err(TabulaError::Arithmetic {
                    row,
                    message: format!("division by zero in '{} / {}'", left, right),
                });
            }
            a / b
        }
    };
    Ok(Value::Real(result))
}

fn compare(op: BinaryOperator, left: &Value, right: &Value, row: usize) -> Result<Value> {
    if left.is_missing() || right.is_missing() {
        return Ok(Value::Missing);
    }

    let ordered = matches!(
        op,
        BinaryOperator::Lt | BinaryOperator::Gt | BinaryOperator::Le | BinaryOperator::Ge
    );
    let ordering = match (left, right) {
        (Value::Boolean(_), Value::Boolean(_)) if ordered => None,
        _ => left.compare(right),
    };
    let Some(ordering) = ordering else {
        return Err(TabulaError::type_mismatch(
            row,
            format!(
                "cannot compare {} value '{}' with {} value '{}' using '{}'",
                left.type_name(),
                left,
                right.type_name(),
                right,
                op.symbol()
            ),
        ));
    };

    let result = match op {
        BinaryOperator::Lt => ordering == Ordering::Less,
        BinaryOperator::Gt => ordering == Ordering::Greater,
        BinaryOperator::Le => ordering != Ordering::Greater,
        BinaryOperator::Ge => ordering != Ordering::Less,
        BinaryOperator::Eq => ordering == Ordering::Equal,
        _ => ordering != Ordering::Equal,
    };
    Ok(Value::Boolean(result))
}

/// Three-valued AND/OR: missing is unknown.
fn logical(op: BinaryOperator, left: &Value, right: &Value, row: usize) -> Result<Value> {
    let truth = |value: &Value| match value {
        Value::Boolean(b) => Ok(Some(*b)),
        Value::Missing => Ok(None),
        other => Err(TabulaError::type_mismatch(
            row,
            format!(
                "'{}' needs boolean operands, found {} value '{}'",
                op.symbol(),
                other.type_name(),
                other
            ),
        )),
    };
    let (a, b) = (truth(left)?, truth(right)?);

    let result = match op {
        BinaryOperator::And => match (a, b) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        _ => match (a, b) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
    };
    Ok(result.map(Value::Boolean).unwrap_or(Value::Missing))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("a", ColumnType::Integer),
            Column::new("b", ColumnType::Integer),
            Column::new("r", ColumnType::Real),
            Column::text("name"),
        ]
    }

    fn eval(source: &str, row: &[Value]) -> Result<Value> {
        Expression::parse(source)
            .unwrap()
            .bind(&columns())
            .unwrap()
            .evaluate(row, 3)
    }

    fn row() -> Vec<Value> {
        vec![
            Value::Integer(5),
            Value::Integer(3),
            Value::Real(0.5),
            Value::text("Melbourne"),
        ]
    }

    #[test]
    fn test_integer_arithmetic_stays_integer() {
        assert_eq!(eval("a + b * 2", &row()).unwrap(), Value::Integer(11));
        assert_eq!(eval("a / b", &row()).unwrap(), Value::Real(5.0 / 3.0));
        assert_eq!(eval("a + r", &row()).unwrap(), Value::Real(5.5));
        assert_eq!(eval("1 + 2", &row()).unwrap(), Value::Integer(3));
    }

    #[test]
    fn test_division_by_zero_names_row() {
        let err = eval("a / (b - 3)", &row()).unwrap_err();
        assert!(matches!(err, TabulaError::Arithmetic { row: 3, .. }));
    }

    #[test]
    fn test_overflow_is_arithmetic_error() {
        let columns = vec![Column::new("big", ColumnType::Integer)];
        let bound = Expression::parse("big * 2").unwrap().bind(&columns).unwrap();
        let err = bound.evaluate(&[Value::Integer(i64::MAX)], 0).unwrap_err();
        assert!(matches!(err, TabulaError::Arithmetic { row: 0, .. }));
    }

    #[test]
    fn test_missing_propagates() {
        let mut row = row();
        row[0] = Value::Missing;
        assert_eq!(eval("a + 1", &row).unwrap(), Value::Missing);
        assert_eq!(eval("a > 1", &row).unwrap(), Value::Missing);
        assert_eq!(eval("a > 1 & b > 100", &row).unwrap(), Value::Boolean(false));
        assert_eq!(eval("a > 1 | b > 1", &row).unwrap(), Value::Boolean(true));
        assert_eq!(eval("a > 1 | b > 100", &row).unwrap(), Value::Missing);
    }

    #[test]
    fn test_text_arithmetic_is_type_mismatch() {
        let err = eval("name + 1", &row()).unwrap_err();
        assert!(matches!(err, TabulaError::TypeMismatch { row: Some(3), .. }));
    }

    #[test]
    fn test_numeric_against_text_is_type_mismatch() {
        let err = eval("a > 'x'", &row()).unwrap_err();
        assert!(matches!(err, TabulaError::TypeMismatch { .. }));
    }

    #[test]
    fn test_text_equality_is_exact() {
        assert_eq!(eval("name == 'Melbourne'", &row()).unwrap(), Value::Boolean(true));
        assert_eq!(eval("name == 'melbourne'", &row()).unwrap(), Value::Boolean(false));
        assert_eq!(eval("name != 'Sydney'", &row()).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_chained_comparison() {
        assert_eq!(eval("1 < b < 4", &row()).unwrap(), Value::Boolean(true));
        assert_eq!(eval("1 < a < 4", &row()).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_boolean_operands_required() {
        let err = eval("a & b", &row()).unwrap_err();
        assert!(matches!(err, TabulaError::TypeMismatch { .. }));
    }

    #[test]
    fn test_result_types() {
        let bind = |s: &str| Expression::parse(s).unwrap().bind(&columns()).unwrap();
        assert_eq!(bind("a + b").result_type(), &ColumnType::Integer);
        assert_eq!(bind("a / b").result_type(), &ColumnType::Real);
        assert_eq!(bind("a > b").result_type(), &ColumnType::Boolean);
        assert_eq!(bind("name").result_type(), &ColumnType::Text);
    }

    #[test]
    fn test_matches_rejects_non_boolean() {
        let bound = Expression::parse("a + 1").unwrap().bind(&columns()).unwrap();
        assert!(bound.matches(&row(), 0).is_err());
        let bound = Expression::parse("a > b").unwrap().bind(&columns()).unwrap();
        assert!(bound.matches(&row(), 0).unwrap());
    }
}
