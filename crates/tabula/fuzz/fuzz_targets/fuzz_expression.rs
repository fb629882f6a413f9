//! Fuzz target for the expression language.
//!
//! This fuzzer tests that expressions:
//! 1. Never panic while parsing
//! 2. Never panic while binding or evaluating against a fixed row
//! 3. Print back to text that parses again

#![no_main]

use libfuzzer_sys::fuzz_target;
use tabula::expr::Expression;
use tabula::{Column, ColumnType, Value};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if source.len() > 10_000 {
        return;
    }

    let Ok(expression) = Expression::parse(source) else {
        return;
    };
    assert!(Expression::parse(&expression.to_string()).is_ok());

    let columns = vec![
        Column::text("name"),
        Column::new("a", ColumnType::Integer),
        Column::new("b", ColumnType::Real),
        Column::new("flag", ColumnType::Boolean),
    ];
    let rows = [
        vec![Value::text("x"), Value::Integer(i64::MAX), Value::Real(0.0), Value::Boolean(true)],
        vec![Value::Missing, Value::Integer(0), Value::Real(-1.5), Value::Missing],
    ];

    if let Ok(bound) = expression.bind(&columns) {
        for (i, row) in rows.iter().enumerate() {
            let _ = bound.evaluate(row, i);
        }
    }
});
