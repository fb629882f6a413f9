//! Expression parsing and evaluation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tabula::expr::Expression;
use tabula::{Column, ColumnType, Value};

const FILTER: &str = "air_temp > 20 & (rain * 10 <= 5 | name == 'Melbourne') & 0 < wind < 40";

fn columns() -> Vec<Column> {
    vec![
        Column::text("name"),
        Column::new("air_temp", ColumnType::Real),
        Column::new("rain", ColumnType::Real),
        Column::new("wind", ColumnType::Integer),
    ]
}

fn rows(count: usize) -> Vec<Vec<Value>> {
    (0..count)
        .map(|i| {
            vec![
                Value::text(if i % 3 == 0 { "Melbourne" } else { "Geelong" }),
                Value::Real(10.0 + (i % 30) as f64),
                if i % 11 == 0 { Value::Missing } else { Value::Real((i % 5) as f64 * 0.2) },
                Value::Integer((i % 60) as i64),
            ]
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_filter", |b| {
        b.iter(|| black_box(Expression::parse(black_box(FILTER)).unwrap()))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let bound = Expression::parse(FILTER).unwrap().bind(&columns()).unwrap();
    let rows = rows(10_000);

    c.bench_function("evaluate_filter_10k", |b| {
        b.iter(|| {
            rows.iter()
                .enumerate()
                .filter(|(i, row)| bound.matches(row, *i).unwrap())
                .count()
        })
    });

    let formula = Expression::parse("air_temp * 9 / 5 + 32 - wind")
        .unwrap()
        .bind(&columns())
        .unwrap();
    c.bench_function("evaluate_formula_10k", |b| {
        b.iter(|| {
            for (i, row) in rows.iter().enumerate() {
                black_box(formula.evaluate(row, i).unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_parse, bench_evaluate);
criterion_main!(benches);
