//! Integration tests for tabula: configuration, file loading, pipeline and
//! sink together.

use std::io::Write;
use tempfile::NamedTempFile;

use serde_json::json;
use tabula::{output, ColumnType, TabulaError, Transformer, Value};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

/// Observations in the layout of a weather-bureau export: a title block
/// above the header, a copyright footer and one repeated reading.
const WEATHER: &str = "Bureau of Meteorology,,,,\n\
                       Station,Melbourne (Olympic Park),,,\n\
                       name,local_date_time_full,air_temp,rain_trace,wind_dir\n\
                       Melbourne,20140113120000,41.6,0.0,N\n\
                       Melbourne,20140113113000,40.9,-,NNW\n\
                       Geelong,20140113120000,38.2,0.0,N\n\
                       Melbourne,20140113120000,41.6,0.0,N\n\
                       Copyright Commonwealth of Australia,,,,\n";

fn weather_transformer() -> Transformer {
    Transformer::from_value(&json!({
        "read_from_row_that_starts_with": "name,local_date_time_full",
        "number_of_rows_to_skip_at_file_end": 1,
        "read_these_columns_in_these_formats": {
            "local_date_time_full": "%Y%m%d%H%M%S",
            "number": ["air_temp", "rain_trace"]
        },
        "list_of_actions": [
            "remove_duplicates",
            { "rename": ["town = name", "temp = air_temp"] },
            { "formula": ["temp_f = temp * 9 / 5 + 32"] },
            { "filter_rows": ["temp > 39"] },
            { "change_date_or_time_format": [{
                "date_or_time_column": "local_date_time_full",
                "result_column": "when",
                "date_format": "%d/%m/%Y %H:%M"
            }] },
            { "filter_columns": ["town", "when", "temp", "rain_trace", "temp_f"] }
        ]
    }))
    .expect("Failed to build transformer")
}

// =============================================================================
// End-to-End Tests
// =============================================================================

#[test]
fn test_weather_export_end_to_end() {
    let file = create_test_file(WEATHER);
    let result = weather_transformer()
        .transform_file(file.path())
        .expect("Transform failed");

    assert_eq!(result.source.format, "csv");
    assert_eq!(result.source.raw_row_count, 8);
    assert!(result.source.hash.starts_with("sha256:"));

    let table = result.table;
    assert_eq!(
        table.column_names(),
        vec!["town", "when", "temp", "rain_trace", "temp_f"]
    );
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.value(0, "when"), Some(&Value::text("13/01/2014 12:00")));
    assert_eq!(table.value(1, "when"), Some(&Value::text("13/01/2014 11:30")));
    assert_eq!(table.value(1, "rain_trace"), Some(&Value::Missing));
    assert_eq!(table.column("temp_f").unwrap().column_type, ColumnType::Real);

    let fahrenheit = table.value(0, "temp_f").and_then(Value::as_f64).unwrap();
    assert!((fahrenheit - 106.88).abs() < 1e-9);
}

#[test]
fn test_weather_export_written_as_csv() {
    let file = create_test_file(WEATHER);
    let mut table = weather_transformer()
        .transform_file(file.path())
        .unwrap()
        .table;
    table = tabula::Pipeline::from_actions(&json!([{ "remove_columns": ["temp_f"] }]))
        .unwrap()
        .execute(table)
        .unwrap();

    let mut out = Vec::new();
    output::write_delimited(&table, &mut out, b',').unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "town,when,temp,rain_trace\n\
         Melbourne,13/01/2014 12:00,41.6,0\n\
         Melbourne,13/01/2014 11:30,40.9,\n"
    );
}

#[test]
fn test_tsv_auto_detect_and_json_sink() {
    let content = "station\treading\n\
                   Olympic Park\t12\n\
                   Avalon\t7\n\
                   Olympic Park\t3\n";
    let file = create_test_file(content);

    let transformer = Transformer::from_value(&json!({
        "infer_column_types": true,
        "list_of_actions": [{ "sum_up_by": ["station"] }]
    }))
    .unwrap();
    let result = transformer.transform_file(file.path()).unwrap();
    assert_eq!(result.source.format, "tsv");

    let json = output::to_json(&result.table);
    assert_eq!(
        json,
        json!([
            { "station": "Olympic Park", "reading": 15 },
            { "station": "Avalon", "reading": 7 }
        ])
    );
}

#[test]
fn test_sum_up_by_on_untyped_csv() {
    let content = "date,client,a,b\n\
                   2014-01-01,foo,1,2\n\
                   2014-01-01,foo,2,2\n\
                   2014-01-01,bar,5,1\n\
                   2014-01-02,foo,4,\n";
    let file = create_test_file(content);

    let transformer = Transformer::from_value(&json!({
        "list_of_actions": [{ "sum_up_by": ["date", "client"] }]
    }))
    .unwrap();
    let table = transformer.transform_file(file.path()).unwrap().table;

    assert_eq!(table.column_names(), vec!["date", "client", "a", "b"]);
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.value(0, "a"), Some(&Value::Integer(3)));
    assert_eq!(table.value(0, "b"), Some(&Value::Integer(4)));
    assert_eq!(table.value(2, "b"), Some(&Value::Missing));
}

#[test]
fn test_sum_up_by_refuses_text_it_would_drop() {
    let file = create_test_file("client,note,a\nfoo,late,1\nfoo,ok,2\n");
    let transformer = Transformer::from_value(&json!({
        "list_of_actions": [{ "sum_up_by": ["client"] }]
    }))
    .unwrap();

    let err = transformer.transform_file(file.path()).unwrap_err();
    assert_eq!(err.step_index(), Some(0));
    assert!(matches!(err.root(), TabulaError::TypeMismatch { row: Some(0), .. }));
}

#[test]
fn test_explicit_separator() {
    let content = "a;b\n1;2\n3;4\n";
    let file = create_test_file(content);

    let transformer = Transformer::from_value(&json!({
        "column_separator": ";",
        "read_these_columns_in_these_formats": { "integer": ["a", "b"] },
        "list_of_actions": [{ "formula": ["c = a * b"] }]
    }))
    .unwrap();
    let table = transformer.transform_file(file.path()).unwrap().table;

    assert_eq!(table.value(1, "c"), Some(&Value::Integer(12)));
}

#[test]
fn test_only_load_these_columns() {
    let content = "id,name,secret\n1,Ada,x\n2,Grace,y\n";
    let file = create_test_file(content);

    let transformer = Transformer::from_value(&json!({
        "only_load_these_columns": ["name", "id"]
    }))
    .unwrap();
    let table = transformer.transform_file(file.path()).unwrap().table;

    // Projection keeps file order
    assert_eq!(table.column_names(), vec!["id", "name"]);
}

#[test]
fn test_text_operations_on_urls() {
    let content = "page,url\n\
                   home,https://example.org/?utm_source=news&id=7\n\
                   about,https://example.org/about\n";
    let file = create_test_file(content);

    let transformer = Transformer::from_value(&json!({
        "list_of_actions": [
            { "extract_query_string": [{
                "url_column": "url",
                "column_to_store_extract": "source",
                "query_string": "utm_source"
            }] },
            { "extract_text": [{
                "text_column": "url",
                "column_to_store_extract": "scheme",
                "start": 0,
                "length": 5
            }] },
            { "add_text_at_start": [{ "target_column": "page", "text": "/" }] },
            { "replace_text": [{
                "target_column": "url",
                "text_to_find": "https://",
                "replacement_text": ""
            }] }
        ]
    }))
    .unwrap();
    let table = transformer.transform_file(file.path()).unwrap().table;

    assert_eq!(table.value(0, "source"), Some(&Value::text("news")));
    assert_eq!(table.value(1, "source"), Some(&Value::Missing));
    assert_eq!(table.value(0, "scheme"), Some(&Value::text("https")));
    assert_eq!(table.value(1, "page"), Some(&Value::text("/about")));
    assert_eq!(table.value(1, "url"), Some(&Value::text("example.org/about")));
}

#[test]
fn test_column_name_cleanup() {
    let content = "Station Name,Air Temp (C)\nOlympic Park,21\n";
    let file = create_test_file(content);

    let transformer = Transformer::from_value(&json!({
        "list_of_actions": [
            "make_column_names_alphanumeric",
            "make_column_names_lowercase"
        ]
    }))
    .unwrap();
    let table = transformer.transform_file(file.path()).unwrap().table;

    assert_eq!(table.column_names(), vec!["station_name", "air_temp_c"]);
}

// =============================================================================
// Error Reporting Tests
// =============================================================================

#[test]
fn test_bad_date_names_column_and_row() {
    let content = "when\n13/01/2014\n14/01/2014\nyesterday\n";
    let file = create_test_file(content);

    let transformer = Transformer::from_value(&json!({
        "read_these_columns_in_these_formats": { "when": "%d/%m/%Y" }
    }))
    .unwrap();
    let err = transformer.transform_file(file.path()).unwrap_err();

    match err {
        TabulaError::Schema { column, row, .. } => {
            assert_eq!(column.as_deref(), Some("when"));
            assert_eq!(row, Some(2));
        }
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn test_too_many_skipped_rows() {
    let file = create_test_file("a,b\n1,2\n");
    let transformer = Transformer::from_value(&json!({
        "number_of_rows_to_skip_at_file_end": 5
    }))
    .unwrap();

    let err = transformer.transform_file(file.path()).unwrap_err();
    assert!(matches!(err, TabulaError::Schema { .. }));
}

#[test]
fn test_hint_for_absent_column() {
    let file = create_test_file("a,b\n1,2\n");
    let transformer = Transformer::from_value(&json!({
        "read_these_columns_in_these_formats": { "c": "integer" }
    }))
    .unwrap();

    let err = transformer.transform_file(file.path()).unwrap_err();
    assert!(matches!(err, TabulaError::Schema { column: Some(ref c), .. } if c == "c"));
}

#[test]
fn test_plan_file_checks_without_transforming() {
    let file = create_test_file(WEATHER);
    let columns = weather_transformer().plan_file(file.path()).unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["town", "when", "temp", "rain_trace", "temp_f"]);

    let broken = Transformer::from_value(&json!({
        "list_of_actions": [{ "filter_columns": ["nope"] }]
    }))
    .unwrap();
    let err = broken.plan_file(file.path()).unwrap_err();
    assert_eq!(err.step_index(), Some(0));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = weather_transformer()
        .transform_file("/nonexistent/weather.csv")
        .unwrap_err();
    assert!(matches!(err, TabulaError::Io { .. }));
}
