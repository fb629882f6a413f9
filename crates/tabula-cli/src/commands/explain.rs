//! Explain command - list what a configuration will do.

use std::path::PathBuf;

use colored::Colorize;
use serde_json::json;

pub fn run(config: PathBuf, json: bool, _verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let transformer = super::load_transformer(&config)?;
    let pipeline = transformer.pipeline();
    let skip = transformer.config().skip_rows();

    if json {
        let steps: Vec<_> = pipeline
            .operations()
            .iter()
            .enumerate()
            .map(|(i, op)| {
                json!({
                    "position": i,
                    "operation": op.name(),
                    "description": op.description(),
                })
            })
            .collect();
        let hints: serde_json::Map<String, serde_json::Value> = transformer
            .config()
            .hints()?
            .into_iter()
            .map(|(column, hint)| (column, json!(hint.to_string())))
            .collect();
        let report = json!({
            "skip_rows_at_start": skip.header,
            "skip_rows_at_end": skip.footer,
            "hints": hints,
            "operations": steps,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Reading:".yellow().bold());
    match &transformer.config().read_from_row_that_starts_with {
        Some(prefix) => println!("  header is the first row starting with '{}'", prefix),
        None => println!("  skip {} rows before the header", skip.header),
    }
    if skip.footer > 0 {
        println!("  drop {} rows at the end", skip.footer);
    }
    for (column, hint) in transformer.config().hints()? {
        println!("  {:24} {}", column, hint.to_string().cyan());
    }

    println!();
    println!("{}", "Operations:".yellow().bold());
    if pipeline.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for (i, line) in pipeline.describe().iter().enumerate() {
        println!("  {:>3}. {}", i + 1, line);
    }

    Ok(())
}
