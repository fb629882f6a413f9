//! Example: Transform a tabular data file with a JSON configuration.
//!
//! Usage:
//!   cargo run --example transform -- <file_path> <config_path>
//!
//! Prints the plan, the resolved columns and the first rows of the result.

use std::env;
use std::path::Path;

use tabula::Transformer;

fn main() -> tabula::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: cargo run --example transform -- <file_path> <config_path>");
        std::process::exit(1);
    }

    let (file_path, config_path) = (Path::new(&args[1]), Path::new(&args[2]));
    let config = std::fs::read_to_string(config_path).map_err(|e| tabula::TabulaError::Io {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    let transformer = Transformer::from_json_str(&config)?;

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("Tabula: {}", file_path.display());
    println!("{}", separator);
    println!();

    println!("## Plan ({} operations)", transformer.pipeline().len());
    for (i, line) in transformer.pipeline().describe().iter().enumerate() {
        println!("  {:>3}. {}", i + 1, line);
    }
    println!();

    let result = transformer.transform_file(file_path)?;

    println!("## Source");
    println!("  File: {}", result.source.file);
    println!("  Format: {}", result.source.format);
    println!("  Raw rows: {}", result.source.raw_row_count);
    println!();

    println!("## Columns ({})", result.table.column_count());
    for col in result.table.columns() {
        println!("  {:24} {}", col.name, col.column_type);
    }
    println!();

    println!("## First rows of {}", result.table.row_count());
    let mut out = Vec::new();
    let preview = tabula::Table::new(
        result.table.columns().to_vec(),
        result.table.rows().iter().take(10).cloned().collect(),
    )?;
    tabula::output::write_delimited(&preview, &mut out, b'\t')?;
    print!("{}", String::from_utf8_lossy(&out));

    Ok(())
}
