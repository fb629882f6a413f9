//! Run command - transform a data file and write the result.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use colored::Colorize;
use tabula::output;

use crate::cli::OutputFormat;

pub fn run(
    file: PathBuf,
    config: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let transformer = super::load_transformer(&config)?;

    eprintln!(
        "{} {} with {} operations",
        "Transforming".cyan().bold(),
        file.display().to_string().white(),
        transformer.pipeline().len().to_string().white().bold()
    );

    let result = transformer.transform_file(&file)?;

    if verbose {
        eprintln!();
        eprintln!("{}", "Columns:".yellow().bold());
        for col in result.table.columns() {
            eprintln!("  {:24} {}", col.name, col.column_type);
        }
        eprintln!();
    }

    // Stdout unless an output path was given
    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);
    match format {
        OutputFormat::Csv => output::write_delimited(&result.table, &mut writer, b',')?,
        OutputFormat::Tsv => output::write_delimited(&result.table, &mut writer, b'\t')?,
        OutputFormat::Json => {
            output::write_json(&result.table, &mut writer)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;

    eprintln!(
        "Wrote {} rows, {} columns",
        result.table.row_count().to_string().white().bold(),
        result.table.column_count().to_string().white().bold()
    );
    if let Some(path) = output {
        eprintln!(
            "{} {}",
            "Saved to".green().bold(),
            path.display().to_string().white()
        );
    }

    Ok(())
}
