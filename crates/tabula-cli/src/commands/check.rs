//! Check command - compile a configuration and report problems.

use std::path::PathBuf;

use colored::Colorize;

pub fn run(
    config: PathBuf,
    against: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let transformer = super::load_transformer(&config)?;

    println!(
        "{} {} ({} operations)",
        "Valid".green().bold(),
        config.display().to_string().white(),
        transformer.pipeline().len()
    );

    let Some(file) = against else {
        return Ok(());
    };
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let columns = transformer.plan_file(&file)?;
    println!(
        "{} column references against {}",
        "Checked".green().bold(),
        file.display().to_string().white()
    );

    if verbose {
        println!();
        println!("{}", "Output columns:".yellow().bold());
        for col in &columns {
            println!("  {:24} {}", col.name, col.column_type);
        }
    }

    Ok(())
}
