//! Tabula CLI - declarative ETL for tabular datasets.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            file,
            config,
            output,
            format,
        } => commands::run::run(file, config, output, format, cli.verbose),

        Commands::Check { config, against } => commands::check::run(config, against, cli.verbose),

        Commands::Explain { config, json } => commands::explain::run(config, json, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so table output on stdout stays clean.
///
/// `RUST_LOG` wins; otherwise `--verbose` shows debug events and the default
/// shows warnings only.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
