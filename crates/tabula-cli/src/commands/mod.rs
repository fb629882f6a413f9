//! CLI command implementations.

pub mod check;
pub mod explain;
pub mod run;

use std::path::Path;

use tabula::Transformer;
use tracing::debug;

/// Read and compile a configuration file.
pub(crate) fn load_transformer(config: &Path) -> Result<Transformer, Box<dyn std::error::Error>> {
    if !config.exists() {
        return Err(format!("Configuration not found: {}", config.display()).into());
    }
    debug!(config = %config.display(), "loading configuration");
    let text = std::fs::read_to_string(config)?;
    Ok(Transformer::from_json_str(&text)?)
}
