//! CLI command implementations.

pub mod check;
pub mod parse;

use std::fs;
use std::path::Path;

use csvnest::{Engine, EngineConfig};
use tracing::debug;

/// Read the CSV text and build an engine from the optional config file.
pub fn load(file: &Path, config: Option<&Path>) -> Result<(Engine, String), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(file)
        .map_err(|e| format!("Cannot read {}: {}", file.display(), e))?;

    let config = match config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            EngineConfig::from_json(&json)?
        }
        None => EngineConfig::default(),
    };
    debug!(rules = config.rules.len(), file = %file.display(), "Loaded configuration");

    Ok((Engine::with_config(config), text))
}
