//! Input file loading.

use std::path::Path;

use anyhow::{bail, Context, Result};
use biomod_build::{BodySnapshot, Configuration};

/// Load a configuration file, TOML or JSON by extension.
///
/// No path means default options.
pub fn load_config(path: Option<&Path>) -> Result<Configuration> {
    let Some(path) = path else {
        return Ok(Configuration::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&content, path)
}

fn parse_config(content: &str, path: &Path) -> Result<Configuration> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let config: Configuration = match extension.as_deref() {
        Some("toml") => toml::from_str(content)
            .with_context(|| format!("invalid TOML in {}", path.display()))?,
        Some("json") => serde_json::from_str(content)
            .with_context(|| format!("invalid JSON in {}", path.display()))?,
        _ => bail!(
            "unsupported config format for {} (expected .toml or .json)",
            path.display()
        ),
    };
    Ok(config)
}

/// Load a body snapshot from JSON.
pub fn load_body(path: &Path) -> Result<BodySnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read body snapshot {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid body snapshot {}", path.display()))
}
