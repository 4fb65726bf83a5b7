pub mod config;
pub mod env_guard;
pub mod error;

use crate::error::ConfigError;
use std::fs;
use std::path::Path;

/// Load a line-oriented data file (keys, proxies, destination addresses).
/// Blank lines and `#` comments are skipped.
pub fn load_lines(path: &str) -> Result<Vec<String>, ConfigError> {
    let content = fs::read_to_string(Path::new(path))
        .map_err(|e| ConfigError::Missing(format!("cannot read `{path}`: {e}")))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
