use std::path::Path;

use crate::error::{FlipzError, Result};

pub fn load_config(path: &Path) -> Result<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        FlipzError::ConfigError(format!("Failed to read config {}: {e}", path.display()))
    })?;
    let value: toml::Value = content.parse().map_err(|e| {
        FlipzError::ConfigError(format!("Failed to parse config {}: {e}", path.display()))
    })?;
    Ok(value)
}

/// A missing config file is fine (everything has defaults); a file that
/// exists but does not parse is still an error.
pub fn load_config_or_default(path: &Path) -> Result<toml::Value> {
    if !path.exists() {
        tracing::warn!("Config {} not found, using defaults", path.display());
        return Ok(toml::Value::Table(toml::map::Map::new()));
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_empty_table() {
        let value = load_config_or_default(Path::new("/nonexistent/flipz.toml")).unwrap();
        assert!(value.as_table().map(|t| t.is_empty()).unwrap_or(false));
    }

    #[test]
    fn missing_file_is_an_error_for_strict_load() {
        assert!(load_config(Path::new("/nonexistent/flipz.toml")).is_err());
    }
}
