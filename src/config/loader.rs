// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Configuration loading and merging.

use crate::error::{ConfigError, RepinError, Result};
use std::path::{Path, PathBuf};

use super::schema::RepinConfig;

/// Configuration file names to search for, in order of priority.
const CONFIG_FILES: &[&str] = &["uvrepin.toml", ".uvrepin.toml", ".config/uvrepin.toml"];

/// Find the configuration file starting from a specific directory.
pub fn find_config_file_from(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        for config_name in CONFIG_FILES {
            let config_path = current.join(config_name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    // XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
        let user_config = config_dir.join("uvrepin").join("config.toml");
        if user_config.exists() {
            return Some(user_config);
        }
    }

    None
}

/// Load configuration by searching upward from the project directory.
pub fn load_config(project_dir: &Path) -> Result<RepinConfig> {
    match find_config_file_from(project_dir) {
        Some(path) => load_config_from(&path),
        None => {
            tracing::debug!("No configuration file found, using defaults");
            Ok(RepinConfig::default())
        }
    }
}

/// Load configuration from a specific path.
pub fn load_config_from(path: &Path) -> Result<RepinConfig> {
    tracing::debug!("Loading configuration from: {:?}", path);

    if !path.exists() {
        return Err(RepinError::Config(ConfigError::NotFound {
            path: path.to_path_buf(),
        }));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        RepinError::Config(ConfigError::ParseError {
            message: format!("Failed to read config file: {}", e),
        })
    })?;

    parse_config(&content)
}

/// Parse configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<RepinConfig> {
    let config: RepinConfig = toml::from_str(content).map_err(|e| {
        RepinError::Config(ConfigError::ParseError {
            message: format!("Failed to parse TOML: {}", e),
        })
    })?;
    validate(&config)?;
    Ok(config)
}

/// The `[tool.uvrepin]` table of a parsed pyproject document, if present.
pub fn tool_table(document: &toml::Value) -> Option<&toml::Value> {
    document.get("tool").and_then(|t| t.get("uvrepin"))
}

fn validate(config: &RepinConfig) -> Result<()> {
    if config.concurrency == 0 {
        return Err(RepinError::Config(ConfigError::InvalidValue {
            key: "concurrency".to_string(),
            message: "must be at least 1".to_string(),
        }));
    }
    if config.timeout_secs == 0 {
        return Err(RepinError::Config(ConfigError::InvalidValue {
            key: "timeout_secs".to_string(),
            message: "must be at least 1".to_string(),
        }));
    }
    Ok(())
}

/// Merge a TOML overlay onto a configuration.
///
/// Only keys present in the overlay replace the base value, so an overlay
/// can reset a setting back to its default.
pub fn merge_configs(base: &RepinConfig, overlay: &toml::Value) -> Result<RepinConfig> {
    let invalid = |message: String| {
        RepinError::Config(ConfigError::ParseError {
            message: format!("Invalid [tool.uvrepin] table: {}", message),
        })
    };

    let Some(overlay) = overlay.as_table() else {
        return Err(invalid("expected a table".to_string()));
    };

    let mut merged = match toml::Value::try_from(base) {
        Ok(toml::Value::Table(table)) => table,
        Ok(_) => return Err(invalid("configuration is not a table".to_string())),
        Err(e) => return Err(invalid(e.to_string())),
    };
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }

    let config: RepinConfig = toml::Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| invalid(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}
