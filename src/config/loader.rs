//! Configuration loading from the file system

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use super::defaults::DEFAULT_CONFIG_PATH;
use super::types::ShellConfig;
use crate::error::{Result, ResultExt, ShellError};

/// Path of the user config file with `~` expanded
pub fn default_config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref())
}

/// Read and parse a config file.
pub fn read_config(path: &Path) -> Result<ShellConfig> {
    let raw = fs::read_to_string(path)
        .map_err(|e| ShellError::Config(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|source| ShellError::ConfigParse {
        path: path.display().to_string(),
        source,
    })
}

/// Load configuration from `path` (or ~/.usecase-shell/config.json).
///
/// Returns `ShellConfig::default()` if the file is missing or invalid.
#[instrument(name = "load_config")]
pub fn load_config(path: Option<&Path>) -> ShellConfig {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        return ShellConfig::default();
    }

    match read_config(&config_path).warn_on_err("load config") {
        Some(config) => {
            info!(path = %config_path.display(), "Successfully loaded config");
            config
        }
        None => ShellConfig::default(),
    }
}
