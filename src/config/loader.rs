// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DirwatchError, Result};

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).map_err(|e| DirwatchError::io("reading config", path, e))?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file and validate it.
///
/// Directory existence is not checked here; targets are validated when the
/// watch starts.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `Dirwatch.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dirwatch.toml")
}
