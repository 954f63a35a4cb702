// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DirwatchError, Result};
use crate::watch::NameFilter;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DirwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.target))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_targets(cfg)?;
    validate_target_paths(cfg)?;
    validate_filters(cfg)?;
    Ok(())
}

fn ensure_has_targets(cfg: &RawConfigFile) -> Result<()> {
    if cfg.target.is_empty() {
        return Err(DirwatchError::ConfigError(
            "config must contain at least one [[target]] table".to_string(),
        ));
    }
    Ok(())
}

fn validate_target_paths(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for (idx, target) in cfg.target.iter().enumerate() {
        if target.path.as_os_str().is_empty() {
            return Err(DirwatchError::ConfigError(format!(
                "target #{} has an empty `path`",
                idx + 1
            )));
        }
        if !seen.insert(&target.path) {
            return Err(DirwatchError::ConfigError(format!(
                "directory {:?} is listed as a target more than once",
                target.path
            )));
        }
        if target.triggers.is_empty() {
            return Err(DirwatchError::ConfigError(format!(
                "target {:?} has an empty `triggers` list",
                target.path
            )));
        }
    }
    Ok(())
}

fn validate_filters(cfg: &RawConfigFile) -> Result<()> {
    for target in cfg.target.iter() {
        if let Some(spec) = target.filter.as_deref() {
            NameFilter::parse(spec)?;
        }
    }
    Ok(())
}
