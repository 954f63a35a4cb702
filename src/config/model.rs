// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::Result;
use crate::pipeline::Disposition;
use crate::timeout::{DEFAULT_ACTION_TIMEOUT, FileActionTimeout};
use crate::watch::{NameFilter, TriggerMask, WatchTarget};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// action_timeout_ms = 30000
///
/// [[target]]
/// path = "inbox"
/// triggers = ["file_name", "last_write", "size"]
/// filter = "*.csv;*.txt"
/// recursive = false
/// on_created = "move_to_out"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All `[[target]]` tables, in file order.
    #[serde(default)]
    pub target: Vec<TargetConfig>,
}

/// Validated configuration. Build it via `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub target: Vec<TargetConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, target: Vec<TargetConfig>) -> Self {
        Self { config, target }
    }

    pub fn action_timeout(&self) -> FileActionTimeout {
        FileActionTimeout::from_millis(self.config.action_timeout_ms)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Budget for a single relocation, in milliseconds. `0` means no limit.
    #[serde(default = "default_action_timeout_ms")]
    pub action_timeout_ms: u64,
}

fn default_action_timeout_ms() -> u64 {
    DEFAULT_ACTION_TIMEOUT.as_millis() as u64
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            action_timeout_ms: default_action_timeout_ms(),
        }
    }
}

/// One `[[target]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Directory to watch. Relative paths are resolved against the directory
    /// holding the config file.
    pub path: PathBuf,

    /// Trigger categories; all of them when omitted.
    #[serde(default)]
    pub triggers: TriggerMask,

    /// Name globs separated by `,`, `;` or `|`.
    #[serde(default)]
    pub filter: Option<String>,

    #[serde(default)]
    pub recursive: bool,

    /// What to do with files created in this directory.
    #[serde(default)]
    pub on_created: Disposition,
}

impl TargetConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            triggers: TriggerMask::all(),
            filter: None,
            recursive: false,
            on_created: Disposition::None,
        }
    }

    /// The directory this target watches, resolved against `base_dir`.
    pub fn resolved_path(&self, base_dir: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            base_dir.join(&self.path)
        }
    }

    /// Build the `WatchTarget` for this table.
    pub fn to_watch_target(&self, base_dir: &Path) -> Result<WatchTarget> {
        let filter = match self.filter.as_deref() {
            Some(spec) => NameFilter::parse(spec)?,
            None => NameFilter::match_all(),
        };

        Ok(WatchTarget::new(self.resolved_path(base_dir))
            .with_triggers(self.triggers)
            .with_filter(filter)
            .recursive(self.recursive))
    }
}
