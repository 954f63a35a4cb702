#![allow(dead_code)]

use dirwatch::config::{ConfigFile, ConfigSection, RawConfigFile, TargetConfig};
use dirwatch::pipeline::Disposition;
use dirwatch::watch::{TriggerCategory, TriggerMask};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                target: Vec::new(),
            },
        }
    }

    pub fn with_target(mut self, target: TargetConfig) -> Self {
        self.config.target.push(target);
        self
    }

    pub fn action_timeout_ms(mut self, ms: u64) -> Self {
        self.config.config.action_timeout_ms = ms;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TargetConfig`.
pub struct TargetConfigBuilder {
    target: TargetConfig,
}

impl TargetConfigBuilder {
    pub fn new(path: &str) -> Self {
        Self {
            target: TargetConfig::new(path),
        }
    }

    /// Replace the default (all categories) with exactly `categories`.
    pub fn triggers(mut self, categories: &[TriggerCategory]) -> Self {
        self.target.triggers = categories.iter().copied().collect::<TriggerMask>();
        self
    }

    pub fn filter(mut self, spec: &str) -> Self {
        self.target.filter = Some(spec.to_string());
        self
    }

    pub fn recursive(mut self, val: bool) -> Self {
        self.target.recursive = val;
        self
    }

    pub fn on_created(mut self, disposition: Disposition) -> Self {
        self.target.on_created = disposition;
        self
    }

    pub fn build(self) -> TargetConfig {
        self.target
    }
}
