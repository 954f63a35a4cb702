// src/watch/trigger.rs

use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

/// A file attribute whose change should produce a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCategory {
    Attributes,
    CreationTime,
    DirectoryName,
    FileName,
    LastAccess,
    LastWrite,
    Security,
    Size,
}

impl TriggerCategory {
    pub const ALL: [TriggerCategory; 8] = [
        TriggerCategory::Attributes,
        TriggerCategory::CreationTime,
        TriggerCategory::DirectoryName,
        TriggerCategory::FileName,
        TriggerCategory::LastAccess,
        TriggerCategory::LastWrite,
        TriggerCategory::Security,
        TriggerCategory::Size,
    ];

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Set of [`TriggerCategory`] values. Defaults to every category.
#[derive(Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<TriggerCategory>")]
pub struct TriggerMask(u16);

impl TriggerMask {
    pub fn all() -> Self {
        TriggerCategory::ALL.into_iter().collect()
    }

    pub fn empty() -> Self {
        TriggerMask(0)
    }

    pub fn with(self, category: TriggerCategory) -> Self {
        TriggerMask(self.0 | category.bit())
    }

    pub fn contains(&self, category: TriggerCategory) -> bool {
        self.0 & category.bit() != 0
    }

    pub fn contains_any(&self, categories: &[TriggerCategory]) -> bool {
        categories.iter().any(|c| self.contains(*c))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = TriggerCategory> + '_ {
        TriggerCategory::ALL
            .into_iter()
            .filter(|c| self.contains(*c))
    }
}

impl Default for TriggerMask {
    fn default() -> Self {
        TriggerMask::all()
    }
}

impl FromIterator<TriggerCategory> for TriggerMask {
    fn from_iter<I: IntoIterator<Item = TriggerCategory>>(iter: I) -> Self {
        iter.into_iter().fold(TriggerMask::empty(), TriggerMask::with)
    }
}

impl From<Vec<TriggerCategory>> for TriggerMask {
    fn from(categories: Vec<TriggerCategory>) -> Self {
        categories.into_iter().collect()
    }
}

impl fmt::Debug for TriggerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
