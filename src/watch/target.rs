// src/watch/target.rs

use std::path::{Path, PathBuf};

use crate::watch::filter::NameFilter;
use crate::watch::trigger::TriggerMask;

/// A directory plus the notification settings it is watched with.
///
/// A running session keeps its own copy, so later changes to a target never
/// affect a watch that has already started.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    path: PathBuf,
    triggers: TriggerMask,
    filter: NameFilter,
    recursive: bool,
}

impl WatchTarget {
    /// Watch `path` for every trigger category, all names, non-recursively.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            triggers: TriggerMask::all(),
            filter: NameFilter::match_all(),
            recursive: false,
        }
    }

    pub fn with_triggers(mut self, triggers: TriggerMask) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn with_filter(mut self, filter: NameFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn triggers(&self) -> TriggerMask {
        self.triggers
    }

    pub fn filter(&self) -> &NameFilter {
        &self.filter
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }
}
