// src/watch/filter.rs

//! File-name filter for a watch target.
//!
//! A filter string holds one or more globs separated by `,`, `;` or `|`, e.g.
//! `"*.csv; *.txt"`. Globs are matched against the file name only, never the
//! full path.

use std::fmt;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::{DirwatchError, Result};

const SEPARATORS: [char; 3] = [',', ';', '|'];

#[derive(Clone)]
pub struct NameFilter {
    patterns: Vec<String>,
    set: GlobSet,
}

impl NameFilter {
    pub fn parse(spec: &str) -> Result<Self> {
        let patterns: Vec<String> = spec
            .split(SEPARATORS)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                DirwatchError::ConfigError(format!("invalid filter glob '{pattern}': {e}"))
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| {
            DirwatchError::ConfigError(format!("failed to build filter '{spec}': {e}"))
        })?;

        Ok(Self { patterns, set })
    }

    /// Filter that accepts every name.
    pub fn match_all() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches_all(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, path: &Path) -> bool {
        if self.matches_all() {
            return true;
        }
        match path.file_name() {
            Some(name) => self.set.is_match(Path::new(name)),
            None => false,
        }
    }
}

impl fmt::Debug for NameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameFilter")
            .field("patterns", &self.patterns)
            .finish()
    }
}
