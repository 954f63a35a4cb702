// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirwatchError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("IO error while {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("File action on {} exceeded its {budget:?} budget", .path.display())]
    Timeout { path: PathBuf, budget: Duration },

    #[error("Background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DirwatchError {
    /// Wrap an `io::Error` with the operation and path it happened on.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DirwatchError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

impl From<tokio::task::JoinError> for DirwatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        DirwatchError::Task(err.to_string())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DirwatchError>;
