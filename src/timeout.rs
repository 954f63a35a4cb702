// src/timeout.rs

//! Time budget for blocking file actions.
//!
//! A file that is still being written by another process can keep a move or
//! replace blocked for a long time. Callers inject a [`FileActionTimeout`] to
//! bound how long they wait for such an action.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::errors::{DirwatchError, Result};

/// Budget used when nothing else is configured.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileActionTimeout {
    budget: Option<Duration>,
}

impl FileActionTimeout {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget: Some(budget),
        }
    }

    pub fn default_budget() -> Self {
        Self::new(DEFAULT_ACTION_TIMEOUT)
    }

    /// No budget: actions run until they finish.
    pub fn none() -> Self {
        Self { budget: None }
    }

    /// Build from milliseconds, where `0` disables the budget.
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            Self::none()
        } else {
            Self::new(Duration::from_millis(ms))
        }
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    /// Run the blocking `action` for `path` on the blocking pool.
    ///
    /// When the budget runs out the caller gets [`DirwatchError::Timeout`]; the
    /// action itself is detached and keeps running in the background.
    pub async fn run<T, F>(&self, path: &Path, action: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(action);

        let Some(budget) = self.budget else {
            return task.await?;
        };

        match tokio::time::timeout(budget, task).await {
            Ok(joined) => joined?,
            Err(_) => {
                warn!(?path, ?budget, "file action timed out");
                Err(DirwatchError::Timeout {
                    path: PathBuf::from(path),
                    budget,
                })
            }
        }
    }
}
