// src/pipeline.rs

//! Built-in subscriber that relocates newly created files.
//!
//! This is what the `dirwatch` binary attaches to each target's relay. Library
//! users are free to subscribe their own handlers instead and call the naming
//! and relocation policies themselves.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Deserialize;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::relocate::{Outcome, RelocationMode, RelocationOutcome, Relocator};
use crate::timeout::FileActionTimeout;
use crate::watch::{ChangeEvent, EventRelay, HandlerId};

/// What to do with a file once it shows up in a watched directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Only log events.
    #[default]
    None,
    MoveToOut,
    MoveToError,
    ReplaceToOut,
    ReplaceToError,
}

impl Disposition {
    pub fn relocation(self) -> Option<(Outcome, RelocationMode)> {
        match self {
            Disposition::None => None,
            Disposition::MoveToOut => Some((Outcome::Out, RelocationMode::Move)),
            Disposition::MoveToError => Some((Outcome::Error, RelocationMode::Move)),
            Disposition::ReplaceToOut => Some((Outcome::Out, RelocationMode::Replace)),
            Disposition::ReplaceToError => Some((Outcome::Error, RelocationMode::Replace)),
        }
    }
}

/// Everything a created-file handler needs to relocate files.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub relocator: Relocator,
    pub disposition: Disposition,
    pub timeout: FileActionTimeout,
}

impl Pipeline {
    pub fn new(relocator: Relocator, disposition: Disposition, timeout: FileActionTimeout) -> Self {
        Self {
            relocator,
            disposition,
            timeout,
        }
    }

    /// Apply the disposition to `path` under the configured time budget.
    ///
    /// Returns `Ok(None)` for [`Disposition::None`].
    pub async fn apply(&self, path: PathBuf) -> Result<Option<RelocationOutcome>> {
        let Some((outcome, mode)) = self.disposition.relocation() else {
            return Ok(None);
        };

        let relocator = self.relocator.clone();
        let source = path.clone();
        self.timeout
            .run(&path, move || relocator.relocate(&source, outcome, mode))
            .await
            .map(Some)
    }

    /// Register this pipeline's handlers on `relay`.
    ///
    /// Created files are relocated on tasks spawned onto `runtime`, so the
    /// relay is never blocked by file I/O. Other events are only logged.
    pub fn attach(self, relay: &EventRelay, runtime: Handle) -> Vec<HandlerId> {
        let mut ids = Vec::with_capacity(5);

        ids.push(relay.on_created(move |event| {
            let Some(path) = event.path().map(PathBuf::from) else {
                return;
            };
            info!(?path, disposition = ?self.disposition, "file created");

            let pipeline = self.clone();
            runtime.spawn(async move {
                match pipeline.apply(path.clone()).await {
                    Ok(Some(RelocationOutcome::Moved { to })) => {
                        info!(from = ?path, ?to, "file relocated")
                    }
                    Ok(Some(RelocationOutcome::Replaced { to, backup })) => {
                        info!(from = ?path, ?to, ?backup, "file replaced")
                    }
                    Ok(Some(RelocationOutcome::DestinationOccupied { destination, .. })) => {
                        warn!(?path, ?destination, "file left in place; destination occupied")
                    }
                    Ok(Some(RelocationOutcome::SourceMissing { .. })) => {
                        debug!(?path, "file vanished before it could be relocated")
                    }
                    Ok(None) => {}
                    Err(err) => error!(?path, "failed to relocate file: {err}"),
                }
            });
        }));

        ids.push(relay.on_changed(|event| debug!(path = ?event.path(), "file changed")));
        ids.push(relay.on_deleted(|event| debug!(path = ?event.path(), "file deleted")));
        ids.push(relay.on_renamed(|event| {
            if let ChangeEvent::Renamed { from, to } = event {
                debug!(?from, ?to, "file renamed");
            }
        }));
        ids.push(relay.on_error(|event| {
            if let ChangeEvent::Error { path, message } = event {
                warn!(?path, %message, "watch error");
            }
        }));

        ids
    }
}
