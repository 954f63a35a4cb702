// src/relocate.rs

//! Relocation policy: move processed files into dated outcome trees.
//!
//! Layout, relative to the parent of the source file's directory:
//!
//! ```text
//! ../out/<YYYY>/<M>/<D>/<name>
//! ../error/<YYYY>/<M>/<D>/<name>
//! ../error/<YYYY>/<M>/<D>/backup/<name>
//! ```
//!
//! Move operations use the time-tagged name from [`crate::naming`] and never
//! overwrite. Replace operations keep the original file name and, when the
//! destination already exists, preserve its previous content under `backup/`
//! in the error tree (for both outcomes).

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Local};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::errors::Result;
use crate::fs::{FileSystem, MoveOutcome, RealFileSystem};
use crate::naming::destination_name;

/// Which outcome tree a file ends up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Out,
    Error,
}

impl Outcome {
    pub fn dir_name(self) -> &'static str {
        match self {
            Outcome::Out => "out",
            Outcome::Error => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationMode {
    /// No-clobber move under a freshly computed name.
    Move,
    /// Move under the original name, swapping out an existing destination.
    Replace,
}

/// Where a single relocation call is going to put things.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub source: PathBuf,
    pub file_name: String,
    pub directory: PathBuf,
    pub destination: PathBuf,
    /// Only set for [`RelocationMode::Replace`].
    pub backup: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationOutcome {
    Moved { to: PathBuf },
    Replaced { to: PathBuf, backup: PathBuf },
    /// Something already sits at the destination; the source was left alone.
    DestinationOccupied { source: PathBuf, destination: PathBuf },
    SourceMissing { source: PathBuf },
}

/// Moves or replaces files into the `out` / `error` trees.
#[derive(Debug, Clone)]
pub struct Relocator {
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
}

impl Relocator {
    pub fn new(fs: Arc<dyn FileSystem>, clock: Arc<dyn Clock>) -> Self {
        Self { fs, clock }
    }

    /// Relocator backed by `std::fs` and local wall-clock time.
    pub fn system() -> Self {
        Self::new(Arc::new(RealFileSystem), Arc::new(SystemClock))
    }

    pub fn move_to_out(&self, path: impl AsRef<Path>) -> Result<RelocationOutcome> {
        self.relocate(path.as_ref(), Outcome::Out, RelocationMode::Move)
    }

    pub fn move_to_error(&self, path: impl AsRef<Path>) -> Result<RelocationOutcome> {
        self.relocate(path.as_ref(), Outcome::Error, RelocationMode::Move)
    }

    pub fn replace_to_out(&self, path: impl AsRef<Path>) -> Result<RelocationOutcome> {
        self.relocate(path.as_ref(), Outcome::Out, RelocationMode::Replace)
    }

    pub fn replace_to_error(&self, path: impl AsRef<Path>) -> Result<RelocationOutcome> {
        self.relocate(path.as_ref(), Outcome::Error, RelocationMode::Replace)
    }

    pub async fn move_to_out_async(&self, path: impl Into<PathBuf>) -> Result<RelocationOutcome> {
        self.relocate_async(path.into(), Outcome::Out, RelocationMode::Move)
            .await
    }

    pub async fn move_to_error_async(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<RelocationOutcome> {
        self.relocate_async(path.into(), Outcome::Error, RelocationMode::Move)
            .await
    }

    pub async fn replace_to_out_async(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<RelocationOutcome> {
        self.relocate_async(path.into(), Outcome::Out, RelocationMode::Replace)
            .await
    }

    pub async fn replace_to_error_async(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<RelocationOutcome> {
        self.relocate_async(path.into(), Outcome::Error, RelocationMode::Replace)
            .await
    }

    /// Run [`Relocator::relocate`] on the blocking pool.
    pub async fn relocate_async(
        &self,
        path: PathBuf,
        outcome: Outcome,
        mode: RelocationMode,
    ) -> Result<RelocationOutcome> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.relocate(&path, outcome, mode)).await?
    }

    /// Compute where `path` would go, without touching the disk.
    ///
    /// Returns `Ok(None)` if `path` is not an existing file.
    pub fn plan(
        &self,
        path: &Path,
        outcome: Outcome,
        mode: RelocationMode,
    ) -> Result<Option<RenamePlan>> {
        if !self.fs.is_file(path) {
            return Ok(None);
        }
        let Some(original) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(None);
        };

        // One timestamp per call, so the name and the dated directory agree.
        let now = self.clock.now();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let root = outcome_root(&self.fs.resolve_dir(parent).join(original));
        let directory = dated_dir(&root, outcome, now);

        let (file_name, backup) = match mode {
            RelocationMode::Move => (destination_name(original, now), None),
            RelocationMode::Replace => {
                let backup = dated_dir(&root, Outcome::Error, now)
                    .join("backup")
                    .join(destination_name(original, now));
                (original.to_string(), Some(backup))
            }
        };

        Ok(Some(RenamePlan {
            source: path.to_path_buf(),
            destination: directory.join(&file_name),
            file_name,
            directory,
            backup,
        }))
    }

    /// Relocate `path` into the `outcome` tree.
    ///
    /// Any I/O failure is returned to the caller; nothing is retried.
    pub fn relocate(
        &self,
        path: &Path,
        outcome: Outcome,
        mode: RelocationMode,
    ) -> Result<RelocationOutcome> {
        let Some(plan) = self.plan(path, outcome, mode)? else {
            debug!(?path, "source missing; nothing to relocate");
            return Ok(RelocationOutcome::SourceMissing {
                source: path.to_path_buf(),
            });
        };

        self.fs.create_dir_all(&plan.directory)?;

        match plan.backup.clone() {
            None => self.move_into_place(plan),
            Some(backup) => {
                if let Some(backup_dir) = backup.parent() {
                    self.fs.create_dir_all(backup_dir)?;
                }
                self.replace_into_place(plan, backup)
            }
        }
    }

    fn move_into_place(&self, plan: RenamePlan) -> Result<RelocationOutcome> {
        match self.fs.move_no_clobber(&plan.source, &plan.destination)? {
            MoveOutcome::Moved => {
                info!(from = ?plan.source, to = ?plan.destination, "moved file");
                Ok(RelocationOutcome::Moved {
                    to: plan.destination,
                })
            }
            MoveOutcome::Occupied => {
                warn!(
                    source = ?plan.source,
                    destination = ?plan.destination,
                    "destination already exists; leaving source in place"
                );
                Ok(RelocationOutcome::DestinationOccupied {
                    source: plan.source,
                    destination: plan.destination,
                })
            }
            MoveOutcome::SourceGone => {
                debug!(source = ?plan.source, "source moved away concurrently");
                Ok(RelocationOutcome::SourceMissing {
                    source: plan.source,
                })
            }
        }
    }

    fn replace_into_place(&self, plan: RenamePlan, backup: PathBuf) -> Result<RelocationOutcome> {
        if !self.fs.exists(&plan.destination) {
            match self.fs.move_no_clobber(&plan.source, &plan.destination)? {
                MoveOutcome::Moved => {
                    info!(from = ?plan.source, to = ?plan.destination, "moved file");
                    return Ok(RelocationOutcome::Moved {
                        to: plan.destination,
                    });
                }
                MoveOutcome::SourceGone => {
                    return Ok(RelocationOutcome::SourceMissing {
                        source: plan.source,
                    });
                }
                // Someone created the destination in between; replace it.
                MoveOutcome::Occupied => {}
            }
        }

        self.fs.replace(&plan.source, &plan.destination, &backup)?;
        info!(
            from = ?plan.source,
            to = ?plan.destination,
            ?backup,
            "replaced file"
        );
        Ok(RelocationOutcome::Replaced {
            to: plan.destination,
            backup,
        })
    }
}

/// `<parent of source>/..`, resolved lexically when the parent ends in a
/// normal component.
///
/// [`Relocator`] passes the source with its directory already resolved
/// through [`FileSystem::resolve_dir`], so a symlinked inbox lands next to
/// the directory it points to.
pub fn outcome_root(source: &Path) -> PathBuf {
    let parent = match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let ends_normal = matches!(parent.components().next_back(), Some(Component::Normal(_)));
    match parent.parent() {
        Some(grand) if ends_normal && !grand.as_os_str().is_empty() => grand.to_path_buf(),
        _ => parent.join(".."),
    }
}

/// `<root>/<outcome>/<YYYY>/<M>/<D>`
pub fn dated_dir(root: &Path, outcome: Outcome, now: DateTime<Local>) -> PathBuf {
    root.join(outcome.dir_name())
        .join(now.year().to_string())
        .join(now.month().to_string())
        .join(now.day().to_string())
}
