// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{DirwatchError, Result};

pub mod mock;

/// What a no-clobber move ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Something already sits at the destination; the source is untouched.
    Occupied,
    /// The source disappeared, usually because a concurrent caller moved it
    /// first. Nothing is left at the destination.
    SourceGone,
}

/// Abstract filesystem interface used by the naming and relocation policies.
pub trait FileSystem: Send + Sync + Debug {
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Physical location of the directory `path`, following symlinks.
    /// Returns `path` unchanged when it cannot be resolved.
    fn resolve_dir(&self, path: &Path) -> PathBuf;

    /// Move `from` to `to` unless something already occupies `to`.
    ///
    /// The file ends up in exactly one place: at `to` for
    /// [`MoveOutcome::Moved`], at `from` for [`MoveOutcome::Occupied`], and
    /// wherever the winning caller put it for [`MoveOutcome::SourceGone`].
    fn move_no_clobber(&self, from: &Path, to: &Path) -> Result<MoveOutcome>;

    /// Put the current content of `destination` at `backup` (overwriting any
    /// previous backup) and move `source` over `destination`.
    fn replace(&self, source: &Path, destination: &Path, backup: &Path) -> Result<()>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| DirwatchError::io("creating directory", path, e))
    }

    fn resolve_dir(&self, path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }

    fn move_no_clobber(&self, from: &Path, to: &Path) -> Result<MoveOutcome> {
        match fs::hard_link(from, to) {
            Ok(()) => release_source(from, to),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(MoveOutcome::Occupied),
            Err(e) if e.kind() == ErrorKind::NotFound && !from.exists() => {
                Ok(MoveOutcome::SourceGone)
            }
            Err(e) if link_unavailable(&e) => {
                debug!(?from, ?to, "hard link unavailable ({e}); copying instead");
                copy_no_clobber(from, to)
            }
            Err(e) => Err(DirwatchError::io("moving", from, e)),
        }
    }

    fn replace(&self, source: &Path, destination: &Path, backup: &Path) -> Result<()> {
        if backup.exists() {
            fs::remove_file(backup).map_err(|e| DirwatchError::io("removing", backup, e))?;
        }

        // Keep `destination` in place while the backup is taken, so the rename
        // below swaps content atomically.
        match fs::hard_link(destination, backup) {
            Ok(()) => {}
            Err(e) if link_unavailable(&e) => {
                fs::copy(destination, backup)
                    .map_err(|e| DirwatchError::io("backing up", destination, e))?;
            }
            Err(e) => return Err(DirwatchError::io("backing up", destination, e)),
        }

        match fs::rename(source, destination) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                debug!(?source, ?destination, "rename crosses devices; copying instead");
                copy_over(source, destination)
            }
            Err(e) => Err(DirwatchError::io("replacing", destination, e)),
        }
    }
}

/// Errors meaning "this filesystem cannot hard-link here", as opposed to a
/// real failure. vfat and exfat report `EPERM` for that on Linux.
fn link_unavailable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::CrossesDevices | ErrorKind::Unsupported | ErrorKind::PermissionDenied
    )
}

/// Remove `from` now that `to` holds its content. If another caller already
/// took `from`, undo `to` so the file does not end up in two places.
fn release_source(from: &Path, to: &Path) -> Result<MoveOutcome> {
    match fs::remove_file(from) {
        Ok(()) => Ok(MoveOutcome::Moved),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(?from, ?to, "source taken by another caller; rolling back");
            fs::remove_file(to).map_err(|e| DirwatchError::io("rolling back", to, e))?;
            Ok(MoveOutcome::SourceGone)
        }
        Err(e) => Err(DirwatchError::io("removing", from, e)),
    }
}

/// No-clobber move through an exclusively created copy, for filesystems
/// without hard links.
pub fn copy_no_clobber(from: &Path, to: &Path) -> Result<MoveOutcome> {
    let mut source = match fs::File::open(from) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(MoveOutcome::SourceGone),
        Err(e) => return Err(DirwatchError::io("opening", from, e)),
    };
    let mut target = match fs::OpenOptions::new().write(true).create_new(true).open(to) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(MoveOutcome::Occupied),
        Err(e) => return Err(DirwatchError::io("creating", to, e)),
    };

    let copied = io::copy(&mut source, &mut target).and_then(|_| target.sync_all());
    if let Err(e) = copied {
        let _ = fs::remove_file(to);
        return Err(DirwatchError::io("copying", from, e));
    }
    drop(target);

    release_source(from, to)
}

/// Overwrite `destination` with `source` through a staging file in the
/// destination directory, then remove `source`. Used when a rename cannot
/// cross devices.
pub fn copy_over(source: &Path, destination: &Path) -> Result<()> {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = destination.with_file_name(format!(".{name}.dirwatch-partial"));

    fs::copy(source, &staging).map_err(|e| {
        let _ = fs::remove_file(&staging);
        DirwatchError::io("copying", source, e)
    })?;
    fs::rename(&staging, destination).map_err(|e| {
        let _ = fs::remove_file(&staging);
        DirwatchError::io("replacing", destination, e)
    })?;
    fs::remove_file(source).map_err(|e| DirwatchError::io("removing", source, e))
}
