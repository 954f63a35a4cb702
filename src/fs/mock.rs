// src/fs/mock.rs

use super::{FileSystem, MoveOutcome};
use crate::errors::{DirwatchError, Result};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
}

/// In-memory filesystem for deterministic tests.
///
/// Paths are used verbatim as keys, so tests should stick to absolute,
/// already-normalized paths.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    read_only: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut entries = self.lock();
        if let Some(parent) = path.parent() {
            ensure_dirs(&mut entries, parent);
        }
        entries.insert(path.to_path_buf(), MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        ensure_dirs(&mut self.lock(), path.as_ref());
    }

    /// Make every write under `prefix` fail with `PermissionDenied`.
    pub fn deny_writes_under(&self, prefix: impl Into<PathBuf>) {
        self.read_only.lock().unwrap().push(prefix.into());
    }

    /// Content of the file at `path`, if there is one.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().get(path.as_ref()) {
            Some(MockEntry::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    /// All file paths currently stored, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .lock()
            .iter()
            .filter(|(_, entry)| matches!(entry, MockEntry::File(_)))
            .map(|(path, _)| path.clone())
            .collect();
        files.sort();
        files
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap()
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        let denied = self.read_only.lock().unwrap();
        if denied.iter().any(|prefix| path.starts_with(prefix)) {
            return Err(DirwatchError::io(
                "writing",
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "read-only in mock"),
            ));
        }
        Ok(())
    }
}

fn ensure_dirs(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        entries
            .entry(ancestor.to_path_buf())
            .or_insert(MockEntry::Dir);
    }
}

fn not_found(op: &'static str, path: &Path) -> DirwatchError {
    DirwatchError::io(
        op,
        path,
        io::Error::new(io::ErrorKind::NotFound, "no such file in mock"),
    )
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Dir))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        if !self.is_dir(path) {
            self.check_writable(path)?;
        }
        self.add_dir(path);
        Ok(())
    }

    fn resolve_dir(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }

    fn move_no_clobber(&self, from: &Path, to: &Path) -> Result<MoveOutcome> {
        self.check_writable(to)?;
        let mut entries = self.lock();
        match entries.get(from) {
            Some(MockEntry::File(_)) => {}
            Some(MockEntry::Dir) => return Err(not_found("moving", from)),
            None => return Ok(MoveOutcome::SourceGone),
        }
        if entries.contains_key(to) {
            return Ok(MoveOutcome::Occupied);
        }
        if let Some(entry) = entries.remove(from) {
            entries.insert(to.to_path_buf(), entry);
        }
        Ok(MoveOutcome::Moved)
    }

    fn replace(&self, source: &Path, destination: &Path, backup: &Path) -> Result<()> {
        self.check_writable(destination)?;
        self.check_writable(backup)?;
        let mut entries = self.lock();
        let previous = match entries.get(destination) {
            Some(MockEntry::File(data)) => data.clone(),
            _ => return Err(not_found("replacing", destination)),
        };
        let incoming = match entries.get(source) {
            Some(MockEntry::File(data)) => data.clone(),
            _ => return Err(not_found("replacing", source)),
        };
        entries.remove(source);
        entries.insert(backup.to_path_buf(), MockEntry::File(previous));
        entries.insert(destination.to_path_buf(), MockEntry::File(incoming));
        Ok(())
    }
}
