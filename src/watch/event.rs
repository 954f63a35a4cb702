// src/watch/event.rs

//! Change events and their translation from raw `notify` events.

use std::fmt;
use std::path::{Path, PathBuf};

use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};

use crate::watch::filter::NameFilter;
use crate::watch::trigger::{TriggerCategory, TriggerMask};

/// Which subscription slot an event goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Changed,
    Renamed,
    Deleted,
    Error,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 5] = [
        ChangeKind::Created,
        ChangeKind::Changed,
        ChangeKind::Renamed,
        ChangeKind::Deleted,
        ChangeKind::Error,
    ];
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Changed => "changed",
            ChangeKind::Renamed => "renamed",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Error => "error",
        };
        f.write_str(s)
    }
}

/// A single change observed in a watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Created { path: PathBuf },
    Changed { path: PathBuf },
    Renamed { from: PathBuf, to: PathBuf },
    Deleted { path: PathBuf },
    /// The watcher itself failed (e.g. its event queue overflowed).
    Error {
        path: Option<PathBuf>,
        message: String,
    },
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Created { .. } => ChangeKind::Created,
            ChangeEvent::Changed { .. } => ChangeKind::Changed,
            ChangeEvent::Renamed { .. } => ChangeKind::Renamed,
            ChangeEvent::Deleted { .. } => ChangeKind::Deleted,
            ChangeEvent::Error { .. } => ChangeKind::Error,
        }
    }

    /// The affected path; the new path for renames.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ChangeEvent::Created { path }
            | ChangeEvent::Changed { path }
            | ChangeEvent::Deleted { path } => Some(path),
            ChangeEvent::Renamed { to, .. } => Some(to),
            ChangeEvent::Error { path, .. } => path.as_deref(),
        }
    }

    pub fn from_error(err: &notify::Error) -> Self {
        ChangeEvent::Error {
            path: err.paths.first().cloned(),
            message: err.to_string(),
        }
    }
}

/// Translate one raw `notify` event into zero or more change events, keeping
/// only those allowed by `mask` and `filter`.
pub fn translate(event: &Event, mask: TriggerMask, filter: &NameFilter) -> Vec<ChangeEvent> {
    use TriggerCategory::*;

    let per_path = |make: fn(PathBuf) -> ChangeEvent, allowed: &dyn Fn(&Path) -> bool| {
        event
            .paths
            .iter()
            .filter(|p| allowed(p.as_path()) && filter.matches(p))
            .map(|p| make(p.clone()))
            .collect::<Vec<_>>()
    };
    let created = |path: PathBuf| ChangeEvent::Created { path };
    let changed = |path: PathBuf| ChangeEvent::Changed { path };
    let deleted = |path: PathBuf| ChangeEvent::Deleted { path };

    match event.kind {
        EventKind::Create(kind) => {
            let is_dir = match kind {
                CreateKind::File => Some(false),
                CreateKind::Folder => Some(true),
                _ => None,
            };
            per_path(created, &|p: &Path| name_allowed(mask, is_dir.or_else(|| probe_dir(p))))
        }
        EventKind::Remove(kind) => {
            let is_dir = match kind {
                RemoveKind::File => Some(false),
                RemoveKind::Folder => Some(true),
                _ => None,
            };
            per_path(deleted, &|_: &Path| name_allowed(mask, is_dir))
        }
        EventKind::Modify(ModifyKind::Name(mode)) => translate_rename(event, mode, mask, filter),
        EventKind::Modify(ModifyKind::Data(change)) => {
            let wanted = match change {
                DataChange::Size => mask.contains(Size),
                _ => mask.contains_any(&[LastWrite, Size]),
            };
            per_path(changed, &|_: &Path| wanted)
        }
        EventKind::Modify(ModifyKind::Metadata(kind)) => {
            let wanted = match kind {
                MetadataKind::AccessTime => mask.contains(LastAccess),
                MetadataKind::WriteTime => mask.contains(LastWrite),
                MetadataKind::Permissions | MetadataKind::Ownership => mask.contains(Security),
                _ => mask.contains(Attributes),
            };
            per_path(changed, &|_: &Path| wanted)
        }
        EventKind::Modify(_) => {
            let wanted = mask.contains_any(&[LastWrite, Size, Attributes]);
            per_path(changed, &|_: &Path| wanted)
        }
        EventKind::Access(_) => {
            let wanted = mask.contains(LastAccess);
            per_path(changed, &|_: &Path| wanted)
        }
        EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Pairs the two halves of a rename.
///
/// On Linux a rename inside the watched tree arrives as `From`, `To` and then
/// `Both`, all with the same tracker. A file moved in from elsewhere only
/// produces `To`, and a file moved out only produces `From`. Windows reports a
/// rename as `From` directly followed by `To`, neither carrying a tracker,
/// and never sends `Both`. Held-back `From` halves are reported as deletions
/// once it is clear no `To` follows.
#[derive(Debug, Default)]
pub struct RenamePairing {
    pending: Option<(Option<usize>, PathBuf)>,
}

impl RenamePairing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Like [`translate`], but resolves rename halves.
    pub fn translate(
        &mut self,
        event: &Event,
        mask: TriggerMask,
        filter: &NameFilter,
    ) -> Vec<ChangeEvent> {
        let mut out = Vec::new();

        if let (EventKind::Modify(ModifyKind::Name(mode)), Some(path)) =
            (event.kind, event.paths.first())
        {
            let tracker = event.tracker();
            match mode {
                RenameMode::From => {
                    out.extend(self.flush(mask, filter));
                    self.pending = Some((tracker, path.clone()));
                    return out;
                }
                RenameMode::To => {
                    match self.pending.take() {
                        // The `Both` event that follows carries the rename.
                        Some((Some(held), _)) if tracker == Some(held) => {}
                        Some((None, from)) if tracker.is_none() => {
                            out.extend(renamed(&from, path, mask, filter));
                        }
                        held => {
                            self.pending = held;
                            out.extend(self.flush(mask, filter));
                            out.extend(one_sided(event, mask, filter, |path| {
                                ChangeEvent::Created { path }
                            }));
                        }
                    }
                    return out;
                }
                _ => {}
            }
        }

        out.extend(self.flush(mask, filter));
        out.extend(translate(event, mask, filter));
        out
    }

    /// Report a held-back rename source as deleted.
    pub fn flush(&mut self, mask: TriggerMask, filter: &NameFilter) -> Vec<ChangeEvent> {
        match self.pending.take() {
            Some((_, path)) if name_allowed(mask, None) && filter.matches(&path) => {
                vec![ChangeEvent::Deleted { path }]
            }
            _ => Vec::new(),
        }
    }
}

fn translate_rename(
    event: &Event,
    mode: RenameMode,
    mask: TriggerMask,
    filter: &NameFilter,
) -> Vec<ChangeEvent> {
    match mode {
        RenameMode::Both => {
            let (from, to) = match event.paths.as_slice() {
                [from, to] => (from, to),
                _ => return Vec::new(),
            };
            renamed(from, to, mask, filter).into_iter().collect()
        }
        // Tracked halves need state to pair up; see `RenamePairing`.
        RenameMode::From | RenameMode::To if event.tracker().is_some() => Vec::new(),
        RenameMode::From => one_sided(event, mask, filter, |path| ChangeEvent::Deleted { path }),
        RenameMode::To => one_sided(event, mask, filter, |path| ChangeEvent::Created { path }),
        RenameMode::Any | RenameMode::Other => one_sided(event, mask, filter, |path| {
            if path.exists() {
                ChangeEvent::Created { path }
            } else {
                ChangeEvent::Deleted { path }
            }
        }),
    }
}

fn renamed(from: &Path, to: &Path, mask: TriggerMask, filter: &NameFilter) -> Option<ChangeEvent> {
    if !name_allowed(mask, probe_dir(to)) || !filter.matches(to) {
        return None;
    }
    Some(ChangeEvent::Renamed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
    })
}

fn one_sided(
    event: &Event,
    mask: TriggerMask,
    filter: &NameFilter,
    make: impl Fn(PathBuf) -> ChangeEvent,
) -> Vec<ChangeEvent> {
    event
        .paths
        .iter()
        .filter(|p| name_allowed(mask, probe_dir(p)) && filter.matches(p))
        .map(|p| make(p.clone()))
        .collect()
}

/// Name-level events need `file_name` for files and `directory_name` for
/// directories; when the type is unknown either one is enough.
fn name_allowed(mask: TriggerMask, is_dir: Option<bool>) -> bool {
    match is_dir {
        Some(true) => mask.contains(TriggerCategory::DirectoryName),
        Some(false) => mask.contains(TriggerCategory::FileName),
        None => mask.contains_any(&[TriggerCategory::FileName, TriggerCategory::DirectoryName]),
    }
}

fn probe_dir(path: &Path) -> Option<bool> {
    std::fs::metadata(path).ok().map(|m| m.is_dir())
}
