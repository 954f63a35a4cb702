// src/naming.rs

//! Naming policy: turn an incoming file name into a time-tagged destination
//! name of the form `[HH.m.s.ms][basename].ext`.
//!
//! Given `report[old].[2024]..csv` at 14:07:03.512 the result is
//! `[14.7.3.512][report2024].csv`:
//!
//! 1. With two or more `[...]` groups, the first one (plus one trailing dot)
//!    is treated as a stale tag and removed.
//! 2. Runs of dots collapse to a single dot.
//! 3. Remaining brackets are stripped, keeping their content.
//! 4. The original extension is cut off and re-appended after the tags.
//!
//! Names only have millisecond resolution, so two files processed within the
//! same millisecond can map to the same name. The relocation policy refuses to
//! overwrite in that case.

use std::path::Path;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Local, Timelike};
use regex::Regex;

use crate::clock::Clock;
use crate::errors::Result;
use crate::fs::FileSystem;

static BRACKET_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)\]\.?").unwrap());
static DOT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.+").unwrap());
static BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[+|\]+").unwrap());

/// Compute the destination name for the file at `path`.
///
/// Returns `Ok(None)` when `path` is not an existing regular file.
pub fn compute_destination_name(
    fs: &dyn FileSystem,
    clock: &dyn Clock,
    path: &Path,
) -> Result<Option<String>> {
    if !fs.is_file(path) {
        return Ok(None);
    }

    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };
    if file_name.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(destination_name(file_name, clock.now())))
}

/// Same as [`compute_destination_name`], evaluated on the blocking pool.
pub async fn compute_destination_name_async(
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    path: impl AsRef<Path>,
) -> Result<Option<String>> {
    let path = path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || {
        compute_destination_name(fs.as_ref(), clock.as_ref(), &path)
    })
    .await?
}

/// The pure name transformation, without touching the filesystem.
pub fn destination_name(file_name: &str, now: DateTime<Local>) -> String {
    let (_, extension) = split_extension(file_name);

    let mut name = file_name.to_string();
    let mut groups = BRACKET_GROUP.find_iter(file_name);
    if let (Some(first), Some(_)) = (groups.next(), groups.next()) {
        name.replace_range(first.range(), "");
    }

    let name = DOT_RUN.replace_all(&name, ".");
    let name = BRACKETS.replace_all(&name, "");
    let base = if extension.is_empty() {
        name.as_ref()
    } else {
        name.strip_suffix(extension).unwrap_or(&name)
    };

    format!("[{}][{}]{}", time_tag(now), base, extension)
}

/// `HH.m.s.ms`: two-digit hour, everything else unpadded.
pub fn time_tag(now: DateTime<Local>) -> String {
    format!(
        "{:02}.{}.{}.{}",
        now.hour(),
        now.minute(),
        now.second(),
        now.timestamp_subsec_millis().min(999)
    )
}

/// Split a file name into stem and extension, where the extension starts at
/// the last dot and includes it.
///
/// A name without a dot, or ending in one, has an empty extension. A leading
/// dot counts, so `.env` is all extension.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx + 1 < file_name.len() => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}
