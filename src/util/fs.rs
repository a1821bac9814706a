//! Filesystem scanning utilities.
//!
//! All searches tolerate a missing root (they yield nothing rather than
//! erroring) and return lexicographically sorted paths so diagnostics are
//! reproducible regardless of directory iteration order.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Recursively collect every entry under `root` (files and directories,
/// `root` itself excluded) for which `predicate` holds.
pub fn find_matching<P>(root: &Path, predicate: P) -> Vec<PathBuf>
where
    P: Fn(&DirEntry) -> bool,
{
    find_matching_with_depth(root, usize::MAX, predicate)
}

/// Like [`find_matching`], but descends at most `max_depth` levels below
/// `root` (1 = immediate children only).
pub fn find_matching_with_depth<P>(root: &Path, max_depth: usize, predicate: P) -> Vec<PathBuf>
where
    P: Fn(&DirEntry) -> bool,
{
    if !root.exists() {
        return Vec::new();
    }

    let mut results: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| predicate(entry))
        .map(|entry| entry.into_path())
        .collect();

    results.sort();
    results
}

/// Recursively collect every non-directory entry under `root` whose
/// filename extension equals `extension` exactly.
///
/// `extension` is dot-inclusive (e.g. ".dll") and matched case-sensitively.
pub fn find_files_with_extension(root: &Path, extension: &str) -> Vec<PathBuf> {
    let want = extension.strip_prefix('.').unwrap_or(extension);
    find_matching(root, |entry| {
        !entry.file_type().is_dir() && entry.path().extension() == Some(OsStr::new(want))
    })
}

/// Recursively collect every empty directory under `root`.
///
/// Emptiness is a property of the directory itself: a directory containing
/// only empty directories is not itself reported.
pub fn find_empty_directories(root: &Path) -> Vec<PathBuf> {
    find_matching(root, |entry| {
        entry.file_type().is_dir() && is_empty_dir(entry.path())
    })
}

/// Whether `path` is a directory with no entries at all.
pub fn is_empty_dir(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => false,
    }
}

/// Whether `path` exists and has no entries. A missing path counts as empty.
pub fn is_missing_or_empty(path: &Path) -> bool {
    !path.exists() || is_empty_dir(path)
}
