//! Local audio file discovery.
//!
//! [`scan`] walks a directory (optionally recursive) and returns the files
//! whose extension is in a given list, case-insensitively. Unreadable
//! sub-directories are logged and skipped so one bad folder does not hide
//! the rest of a collection; only an unreadable root is an error.
//!
//! [`LocalFileIndex`] builds on a non-recursive scan to map each base name
//! to one extension for the organizer.

pub mod index;

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

pub use index::LocalFileIndex;

/// Scans `root` for files with one of `extensions` (no leading dot, any case).
///
/// When `recursive` is false only direct children are considered. The result
/// is sorted by path.
pub fn scan(root: &Path, recursive: bool, extensions: &[String]) -> Result<Vec<PathBuf>> {
    // Fail early and clearly when the root itself is unusable
    std::fs::read_dir(root).map_err(|e| Error::scan(root, e))?;

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    let mut skipped = 0usize;

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                skipped += 1;
                tracing::warn!(
                    target: "scanner",
                    path = ?e.path(),
                    error = %e,
                    "Skipping unreadable entry"
                );
                continue;
            }
        };

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    tracing::debug!(
        target: "scanner",
        root = %root.display(),
        recursive,
        found = files.len(),
        skipped,
        "Scan complete"
    );
    Ok(files)
}

/// Check if a path has one of the given extensions (case-insensitive)
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
}

/// Split a filename into stem and extension (without dot).
///
/// Only the last dot counts, so `"1. Song.mp3"` is `("1. Song", "mp3")`.
/// Names without a dot, or whose only dot is leading, have no extension.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos + 1..]),
        _ => (name, ""),
    }
}
