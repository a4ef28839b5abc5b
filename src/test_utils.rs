//! Test utilities and fixtures for playlist-minder tests.
//!
//! This module provides file fixtures and mock factories to reduce
//! boilerplate in tests that work on real temporary directories.
//!
//! # Example
//!
//! ```ignore
//! use playlist_minder::test_utils::{playlist_dir, mock_track, list_names};
//!
//! #[test]
//! fn test_something() {
//!     let dir = playlist_dir(&["Song A - Artist.mp3"]);
//!     let track = mock_track("Song A", &["Artist"]);
//!     // ... test logic
//!     assert_eq!(list_names(dir.path()), vec!["Song A - Artist.mp3"]);
//! }
//! ```

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::model::Track;

/// Creates a small file named `name` inside `dir` and returns its path.
///
/// The content is the filename itself, so copies can be told apart.
pub fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(&path, name.as_bytes()).expect("Failed to create test file");
    path
}

/// Creates a temporary directory holding the given files.
///
/// Keep the returned `TempDir` alive for the duration of your test.
pub fn playlist_dir(names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    for name in names {
        touch(dir.path(), name);
    }
    dir
}

/// Creates a mock Track with the given title and artists.
///
/// Customize further through the public fields:
///
/// ```ignore
/// let mut track = mock_track("Song", &["Artist"]);
/// track.album = Some("Album".to_string());
/// ```
pub fn mock_track(title: &str, artists: &[&str]) -> Track {
    Track::new(title, artists)
}

/// Sorted filenames of the direct children of `dir`, dotfiles included.
pub fn list_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read test directory")
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(String::from))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_dir_creates_files() {
        let dir = playlist_dir(&["b.mp3", "a.flac"]);
        assert_eq!(list_names(dir.path()), vec!["a.flac", "b.mp3"]);
    }

    #[test]
    fn test_touch_writes_name_as_content() {
        let dir = playlist_dir(&[]);
        let path = touch(dir.path(), "sub/x.mp3");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "sub/x.mp3");
    }

    #[test]
    fn test_mock_track_defaults() {
        let track = mock_track("Song", &["A", "B"]);
        assert_eq!(track.title, "Song");
        assert_eq!(track.artist_joined, "A, B");
        assert!(track.album.is_none());
    }
}
