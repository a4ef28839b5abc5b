//! Base-name index of a single directory.
//!
//! Maps each file stem to exactly one extension. When two files share a
//! stem (`Song.flac` and `Song.ncm`), the extension listed earlier in the
//! extension list passed to [`LocalFileIndex::build`] wins; callers pass
//! decoded formats before encrypted ones. Equal rank keeps the first file in
//! sorted scan order. Iteration follows that scan order, which is the
//! "first encountered" order used for ranking ties.

use std::path::Path;

use super::{scan, split_name};
use crate::error::Result;

/// One indexed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    /// Filename without extension
    pub stem: String,
    /// Extension without the dot, original case
    pub ext: String,
}

impl IndexedFile {
    /// Full filename
    pub fn file_name(&self) -> String {
        if self.ext.is_empty() {
            self.stem.clone()
        } else {
            format!("{}.{}", self.stem, self.ext)
        }
    }
}

/// Stem-to-extension index of one directory, rebuilt for every operation
#[derive(Debug, Clone)]
pub struct LocalFileIndex {
    entries: Vec<IndexedFile>,
}

impl LocalFileIndex {
    /// Index the direct children of `dir` with one of `extensions`,
    /// leaving out any whose full filename is in `exclude`.
    pub fn build(dir: &Path, extensions: &[String], exclude: &[String]) -> Result<Self> {
        let mut entries: Vec<IndexedFile> = Vec::new();

        for path in scan(dir, false, extensions)? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                tracing::warn!(target: "scanner", path = %path.display(), "Skipping non UTF-8 filename");
                continue;
            };
            if exclude.iter().any(|e| e == name) {
                continue;
            }

            let (stem, ext) = split_name(name);
            let candidate = IndexedFile {
                stem: stem.to_string(),
                ext: ext.to_string(),
            };

            match entries.iter_mut().find(|e| e.stem == candidate.stem) {
                Some(existing) => {
                    if rank(extensions, &candidate.ext) < rank(extensions, &existing.ext) {
                        tracing::debug!(
                            target: "scanner",
                            stem = %candidate.stem,
                            kept = %candidate.ext,
                            dropped = %existing.ext,
                            "Preferring format for shared base name"
                        );
                        existing.ext = candidate.ext;
                    }
                }
                None => entries.push(candidate),
            }
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take an entry out so it cannot be matched again
    pub fn remove(&mut self, stem: &str) -> Option<IndexedFile> {
        let pos = self.entries.iter().position(|e| e.stem == stem)?;
        Some(self.entries.remove(pos))
    }

    /// Stems in scan order
    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.stem.as_str())
    }
}

fn rank(extensions: &[String], ext: &str) -> usize {
    extensions
        .iter()
        .position(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::touch;
    use tempfile::tempdir;

    fn exts() -> Vec<String> {
        ["flac", "mp3", "ncm"].into_iter().map(String::from).collect()
    }

    fn ext_of(index: &mut LocalFileIndex, stem: &str) -> Option<String> {
        index.remove(stem).map(|f| f.ext)
    }

    #[test]
    fn test_build_maps_stems_to_extensions() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "Song A - Artist.mp3");
        touch(dir.path(), "Song B - Artist.FLAC");
        touch(dir.path(), "Song A - Artist.lrc");

        let mut index = LocalFileIndex::build(dir.path(), &exts(), &[]).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(ext_of(&mut index, "Song A - Artist").as_deref(), Some("mp3"));
        assert_eq!(ext_of(&mut index, "Song B - Artist").as_deref(), Some("FLAC"));
        assert_eq!(ext_of(&mut index, "missing"), None);
    }

    #[test]
    fn test_shared_stem_prefers_decoded_format() {
        let dir = tempdir().unwrap();
        let exts: Vec<String> = ["flac", "mp3", "ogg", "ncm"].into_iter().map(String::from).collect();
        // "Song.ncm" is scanned before "Song.ogg", rank must decide
        touch(dir.path(), "Song.ncm");
        touch(dir.path(), "Song.ogg");

        let mut index = LocalFileIndex::build(dir.path(), &exts, &[]).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(ext_of(&mut index, "Song").as_deref(), Some("ogg"));

        touch(dir.path(), "Song.flac");
        let mut index = LocalFileIndex::build(dir.path(), &exts, &[]).unwrap();
        assert_eq!(ext_of(&mut index, "Song").as_deref(), Some("flac"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_shared_stem_equal_rank_keeps_first_seen() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "Song.MP3");
        touch(dir.path(), "Song.mp3");

        let mut index = LocalFileIndex::build(dir.path(), &exts(), &[]).unwrap();
        assert_eq!(index.len(), 1);
        // uppercase sorts first
        assert_eq!(ext_of(&mut index, "Song").as_deref(), Some("MP3"));
    }

    #[test]
    fn test_exclude_full_filenames() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "1. Done.mp3");
        touch(dir.path(), "Todo.mp3");

        let index =
            LocalFileIndex::build(dir.path(), &exts(), &["1. Done.mp3".to_string()]).unwrap();
        assert_eq!(index.stems().collect::<Vec<_>>(), vec!["Todo"]);
    }

    #[test]
    fn test_remove_consumes_entry() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.mp3");
        touch(dir.path(), "b.mp3");

        let mut index = LocalFileIndex::build(dir.path(), &exts(), &[]).unwrap();
        let taken = index.remove("a").unwrap();
        assert_eq!(taken.file_name(), "a.mp3");
        assert!(index.remove("a").is_none());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_iteration_follows_scan_order() {
        let dir = tempdir().unwrap();
        for name in ["c.mp3", "a.mp3", "b.flac"] {
            touch(dir.path(), name);
        }
        let index = LocalFileIndex::build(dir.path(), &exts(), &[]).unwrap();
        assert_eq!(index.stems().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
