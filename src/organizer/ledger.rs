//! The rename ledger of a numbered playlist directory.
//!
//! A plain UTF-8 text file, one filename per line, stored as a dotfile inside
//! the directory it describes. It lists the names that currently carry a
//! sequence prefix applied by [`super::sort`]; its presence is what marks a
//! directory as numbered.
//!
//! Entries are appended as each rename succeeds, so an interrupted batch
//! still leaves a ledger that covers every rename already on disk. If an
//! append fails, or the existing file could not be read, entries are kept in
//! memory and [`Ledger::sync`] replaces the whole file atomically at the end
//! of the batch.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the ledger file inside a playlist directory
pub const LEDGER_FILE: &str = ".sorted_list";

/// Filenames with an applied sequence prefix, in the order they were recorded
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    entries: Vec<String>,
    /// The file on disk does not match `entries` and must be rewritten
    dirty: bool,
}

impl Ledger {
    /// Location of the ledger for a directory
    pub fn path_for(dir: &Path) -> PathBuf {
        dir.join(LEDGER_FILE)
    }

    /// Check if a directory is currently numbered
    pub fn exists(dir: &Path) -> bool {
        Self::path_for(dir).is_file()
    }

    /// Load the ledger of a directory.
    ///
    /// Returns `Ok(None)` when there is no ledger, and a ledger error when
    /// it exists but cannot be read.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = Self::path_for(dir);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::ledger(&path, e.to_string())),
        };

        let entries = contents
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect();

        Ok(Some(Self {
            path,
            entries,
            dirty: false,
        }))
    }

    /// Load the ledger of a directory, or start an empty one.
    ///
    /// An unreadable ledger is logged and treated as absent. It is never
    /// appended to; the next [`Ledger::sync`] replaces it.
    pub fn open(dir: &Path) -> Self {
        match Self::load(dir) {
            Ok(Some(ledger)) => ledger,
            Ok(None) => Self::empty(dir),
            Err(e) => {
                tracing::warn!(target: "organizer::ledger", error = %e, "Ignoring unreadable ledger");
                Self {
                    dirty: true,
                    ..Self::empty(dir)
                }
            }
        }
    }

    fn empty(dir: &Path) -> Self {
        Self {
            path: Self::path_for(dir),
            entries: Vec::new(),
            dirty: false,
        }
    }

    /// Recorded filenames
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Record a newly sequenced filename and append it to disk right away.
    ///
    /// Once a rewrite is pending the file is left alone until [`Ledger::sync`].
    pub fn record(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.dirty {
            self.entries.push(name);
            return;
        }
        if let Err(e) = self.append(&name) {
            tracing::warn!(
                target: "organizer::ledger",
                path = %self.path.display(),
                error = %e,
                "Ledger append failed, will rewrite at end of batch"
            );
            self.dirty = true;
        }
        self.entries.push(name);
    }

    fn append(&self, name: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", name)?;
        file.flush()
    }

    /// Rewrite the ledger if any append failed or the old file was unreadable.
    pub fn sync(&mut self) -> Result<()> {
        if self.dirty {
            self.save()?;
            self.dirty = false;
        }
        Ok(())
    }

    /// Write the whole ledger atomically (write to temp, then rename)
    pub fn save(&self) -> Result<()> {
        let mut contents = String::new();
        for entry in &self.entries {
            contents.push_str(entry);
            contents.push('\n');
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, contents).map_err(|e| Error::ledger(&temp_path, e.to_string()))?;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::ledger(&self.path, e.to_string()));
        }
        Ok(())
    }

    /// Delete the ledger of a directory. Returns whether one existed.
    pub fn remove(dir: &Path) -> Result<bool> {
        let path = Self::path_for(dir);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::ledger(&path, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_absent_ledger() {
        let dir = tempdir().unwrap();
        assert!(Ledger::load(dir.path()).unwrap().is_none());
        assert!(!Ledger::exists(dir.path()));
        assert!(Ledger::open(dir.path()).is_empty());
    }

    #[test]
    fn test_record_appends_immediately() {
        let dir = tempdir().unwrap();
        let mut ledger = Ledger::open(dir.path());

        ledger.record("9. Song A.mp3");
        // already on disk before any explicit save
        let on_disk = fs::read_to_string(Ledger::path_for(dir.path())).unwrap();
        assert_eq!(on_disk, "9. Song A.mp3\n");

        ledger.record("10. Song B.flac");
        let reloaded = Ledger::load(dir.path()).unwrap().unwrap();
        assert_eq!(reloaded.entries(), ["9. Song A.mp3", "10. Song B.flac"]);
    }

    #[test]
    fn test_record_extends_existing_ledger() {
        let dir = tempdir().unwrap();
        fs::write(Ledger::path_for(dir.path()), "1. Old.mp3\n").unwrap();

        let mut ledger = Ledger::open(dir.path());
        ledger.record("2. New.mp3");

        let reloaded = Ledger::load(dir.path()).unwrap().unwrap();
        assert_eq!(reloaded.entries(), ["1. Old.mp3", "2. New.mp3"]);
    }

    #[test]
    fn test_load_skips_blank_lines_and_crlf() {
        let dir = tempdir().unwrap();
        fs::write(Ledger::path_for(dir.path()), "1. A.mp3\r\n\n  \n2. B.mp3\n").unwrap();

        let ledger = Ledger::load(dir.path()).unwrap().unwrap();
        assert_eq!(ledger.entries(), ["1. A.mp3", "2. B.mp3"]);
    }

    #[test]
    fn test_unreadable_ledger_is_treated_as_empty() {
        let dir = tempdir().unwrap();
        fs::write(Ledger::path_for(dir.path()), [0xff, 0xfe, 0x00, b'\n']).unwrap();

        assert!(matches!(Ledger::load(dir.path()), Err(Error::Ledger { .. })));
        assert!(Ledger::open(dir.path()).is_empty());
    }

    #[test]
    fn test_unreadable_ledger_is_replaced_on_sync() {
        let dir = tempdir().unwrap();
        let path = Ledger::path_for(dir.path());
        fs::write(&path, [0xff, 0xfe, b'\n']).unwrap();

        let mut ledger = Ledger::open(dir.path());
        ledger.record("1. Song A.mp3");
        // the broken file is not appended to
        assert_eq!(fs::read(&path).unwrap(), [0xff, 0xfe, b'\n']);

        ledger.sync().unwrap();
        let reloaded = Ledger::load(dir.path()).unwrap().unwrap();
        assert_eq!(reloaded.entries(), ["1. Song A.mp3"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_rewrite_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        fs::create_dir(Ledger::path_for(dir.path())).unwrap();

        let mut ledger = Ledger::open(dir.path());
        ledger.record("1. Song A.mp3");

        assert!(matches!(ledger.sync(), Err(Error::Ledger { .. })));
        assert!(!dir.path().join(".sorted_list.tmp").exists());
    }

    #[test]
    fn test_save_and_remove() {
        let dir = tempdir().unwrap();
        let mut ledger = Ledger::open(dir.path());
        ledger.entries.push("3. C.mp3".to_string());
        ledger.dirty = true;
        ledger.sync().unwrap();

        let reloaded = Ledger::load(dir.path()).unwrap().unwrap();
        assert_eq!(reloaded.entries(), ["3. C.mp3"]);

        assert!(Ledger::remove(dir.path()).unwrap());
        assert!(!Ledger::remove(dir.path()).unwrap());
        assert!(!Ledger::exists(dir.path()));
    }
}
