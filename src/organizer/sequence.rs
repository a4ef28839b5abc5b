//! Sequential numbering of a playlist directory.
//!
//! [`sort`] matches every playlist track to one audio file in the directory
//! and renames it to `"{n}. {name}"`, where `n` counts up to a chosen end
//! number in playlist order. [`unsort`] takes those prefixes off again using
//! the [`Ledger`].
//!
//! Files already in the ledger are never matched again, so running [`sort`]
//! twice over the same directory only numbers what is new. The prefix is
//! always added in front of the full current name, so [`unsort`] gets the
//! exact original back even when that name already started with a number.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use super::{Ledger, has_number_prefix, numbered_name, sanitize_filename, strip_number_prefix};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::matcher::rank_match;
use crate::model::Track;
use crate::scanner::{LocalFileIndex, split_name};

/// Options for [`sort`]
#[derive(Debug, Clone)]
pub struct SortOptions {
    /// Minimum similarity between a track's full title and a filename
    pub threshold: f64,
    /// Plan the renames without touching the disk
    pub dry_run: bool,
    /// Audio extensions eligible for numbering, in preference order
    pub extensions: Vec<String>,
    /// Extension of lyric sidecar files
    pub lyrics: String,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SortOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            threshold: config.matching.threshold,
            dry_run: false,
            extensions: config.formats.decoded.clone(),
            lyrics: config.formats.lyrics.clone(),
        }
    }
}

/// Options for [`unsort`]
#[derive(Debug, Clone)]
pub struct UnsortOptions {
    /// Extension of lyric sidecar files
    pub lyrics: String,
}

impl Default for UnsortOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl UnsortOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            lyrics: config.formats.lyrics.clone(),
        }
    }
}

/// Outcome of [`sort`]
#[derive(Debug, Clone, Default)]
pub struct SortReport {
    /// Audio files that were eligible for numbering
    pub files: usize,
    /// Audio renames as (old name, new name)
    pub renamed: Vec<(String, String)>,
    /// Lyric sidecar renames as (old name, new name)
    pub lyrics: Vec<(String, String)>,
    /// Tracks without a matching file, in playlist order
    pub unmatched: Vec<Track>,
    /// Renames refused or failed
    pub failed: usize,
    /// The ledger could not be written at the end of the batch
    pub ledger_error: Option<String>,
    pub dry_run: bool,
}

impl SortReport {
    /// False when the directory had nothing left to number
    pub fn applied(&self) -> bool {
        self.files > 0
    }
}

/// Outcome of [`unsort`]
#[derive(Debug, Clone, Default)]
pub struct UnsortReport {
    /// Entries found in the ledger
    pub entries: usize,
    /// Renames as (numbered name, restored name)
    pub restored: Vec<(String, String)>,
    /// Ledger entries that no longer exist on disk
    pub missing: usize,
    /// Existing entries without a prefix
    pub skipped: usize,
    /// Renames refused or failed
    pub failed: usize,
    /// The ledger pointed only at missing files and was deleted
    pub stale_removed: bool,
}

impl UnsortReport {
    /// True when at least one prefix was taken off
    pub fn cleared(&self) -> bool {
        !self.restored.is_empty()
    }
}

/// Rename `from` to `to` inside `dir`, never replacing an existing file.
fn rename_in(dir: &Path, from: &str, to: &str, dry_run: bool) -> Result<()> {
    let target = dir.join(to);
    if target.symlink_metadata().is_ok() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", to),
        )));
    }
    if !dry_run {
        fs::rename(dir.join(from), &target)?;
    }
    Ok(())
}

/// Number the audio files of `directory` in playlist order.
///
/// The last track gets `end_number`, the one before it `end_number - 1`, and
/// so on. Tracks are matched from the end of the playlist backwards and each
/// file is consumed by at most one track.
pub fn sort(
    directory: &Path,
    tracks: &[Track],
    end_number: u32,
    options: &SortOptions,
) -> Result<SortReport> {
    if tracks.is_empty() {
        return Err(Error::EmptyPlaylist);
    }
    if (end_number as usize) < tracks.len() {
        return Err(Error::InvalidEndNumber {
            end_number,
            track_count: tracks.len(),
        });
    }

    let mut ledger = Ledger::open(directory);
    let mut index = LocalFileIndex::build(directory, &options.extensions, ledger.entries())?;

    let mut report = SortReport {
        files: index.len(),
        dry_run: options.dry_run,
        ..Default::default()
    };

    if index.is_empty() {
        tracing::info!(
            target: "organizer::sort",
            dir = %directory.display(),
            "No unnumbered audio files"
        );
        return Ok(report);
    }

    tracing::info!(
        target: "organizer::sort",
        dir = %directory.display(),
        tracks = tracks.len(),
        files = index.len(),
        end_number,
        dry_run = options.dry_run,
        "Numbering playlist directory"
    );

    let last = tracks.len() - 1;
    for (i, track) in tracks.iter().enumerate().rev() {
        let number = end_number - (last - i) as u32;
        let key = track.full_title();

        let Some(stem) = rank_match(&key, index.stems(), options.threshold)
            .map(|m| m.candidate.to_string())
        else {
            tracing::warn!(target: "organizer::sort", track = %key, "No matching file");
            report.unmatched.push(track.clone());
            continue;
        };
        let Some(file) = index.remove(&stem) else {
            report.unmatched.push(track.clone());
            continue;
        };

        let current = file.file_name();
        let new_name = numbered_name(number, &sanitize_filename(&current));

        match rename_in(directory, &current, &new_name, options.dry_run) {
            Ok(()) => {
                tracing::info!(target: "organizer::sort", from = %current, to = %new_name, "Renamed");
                report.renamed.push((current, new_name.clone()));
            }
            Err(e) => {
                tracing::warn!(target: "organizer::sort", file = %current, error = %e, "Rename refused");
                report.failed += 1;
                continue;
            }
        }
        if !options.dry_run {
            ledger.record(new_name);
        }

        let lyric = format!("{}.{}", stem, options.lyrics);
        if !directory.join(&lyric).is_file() {
            continue;
        }
        let new_lyric = numbered_name(number, &format!("{}.{}", key, options.lyrics));
        match rename_in(directory, &lyric, &new_lyric, options.dry_run) {
            Ok(()) => {
                tracing::info!(target: "organizer::sort", from = %lyric, to = %new_lyric, "Renamed lyrics");
                report.lyrics.push((lyric, new_lyric.clone()));
                if !options.dry_run {
                    ledger.record(new_lyric);
                }
            }
            Err(e) => {
                tracing::warn!(target: "organizer::sort", file = %lyric, error = %e, "Lyric rename refused");
                report.failed += 1;
            }
        }
    }

    if !options.dry_run {
        if let Err(e) = ledger.sync() {
            tracing::warn!(target: "organizer::sort", error = %e, "Ledger could not be written");
            report.ledger_error = Some(e.to_string());
        }
    }
    report.unmatched.reverse();

    tracing::info!(
        target: "organizer::sort",
        renamed = report.renamed.len(),
        unmatched = report.unmatched.len(),
        failed = report.failed,
        "Numbering complete"
    );
    Ok(report)
}

/// Take the sequence prefixes listed in the ledger off again.
///
/// The ledger is deleted once at least one file was restored. A directory
/// without a usable ledger is left alone and reported as not cleared.
pub fn unsort(directory: &Path, options: &UnsortOptions) -> Result<UnsortReport> {
    let mut report = UnsortReport::default();

    let ledger = match Ledger::load(directory) {
        Ok(Some(ledger)) => ledger,
        Ok(None) => {
            tracing::info!(target: "organizer::unsort", dir = %directory.display(), "No ledger, nothing to clear");
            return Ok(report);
        }
        Err(e) => {
            tracing::warn!(target: "organizer::unsort", error = %e, "Ledger unreadable, nothing to clear");
            return Ok(report);
        }
    };
    report.entries = ledger.len();

    if ledger.is_empty() {
        tracing::info!(target: "organizer::unsort", dir = %directory.display(), "Ledger is empty");
        return Ok(report);
    }

    if !ledger.entries().iter().any(|e| directory.join(e).is_file()) {
        tracing::warn!(
            target: "organizer::unsort",
            dir = %directory.display(),
            entries = ledger.len(),
            "No ledger entry exists any more, removing stale ledger"
        );
        report.missing = ledger.len();
        report.stale_removed = Ledger::remove(directory)?;
        return Ok(report);
    }

    let mut handled: HashSet<String> = HashSet::new();
    for entry in ledger.entries() {
        if !handled.insert(entry.clone()) {
            continue;
        }
        if !directory.join(entry).is_file() {
            tracing::debug!(target: "organizer::unsort", file = %entry, "Listed file is gone");
            report.missing += 1;
            continue;
        }
        if !has_number_prefix(entry) {
            tracing::debug!(target: "organizer::unsort", file = %entry, "No prefix to strip");
            report.skipped += 1;
            continue;
        }

        restore(directory, entry, &mut report);

        let (stem, _) = split_name(entry);
        let lyric = format!("{}.{}", stem, options.lyrics);
        if lyric != *entry && directory.join(&lyric).is_file() && handled.insert(lyric.clone()) {
            restore(directory, &lyric, &mut report);
        }
    }

    if report.cleared() {
        if let Err(e) = Ledger::remove(directory) {
            tracing::warn!(target: "organizer::unsort", error = %e, "Could not delete ledger");
        }
    }

    tracing::info!(
        target: "organizer::unsort",
        restored = report.restored.len(),
        missing = report.missing,
        failed = report.failed,
        "Clearing complete"
    );
    Ok(report)
}

fn restore(directory: &Path, name: &str, report: &mut UnsortReport) {
    let original = strip_number_prefix(name);
    match rename_in(directory, name, original, false) {
        Ok(_) => {
            tracing::info!(target: "organizer::unsort", from = %name, to = %original, "Restored");
            report.restored.push((name.to_string(), original.to_string()));
        }
        Err(e) => {
            tracing::warn!(target: "organizer::unsort", file = %name, error = %e, "Restore refused");
            report.failed += 1;
        }
    }
}
