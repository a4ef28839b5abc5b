//! Collecting playlist tracks from a local music collection.
//!
//! [`collect_playlist`] finds each track of a playlist in the music
//! directory and copies it into the playlist's own directory through
//! [`copy_to_playlist`], which refuses copies that would duplicate a file
//! already there, including encrypted files whose decoded version exists.

use std::fmt;
use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};

use crate::config::{Config, FormatsConfig};
use crate::error::{Error, Result, ResultExt};
use crate::matcher::{MatchMode, is_substring_match, substring_match};
use crate::model::{Playlist, Track};
use crate::scanner::{self, split_name};

/// Why a copy was not made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A file with the same name is already in the target directory
    AlreadyExists,
    /// The source is encrypted and its decoded version is already there
    AlreadyDecoded,
    /// The source is encrypted and a decoded file naming the same track is
    /// already there
    LikelyDuplicateDecoded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::AlreadyExists => "already-exists",
            SkipReason::AlreadyDecoded => "already-decoded",
            SkipReason::LikelyDuplicateDecoded => "likely-duplicate-decoded",
        };
        f.write_str(s)
    }
}

/// Result of [`copy_to_playlist`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Copied to this path
    Copied(PathBuf),
    Skipped(SkipReason),
}

/// Copy one file into a playlist directory unless it would be a duplicate.
///
/// The target directory is created when missing. Modification and access
/// times of the source are kept on the copy. `hint` is the track the file
/// was matched for and enables the name-based duplicate check.
pub fn copy_to_playlist(
    source: &Path,
    target_dir: &Path,
    hint: Option<&Track>,
    formats: &FormatsConfig,
) -> Result<CopyOutcome> {
    fs::create_dir_all(target_dir)
        .with_context(format!("Failed to create directory: {:?}", target_dir))?;

    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::not_found(source))?;
    let target = target_dir.join(file_name);

    if target.exists() {
        return Ok(skip(source, SkipReason::AlreadyExists));
    }

    let (stem, ext) = split_name(file_name);
    if formats.is_encrypted(ext) {
        let decoded = decoded_files(target_dir, formats)?;
        if decoded.iter().any(|name| split_name(name).0 == stem) {
            return Ok(skip(source, SkipReason::AlreadyDecoded));
        }

        if let Some(track) = hint {
            if decoded
                .iter()
                .any(|name| is_substring_match(track, name, MatchMode::Exact))
            {
                return Ok(skip(source, SkipReason::LikelyDuplicateDecoded));
            }
        }
    }

    fs::copy(source, &target).with_context(format!("Failed to copy file to: {:?}", target))?;
    if let Err(e) = copy_times(source, &target) {
        tracing::warn!(
            target: "library::copy",
            path = %target.display(),
            error = %e,
            "Could not preserve timestamps"
        );
    }

    tracing::info!(
        target: "library::copy",
        from = %source.display(),
        to = %target.display(),
        "Copied"
    );
    Ok(CopyOutcome::Copied(target))
}

fn skip(source: &Path, reason: SkipReason) -> CopyOutcome {
    tracing::debug!(target: "library::copy", path = %source.display(), %reason, "Skipped");
    CopyOutcome::Skipped(reason)
}

/// Names of the decoded-format files in `dir`, extensions matched in any case.
fn decoded_files(dir: &Path, formats: &FormatsConfig) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::scan(dir, e))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };
        if formats.is_decoded(split_name(&name).1) {
            names.push(name);
        }
    }
    Ok(names)
}

fn copy_times(source: &Path, target: &Path) -> std::io::Result<()> {
    let meta = fs::metadata(source)?;
    let times = FileTimes::new()
        .set_accessed(meta.accessed()?)
        .set_modified(meta.modified()?);
    File::options().write(true).open(target)?.set_times(times)
}

/// Settings for [`collect_playlist`]
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Where to search for the tracks
    pub music_dir: PathBuf,
    /// Where to copy them
    pub target_dir: PathBuf,
    pub recursive: bool,
    pub mode: MatchMode,
    /// Extensions searched in the music directory
    pub extensions: Vec<String>,
    pub formats: FormatsConfig,
    /// Match and report without copying
    pub dry_run: bool,
}

impl CollectOptions {
    pub fn from_config(config: &Config, target_dir: PathBuf) -> Self {
        Self {
            music_dir: config.library.music_dir.clone(),
            target_dir,
            recursive: config.library.recursive,
            mode: MatchMode::from_fuzzy(config.matching.fuzzy),
            extensions: config.matching.extensions.clone(),
            formats: config.formats.clone(),
            dry_run: false,
        }
    }
}

/// Outcome of [`collect_playlist`]
#[derive(Debug, Clone, Default)]
pub struct CollectReport {
    pub total: usize,
    pub found: usize,
    /// Tracks without any local file, in playlist order
    pub not_found: Vec<Track>,
    /// New files in the target directory
    pub copied: Vec<PathBuf>,
    /// Sources that were not copied, with the reason
    pub skipped: Vec<(PathBuf, SkipReason)>,
    pub failed: usize,
}

impl CollectReport {
    /// Share of tracks found locally, 0.0 to 1.0
    pub fn match_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.found as f64 / self.total as f64
        }
    }
}

/// Find every track of `playlist` in the music directory and copy it into
/// the target directory.
///
/// When a track matches several files, the best format wins (decoded before
/// encrypted, then scan order). A failed copy is counted and the batch goes
/// on.
pub fn collect_playlist(playlist: &Playlist, options: &CollectOptions) -> Result<CollectReport> {
    let files = scanner::scan(&options.music_dir, options.recursive, &options.extensions)?;
    tracing::info!(
        target: "library::copy",
        playlist = %playlist.name,
        tracks = playlist.tracks.len(),
        files = files.len(),
        mode = ?options.mode,
        "Collecting playlist"
    );

    let mut report = CollectReport {
        total: playlist.tracks.len(),
        ..Default::default()
    };

    for (i, track) in playlist.tracks.iter().enumerate() {
        let matches = substring_match(track, &files, options.mode);
        let Some(source) = best_source(&matches, &options.formats) else {
            tracing::info!(target: "library::copy", n = i + 1, track = %track.label(), "Not found");
            report.not_found.push(track.clone());
            continue;
        };
        report.found += 1;
        tracing::info!(
            target: "library::copy",
            n = i + 1,
            track = %track.label(),
            file = %source.display(),
            candidates = matches.len(),
            "Found"
        );

        if options.dry_run {
            continue;
        }

        match copy_to_playlist(source, &options.target_dir, Some(track), &options.formats) {
            Ok(CopyOutcome::Copied(path)) => report.copied.push(path),
            Ok(CopyOutcome::Skipped(reason)) => report.skipped.push((source.clone(), reason)),
            Err(e) => {
                tracing::warn!(target: "library::copy", file = %source.display(), error = %e, "Copy failed");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        target: "library::copy",
        found = report.found,
        total = report.total,
        copied = report.copied.len(),
        skipped = report.skipped.len(),
        failed = report.failed,
        "Collect complete"
    );
    Ok(report)
}

fn best_source<'a>(matches: &'a [PathBuf], formats: &FormatsConfig) -> Option<&'a PathBuf> {
    matches.iter().min_by_key(|path| {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        formats.rank(ext)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{list_names, mock_track, playlist_dir, touch};

    fn formats() -> FormatsConfig {
        FormatsConfig::default()
    }

    #[test]
    fn test_copy_creates_target_and_copies() {
        let music = playlist_dir(&["Song - Artist.mp3"]);
        let target = music.path().join("playlists").join("Road Trip");

        let outcome = copy_to_playlist(
            &music.path().join("Song - Artist.mp3"),
            &target,
            None,
            &formats(),
        )
        .unwrap();

        let copied = target.join("Song - Artist.mp3");
        assert_eq!(outcome, CopyOutcome::Copied(copied.clone()));
        assert_eq!(fs::read_to_string(copied).unwrap(), "Song - Artist.mp3");
        // source stays where it was
        assert!(music.path().join("Song - Artist.mp3").exists());
    }

    #[test]
    fn test_copy_preserves_modification_time() {
        let music = playlist_dir(&["old.mp3"]);
        let source = music.path().join("old.mp3");
        let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        File::options()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(past)
            .unwrap();

        let target = tempfile::tempdir().unwrap();
        copy_to_playlist(&source, target.path(), None, &formats()).unwrap();

        let copied = fs::metadata(target.path().join("old.mp3")).unwrap();
        assert_eq!(copied.modified().unwrap(), past);
    }

    #[test]
    fn test_skip_existing_name() {
        let music = playlist_dir(&["Song.mp3"]);
        let target = playlist_dir(&["Song.mp3"]);
        fs::write(target.path().join("Song.mp3"), b"keep me").unwrap();

        let outcome =
            copy_to_playlist(&music.path().join("Song.mp3"), target.path(), None, &formats())
                .unwrap();

        assert_eq!(outcome, CopyOutcome::Skipped(SkipReason::AlreadyExists));
        assert_eq!(fs::read(target.path().join("Song.mp3")).unwrap(), b"keep me");
    }

    #[test]
    fn test_skip_encrypted_when_decoded_exists() {
        let music = playlist_dir(&["Song A - Artist.ncm"]);
        let target = playlist_dir(&["Song A - Artist.flac"]);

        let outcome = copy_to_playlist(
            &music.path().join("Song A - Artist.ncm"),
            target.path(),
            None,
            &formats(),
        )
        .unwrap();

        assert_eq!(outcome, CopyOutcome::Skipped(SkipReason::AlreadyDecoded));
        assert_eq!(list_names(target.path()), vec!["Song A - Artist.flac"]);
    }

    #[test]
    fn test_decoded_extension_matches_any_case() {
        let music = playlist_dir(&["Song A - Artist.ncm"]);
        let target = playlist_dir(&["Song A - Artist.FLAC"]);

        let outcome = copy_to_playlist(
            &music.path().join("Song A - Artist.ncm"),
            target.path(),
            None,
            &formats(),
        )
        .unwrap();

        assert_eq!(outcome, CopyOutcome::Skipped(SkipReason::AlreadyDecoded));
        assert_eq!(list_names(target.path()), vec!["Song A - Artist.FLAC"]);
    }

    #[test]
    fn test_skip_encrypted_when_track_already_decoded_under_other_name() {
        let music = playlist_dir(&["12345.ncm"]);
        let target = playlist_dir(&["Artist - Song A.mp3"]);
        let track = mock_track("Song A", &["Artist"]);

        let outcome = copy_to_playlist(
            &music.path().join("12345.ncm"),
            target.path(),
            Some(&track),
            &formats(),
        )
        .unwrap();
        assert_eq!(outcome, CopyOutcome::Skipped(SkipReason::LikelyDuplicateDecoded));

        // without a hint there is nothing to compare names against
        let outcome =
            copy_to_playlist(&music.path().join("12345.ncm"), target.path(), None, &formats())
                .unwrap();
        assert!(matches!(outcome, CopyOutcome::Copied(_)));
    }

    #[test]
    fn test_decoded_sources_are_not_deduplicated_by_name() {
        let music = playlist_dir(&["Song A - Artist.mp3"]);
        let target = playlist_dir(&["Song A - Artist.flac"]);
        let track = mock_track("Song A", &["Artist"]);

        let outcome = copy_to_playlist(
            &music.path().join("Song A - Artist.mp3"),
            target.path(),
            Some(&track),
            &formats(),
        )
        .unwrap();
        assert!(matches!(outcome, CopyOutcome::Copied(_)));
    }

    #[test]
    fn test_missing_source_is_error() {
        let target = playlist_dir(&[]);
        let result = copy_to_playlist(
            &target.path().join("gone.mp3"),
            &target.path().join("out"),
            None,
            &formats(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::AlreadyExists.to_string(), "already-exists");
        assert_eq!(SkipReason::AlreadyDecoded.to_string(), "already-decoded");
        assert_eq!(
            SkipReason::LikelyDuplicateDecoded.to_string(),
            "likely-duplicate-decoded"
        );
    }

    fn collect_options(music: &Path, target: &Path) -> CollectOptions {
        let mut config = Config::default();
        config.library.music_dir = music.to_path_buf();
        CollectOptions::from_config(&config, target.to_path_buf())
    }

    fn road_trip() -> Playlist {
        Playlist {
            name: "Road Trip".to_string(),
            creator: String::new(),
            tracks: vec![
                mock_track("Song A", &["Artist"]),
                mock_track("Song B", &["Band"]),
                mock_track("Missing", &["Nobody"]),
            ],
        }
    }

    #[test]
    fn test_collect_copies_found_tracks() {
        let music = playlist_dir(&[]);
        touch(music.path(), "pop/Song A - Artist.mp3");
        touch(music.path(), "rock/Band - Song B.flac");
        touch(music.path(), "rock/unrelated.mp3");
        let target = tempfile::tempdir().unwrap();

        let report = collect_playlist(&road_trip(), &collect_options(music.path(), target.path()))
            .unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.found, 2);
        assert_eq!(report.copied.len(), 2);
        assert_eq!(report.not_found.len(), 1);
        assert_eq!(report.not_found[0].title, "Missing");
        assert!((report.match_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            list_names(target.path()),
            vec!["Band - Song B.flac", "Song A - Artist.mp3"]
        );
    }

    #[test]
    fn test_collect_prefers_decoded_match() {
        let music = playlist_dir(&["Song A - Artist.ncm", "Song A - Artist.mp3"]);
        let target = tempfile::tempdir().unwrap();
        let playlist = Playlist {
            tracks: vec![mock_track("Song A", &["Artist"])],
            ..road_trip()
        };

        let report =
            collect_playlist(&playlist, &collect_options(music.path(), target.path())).unwrap();

        assert_eq!(report.copied, vec![target.path().join("Song A - Artist.mp3")]);
    }

    #[test]
    fn test_collect_second_run_skips_everything() {
        let music = playlist_dir(&["Song A - Artist.mp3"]);
        let target = tempfile::tempdir().unwrap();
        let options = collect_options(music.path(), target.path());

        collect_playlist(&road_trip(), &options).unwrap();
        let again = collect_playlist(&road_trip(), &options).unwrap();

        assert!(again.copied.is_empty());
        assert_eq!(again.skipped.len(), 1);
        assert_eq!(again.skipped[0].1, SkipReason::AlreadyExists);
    }

    #[test]
    fn test_collect_dry_run_copies_nothing() {
        let music = playlist_dir(&["Song A - Artist.mp3"]);
        let target = music.path().join("out");
        let mut options = collect_options(music.path(), &target);
        options.dry_run = true;

        let report = collect_playlist(&road_trip(), &options).unwrap();

        assert_eq!(report.found, 1);
        assert!(report.copied.is_empty());
        assert!(!target.exists());
    }

    #[test]
    fn test_collect_missing_music_dir_is_scan_error() {
        let music = playlist_dir(&[]);
        let options = collect_options(&music.path().join("missing"), music.path());
        let err = collect_playlist(&road_trip(), &options).unwrap_err();
        assert!(matches!(err, Error::Scan { .. }));
    }

    #[test]
    fn test_match_rate_of_empty_playlist() {
        assert_eq!(CollectReport::default().match_rate(), 0.0);
    }
}
