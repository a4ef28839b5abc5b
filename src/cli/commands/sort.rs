//! Numbering commands.

use anyhow::Context;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::model::Playlist;
use crate::organizer::{self, Ledger, SortOptions, UnsortOptions};

use super::collect::PLAYLIST_COPY;

/// Prefix the files of a playlist directory with their playlist position
pub fn cmd_sort(
    config: &Config,
    dir: &Path,
    playlist: Option<&Path>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let playlist_path = match playlist {
        Some(path) => path.to_path_buf(),
        None => find_playlist_document(dir).with_context(|| {
            format!("No playlist document found in {:?}, pass one with --playlist", dir)
        })?,
    };
    let playlist = Playlist::load(&playlist_path)
        .with_context(|| format!("Failed to load playlist {:?}", playlist_path))?;

    let end_number = config
        .sort
        .end_number
        .unwrap_or(playlist.tracks.len() as u32);

    let mut options = SortOptions::from_config(config);
    options.dry_run = dry_run;

    println!(
        "Numbering {:?}: {} tracks, last number {}",
        dir,
        playlist.tracks.len(),
        end_number
    );
    if Ledger::exists(dir) {
        println!("Directory is already numbered, only new files will be numbered.");
    }
    if dry_run {
        println!("\n[DRY RUN MODE - No files will be renamed]\n");
    }

    let report = organizer::sort(dir, &playlist.tracks, end_number, &options)?;
    if !report.applied() {
        println!("Nothing to number: every audio file is already numbered.");
        return Ok(());
    }

    let verb = if dry_run { "WOULD RENAME" } else { "RENAMED" };
    for (from, to) in report.renamed.iter().chain(report.lyrics.iter()) {
        println!("{}: {} -> {}", verb, from, to);
    }
    if !report.unmatched.is_empty() {
        println!("\nNo file found for:");
        for track in &report.unmatched {
            println!("  {}", track.full_title());
        }
    }

    println!(
        "\nCompleted: {} renamed, {} not found, {} errors",
        report.renamed.len(),
        report.unmatched.len(),
        report.failed
    );
    if let Some(error) = &report.ledger_error {
        anyhow::bail!("Files were renamed but the ledger could not be saved: {}", error);
    }
    Ok(())
}

/// Remove the prefixes added by `sort`
pub fn cmd_unsort(config: &Config, dir: &Path) -> anyhow::Result<()> {
    let report = organizer::unsort(dir, &UnsortOptions::from_config(config))?;

    for (from, to) in &report.restored {
        println!("RESTORED: {} -> {}", from, to);
    }

    if report.cleared() {
        println!(
            "\nCompleted: {} restored, {} missing, {} errors",
            report.restored.len(),
            report.missing,
            report.failed
        );
    } else if report.stale_removed {
        println!("None of the numbered files exist any more; removed the stale ledger.");
    } else if report.failed > 0 {
        anyhow::bail!("{} files could not be restored", report.failed);
    } else {
        println!("Nothing to clear: {:?} is not numbered.", dir);
    }
    Ok(())
}

/// `<dir>/<dir name>.json`, then the copied `infor.json`
fn find_playlist_document(dir: &Path) -> Option<PathBuf> {
    let named = dir
        .file_name()
        .map(|name| dir.join(format!("{}.json", name.to_string_lossy())));

    named
        .into_iter()
        .chain(std::iter::once(dir.join(PLAYLIST_COPY)))
        .find(|path| path.is_file())
}
