//! Playlist collect command.

use anyhow::Context;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::decoder::{CommandDecoder, Decoder, decode_directory};
use crate::library::{self, CollectOptions};
use crate::model::Playlist;
use crate::organizer::sanitize_filename;

use super::print_decoder_install_instructions;

/// Name of the playlist document copied into every collected directory
pub const PLAYLIST_COPY: &str = "infor.json";

/// Find a playlist's tracks locally and copy them into its directory
pub fn cmd_collect(
    config: &Config,
    playlist_path: &Path,
    target: Option<&Path>,
    dry_run: bool,
    decode: bool,
) -> anyhow::Result<()> {
    let playlist = Playlist::load(playlist_path)
        .with_context(|| format!("Failed to load playlist {:?}", playlist_path))?;

    let target: PathBuf = match target {
        Some(dir) => dir.to_path_buf(),
        None => config
            .library
            .playlist_root
            .join(sanitize_filename(&playlist.name)),
    };

    println!("Playlist: {} ({} tracks)", playlist.name, playlist.tracks.len());
    println!("Searching: {:?}", config.library.music_dir);
    println!("Target: {:?}", target);
    if dry_run {
        println!("\n[DRY RUN MODE - No files will be copied]");
    }

    let mut options = CollectOptions::from_config(config, target.clone());
    options.dry_run = dry_run;
    let report = library::collect_playlist(&playlist, &options)?;

    println!(
        "\nFound {} of {} tracks ({:.1}%)",
        report.found,
        report.total,
        report.match_rate() * 100.0
    );
    if !report.not_found.is_empty() {
        println!("\nNot found:");
        for (i, track) in report.not_found.iter().enumerate() {
            println!("{}. {}", i + 1, track.label());
        }
    }

    if dry_run {
        return Ok(());
    }

    for (source, reason) in &report.skipped {
        println!("SKIPPED ({}): {:?}", reason, source);
    }
    println!(
        "\nCompleted: {} copied, {} skipped, {} errors",
        report.copied.len(),
        report.skipped.len(),
        report.failed
    );

    std::fs::create_dir_all(&target)
        .with_context(|| format!("Failed to create directory: {:?}", target))?;
    std::fs::copy(playlist_path, target.join(PLAYLIST_COPY))
        .with_context(|| format!("Failed to copy playlist document into {:?}", target))?;

    if decode {
        let decoder = CommandDecoder::from_config(&config.decoder);
        if !decoder.is_available() {
            print_decoder_install_instructions(decoder.program());
            anyhow::bail!("decoder not available");
        }
        let summary = decode_directory(
            &decoder,
            &target,
            None,
            false,
            config.decoder.delete_source,
            &config.formats.encrypted,
        )?;
        println!(
            "Decoded {} of {} files ({} failed, {} sources deleted)",
            summary.succeeded, summary.total, summary.failed, summary.deleted
        );
    }

    Ok(())
}
