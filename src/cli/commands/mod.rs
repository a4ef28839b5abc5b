//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `collect`: Find a playlist's tracks locally and copy them
//! - `decode`: Decode encrypted files
//! - `sort`: Number and un-number playlist directories
//! - `config`: Show or create the config file

mod collect;
mod config;
mod decode;
mod sort;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigOverrides};

pub use collect::cmd_collect;
pub use config::cmd_config;
pub use decode::cmd_decode;
pub use sort::{cmd_sort, cmd_unsort};

/// Playlist Minder CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Find a playlist's tracks in the music directory and copy them into
    /// the playlist's own directory
    Collect {
        /// Exported playlist document (JSON)
        playlist: PathBuf,
        /// Music directory to search (or set PLAYLIST_MINDER_MUSIC_DIR env var)
        #[arg(short, long, env = "PLAYLIST_MINDER_MUSIC_DIR")]
        music_dir: Option<PathBuf>,
        /// Target directory (default: <playlist_root>/<playlist name>)
        #[arg(short, long)]
        target: Option<PathBuf>,
        /// Ignore case and punctuation when matching
        #[arg(long)]
        fuzzy: bool,
        /// Only search the top level of the music directory
        #[arg(long)]
        no_recursive: bool,
        /// Dry run - show matches without copying anything
        #[arg(long)]
        dry_run: bool,
        /// Decode encrypted files in the target directory afterwards
        #[arg(long)]
        decode: bool,
        /// Decoder executable (or set PLAYLIST_MINDER_DECODER env var)
        #[arg(long, env = "PLAYLIST_MINDER_DECODER")]
        decoder: Option<PathBuf>,
    },
    /// Decode an encrypted file, or every encrypted file in a directory
    Decode {
        /// File or directory to decode
        path: PathBuf,
        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep encrypted sources after a successful decode
        #[arg(long)]
        keep_source: bool,
        /// Recurse into sub-directories
        #[arg(short, long)]
        recursive: bool,
        /// Decoder executable (or set PLAYLIST_MINDER_DECODER env var)
        #[arg(long, env = "PLAYLIST_MINDER_DECODER")]
        decoder: Option<PathBuf>,
    },
    /// Prefix the files of a playlist directory with their playlist position
    Sort {
        /// Playlist directory
        dir: PathBuf,
        /// Playlist document (default: <dir>/<dir name>.json, then <dir>/infor.json)
        #[arg(short, long)]
        playlist: Option<PathBuf>,
        /// Number of the last track (default: the number of tracks)
        #[arg(short, long)]
        end_number: Option<u32>,
        /// Minimum similarity between track and filename (0.0-1.0)
        #[arg(long)]
        threshold: Option<f64>,
        /// Dry run - show what would be renamed
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove the prefixes added by `sort`
    Unsort {
        /// Playlist directory
        dir: PathBuf,
    },
    /// Show the effective configuration
    Config {
        /// Only print the config file location
        #[arg(long)]
        path: bool,
        /// Write the default configuration if no file exists yet
        #[arg(long)]
        init: bool,
    },
}

/// Run the specified CLI command.
///
/// Returns `Ok(true)` if a command was run, `Ok(false)` if no command was
/// specified (meaning help should be shown).
pub fn run_command(cli: &Cli) -> anyhow::Result<bool> {
    match &cli.command {
        Some(Commands::Collect {
            playlist,
            music_dir,
            target,
            fuzzy,
            no_recursive,
            dry_run,
            decode,
            decoder,
        }) => {
            let config = load_config(
                cli.config.as_deref(),
                ConfigOverrides {
                    music_dir: music_dir.clone(),
                    fuzzy: fuzzy.then_some(true),
                    recursive: no_recursive.then_some(false),
                    decoder_program: decoder.clone(),
                    ..Default::default()
                },
            )?;
            cmd_collect(&config, playlist, target.as_deref(), *dry_run, *decode)?;
            Ok(true)
        }
        Some(Commands::Decode {
            path,
            output,
            keep_source,
            recursive,
            decoder,
        }) => {
            let config = load_config(
                cli.config.as_deref(),
                ConfigOverrides {
                    decoder_program: decoder.clone(),
                    delete_source: keep_source.then_some(false),
                    ..Default::default()
                },
            )?;
            cmd_decode(&config, path, output.as_deref(), *recursive)?;
            Ok(true)
        }
        Some(Commands::Sort {
            dir,
            playlist,
            end_number,
            threshold,
            dry_run,
        }) => {
            let config = load_config(
                cli.config.as_deref(),
                ConfigOverrides {
                    threshold: *threshold,
                    end_number: *end_number,
                    ..Default::default()
                },
            )?;
            cmd_sort(&config, dir, playlist.as_deref(), *dry_run)?;
            Ok(true)
        }
        Some(Commands::Unsort { dir }) => {
            let config = load_config(cli.config.as_deref(), ConfigOverrides::default())?;
            cmd_unsort(&config, dir)?;
            Ok(true)
        }
        Some(Commands::Config { path, init }) => {
            cmd_config(cli.config.as_deref(), *path, *init)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Load the config file (strictly when one was named), then apply overrides.
pub(crate) fn load_config(path: Option<&Path>, overrides: ConfigOverrides) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => crate::config::load_from(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => crate::config::load(),
    };
    config.apply(overrides);
    config.validate()?;
    Ok(config)
}

/// Print installation instructions for the decoder
pub(crate) fn print_decoder_install_instructions(program: &Path) {
    eprintln!("Error: decoder {:?} not found.", program);
    eprintln!("Install an ncmdump-compatible tool and put it in PATH, or point to it with:");
    eprintln!("  --decoder <path>, PLAYLIST_MINDER_DECODER, or [decoder] program in the config file");
}
