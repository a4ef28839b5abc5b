//! Playlist Minder - keeps local copies of online playlists in order.
//!
//! Finds the tracks of an exported playlist in a local music collection,
//! copies them into a per-playlist directory, decodes encrypted files and
//! prefixes every file with its playlist position (reversibly).

pub mod cli;
pub mod config;
pub mod decoder;
pub mod error;
pub mod library;
pub mod matcher;
pub mod model;
pub mod organizer;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log targets used across the crate, enabled at `info` by default
const LOG_TARGETS: &[&str] = &[
    "playlist_minder",
    "scanner",
    "matcher",
    "library",
    "organizer",
    "decoder",
];

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    let mut filter = EnvFilter::from_default_env();
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{}=info", target).parse()?);
    }
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    // Try to run a CLI command
    if cli::run_command(&args)? {
        return Ok(());
    }

    // No command specified
    cli::Cli::command().print_help()?;
    println!();
    Ok(())
}
