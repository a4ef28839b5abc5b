//! Command-line interface for playlist-minder.
//!
//! This module provides the commands for collecting, decoding and numbering
//! playlist directories.

mod commands;

pub use commands::{Cli, Commands, run_command};
