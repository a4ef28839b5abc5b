//! Application-wide error types.
//!
//! Library modules return [`Result`] with the [`Error`] enum below, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level error enum
//! - Per-file failures are caught by the batch drivers and turned into
//!   report counts; only directory-level failures and missing inputs escape
//! - "No match" and "copy skipped" are not errors at all, see
//!   [`crate::library::CopyOutcome`] and the reports in [`crate::organizer`]
//!
//! # Example
//!
//! ```ignore
//! use playlist_minder::error::{Error, Result};
//!
//! fn process_dir(path: &Path) -> Result<()> {
//!     let files = scanner::scan(path, false, &exts)?; // Scan errors auto-convert
//!     std::fs::rename(&a, &b)?;                       // IO errors auto-convert
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use crate::decoder::DecodeError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Per-file I/O error (copy, rename, delete)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A directory could not be read
    #[error("Cannot scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rename ledger could not be read or written
    #[error("Ledger error at {path}: {message}")]
    Ledger { path: PathBuf, message: String },

    /// Malformed playlist document
    #[error("Playlist error: {0}")]
    Playlist(String),

    /// An operation that needs tracks got none
    #[error("Playlist has no tracks")]
    EmptyPlaylist,

    /// The end number cannot hold every track with a positive prefix
    #[error("End number {end_number} is too small for {track_count} tracks")]
    InvalidEndNumber { end_number: u32, track_count: usize },

    /// Decoding collaborator failure
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File not found
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a scan error.
    pub fn scan(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Scan {
            path: path.into(),
            source,
        }
    }

    /// Create a ledger error.
    pub fn ledger(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Ledger {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a playlist error.
    pub fn playlist(message: impl Into<String>) -> Self {
        Self::Playlist(message.into())
    }

    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}
