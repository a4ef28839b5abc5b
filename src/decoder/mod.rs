//! Decoding of encrypted audio files.
//!
//! The decryption itself is done by an external `ncmdump`-compatible tool;
//! this module only runs it and keeps track of the results. Anything that
//! implements [`Decoder`] can stand in for it.
//!
//! The tool is invoked as `<program> <input> -o <output_dir>` and a zero exit
//! status counts as success. Install it separately and put it in `PATH`, or
//! set `[decoder] program` in the config file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::scanner;

/// Failure of a single decode
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Decoder '{0}' not found")]
    NotAvailable(String),

    #[error("Failed to run decoder: {0}")]
    Launch(#[source] io::Error),

    #[error("Decoding {path} failed: {message}")]
    Failed { path: PathBuf, message: String },
}

/// Turns one encrypted file into a playable one
pub trait Decoder {
    /// Decode `input`, writing the result into `output_dir`.
    fn decode(&self, input: &Path, output_dir: &Path) -> std::result::Result<(), DecodeError>;

    /// Check whether the decoder can be used at all
    fn is_available(&self) -> bool {
        true
    }

    /// Name for logs and errors
    fn name(&self) -> String {
        "decoder".to_string()
    }
}

/// [`Decoder`] backed by an external executable
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    program: PathBuf,
}

impl CommandDecoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &DecoderConfig) -> Self {
        Self::new(&config.program)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Decoder for CommandDecoder {
    fn decode(&self, input: &Path, output_dir: &Path) -> std::result::Result<(), DecodeError> {
        let output = Command::new(&self.program)
            .arg(input)
            .arg("-o")
            .arg(output_dir)
            .output()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    DecodeError::NotAvailable(self.name())
                } else {
                    DecodeError::Launch(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => output.status.to_string(),
                text => text.to_string(),
            };
            return Err(DecodeError::Failed {
                path: input.to_path_buf(),
                message,
            });
        }
        Ok(())
    }

    /// Probe by launching the program; its exit status does not matter.
    fn is_available(&self) -> bool {
        Command::new(&self.program).arg("-h").output().is_ok()
    }

    fn name(&self) -> String {
        self.program.display().to_string()
    }
}

/// Counts of a [`decode_directory`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sources removed after a successful decode
    pub deleted: usize,
}

/// Decode one file, optionally deleting it once the decode succeeded.
///
/// Without an `output_dir` the result lands next to the input.
/// Returns whether the source was deleted.
pub fn decode_file(
    decoder: &dyn Decoder,
    input: &Path,
    output_dir: Option<&Path>,
    delete_source: bool,
) -> Result<bool> {
    let out = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    fs::create_dir_all(&out)?;

    decoder.decode(input, &out)?;
    tracing::info!(target: "decoder", input = %input.display(), output = %out.display(), "Decoded");

    if !delete_source {
        return Ok(false);
    }
    match fs::remove_file(input) {
        Ok(()) => Ok(true),
        Err(e) => {
            tracing::warn!(target: "decoder", path = %input.display(), error = %e, "Could not delete source");
            Ok(false)
        }
    }
}

/// Decode every file with one of `extensions` in `input_dir`.
///
/// With `recursive` and an `output_dir`, each file's sub-directory below
/// `input_dir` is recreated below `output_dir`. Failures are counted and
/// not retried. A source is only deleted after its own decode succeeded.
pub fn decode_directory(
    decoder: &dyn Decoder,
    input_dir: &Path,
    output_dir: Option<&Path>,
    recursive: bool,
    delete_source: bool,
    extensions: &[String],
) -> Result<DecodeSummary> {
    if !decoder.is_available() {
        return Err(Error::Decode(DecodeError::NotAvailable(decoder.name())));
    }

    let files = scanner::scan(input_dir, recursive, extensions)?;
    let mut summary = DecodeSummary {
        total: files.len(),
        ..Default::default()
    };
    tracing::info!(
        target: "decoder",
        dir = %input_dir.display(),
        files = files.len(),
        recursive,
        "Decoding directory"
    );

    for file in &files {
        let target = output_dir.map(|out| mirrored_dir(input_dir, file, out));
        match decode_file(decoder, file, target.as_deref(), delete_source) {
            Ok(deleted) => {
                summary.succeeded += 1;
                if deleted {
                    summary.deleted += 1;
                }
            }
            Err(e) => {
                tracing::warn!(target: "decoder", file = %file.display(), error = %e, "Decode failed");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        target: "decoder",
        succeeded = summary.succeeded,
        failed = summary.failed,
        deleted = summary.deleted,
        "Decoding complete"
    );
    Ok(summary)
}

/// `output_dir` joined with the directory of `file` relative to `input_dir`
fn mirrored_dir(input_dir: &Path, file: &Path, output_dir: &Path) -> PathBuf {
    file.parent()
        .and_then(|parent| parent.strip_prefix(input_dir).ok())
        .map(|rel| output_dir.join(rel))
        .unwrap_or_else(|| output_dir.to_path_buf())
}
