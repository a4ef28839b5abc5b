//! Playlist directory organization.
//!
//! Gives the files of a playlist directory sequential numeric prefixes that
//! follow playlist order, and takes them off again.
//!
//! # Features
//! - Full-width filename sanitizing that keeps titles readable
//! - Ranked matching of playlist tracks to files on disk
//! - Lyric sidecars renamed in step with their audio file
//! - A rename ledger so numbering can be undone across runs
//!
//! The state per directory is either "numbered" (ledger present) or
//! "not numbered" (no ledger). See [`ledger`] and [`sequence`].

pub mod ledger;
pub mod sequence;

use regex::Regex;
use std::sync::LazyLock;

pub use ledger::{LEDGER_FILE, Ledger};
pub use sequence::{SortOptions, SortReport, UnsortOptions, UnsortReport, sort, unsort};

/// One or more ASCII digits, a period, then a single whitespace character.
static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.\s").expect("valid prefix pattern"));

/// Sanitizes a filename by replacing characters reserved on Windows with
/// their full-width counterparts.
///
/// Unlike an underscore substitute, every reserved character maps to a
/// distinct look-alike, so `a/b` and `a_b` stay different names.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' => '／',
            '\\' => '＼',
            ':' => '：',
            '*' => '＊',
            '?' => '？',
            '"' => '＂',
            '<' => '＜',
            '>' => '＞',
            '|' => '｜',
            _ => c,
        })
        .collect()
}

/// Check whether a filename carries a sequence prefix such as `"12. "`.
pub fn has_number_prefix(name: &str) -> bool {
    NUMBER_PREFIX.is_match(name)
}

/// Remove a sequence prefix, leaving other names untouched.
pub fn strip_number_prefix(name: &str) -> &str {
    match NUMBER_PREFIX.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

/// Build a sequenced filename.
pub fn numbered_name(number: u32, name: &str) -> String {
    format!("{}. {}", number, name)
}
