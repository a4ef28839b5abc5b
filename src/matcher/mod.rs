//! Track-to-file matching.
//!
//! Two different strategies live here and give different guarantees:
//!
//! - [`substring_match`] is a filter: it returns every candidate whose
//!   filename contains the track title and an artist, either literally
//!   ([`MatchMode::Exact`]) or after [`normalize`] ([`MatchMode::Fuzzy`]).
//!   Used to find a track somewhere in a music collection.
//! - [`rank_match`] is a selector: it scores every candidate against one
//!   key with a 0..1 similarity ratio and picks the single best one at or
//!   above a threshold. Used by the organizer, where filenames are close to
//!   the track's full title but not equal to it.
//!
//! Finding nothing is a normal outcome in both cases.

use std::path::{Path, PathBuf};

use crate::model::Track;

/// Minimum similarity accepted by [`rank_match`] unless configured otherwise
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// How [`substring_match`] compares strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Literal, case-sensitive substrings
    #[default]
    Exact,
    /// Substrings after [`normalize`]
    Fuzzy,
}

impl MatchMode {
    pub fn from_fuzzy(fuzzy: bool) -> Self {
        if fuzzy { Self::Fuzzy } else { Self::Exact }
    }
}

/// Normalize a string for fuzzy comparison: drop punctuation, lowercase,
/// collapse runs of whitespace into one space and trim.
///
/// Letters, digits and `_` of any script are kept.
pub fn normalize(s: &str) -> String {
    let kept: String = s
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Check one filename against a track.
///
/// The title must be a substring of the filename, and so must at least one
/// artist name (in exact mode the joined artist string also counts). An empty
/// title never matches; a track without any artist is matched on its title
/// alone.
pub fn is_substring_match(track: &Track, file_name: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Exact => {
            if track.title.is_empty() || !file_name.contains(&track.title) {
                return false;
            }
            let mut artists = track
                .artist_names
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(track.artist_joined.as_str()))
                .filter(|a| !a.is_empty())
                .peekable();
            if artists.peek().is_none() {
                return true;
            }
            artists.any(|a| file_name.contains(a))
        }
        MatchMode::Fuzzy => {
            let title = normalize(&track.title);
            let file = normalize(file_name);
            if title.is_empty() || !file.contains(&title) {
                return false;
            }
            let artists: Vec<String> = track
                .artist_names
                .iter()
                .map(|a| normalize(a))
                .filter(|a| !a.is_empty())
                .collect();
            artists.is_empty() || artists.iter().any(|a| file.contains(a.as_str()))
        }
    }
}

/// Every candidate whose filename matches the track, in candidate order.
pub fn substring_match(track: &Track, candidates: &[PathBuf], mode: MatchMode) -> Vec<PathBuf> {
    let matches: Vec<PathBuf> = candidates
        .iter()
        .filter(|path| {
            file_name_of(path).is_some_and(|name| is_substring_match(track, name, mode))
        })
        .cloned()
        .collect();

    tracing::trace!(
        target: "matcher",
        track = %track.label(),
        ?mode,
        matches = matches.len(),
        "Substring match"
    );
    matches
}

fn file_name_of(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// The winner of [`rank_match`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedMatch<'a> {
    pub candidate: &'a str,
    /// Similarity in 0.0..=1.0
    pub score: f64,
}

/// Similarity ratio between two strings, 1.0 meaning identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Select the candidate most similar to `key`.
///
/// Only candidates scoring at least `threshold` are eligible. Equal scores
/// keep the candidate encountered first.
pub fn rank_match<'a, I>(key: &str, candidates: I, threshold: f64) -> Option<RankedMatch<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<RankedMatch<'a>> = None;

    for candidate in candidates {
        let score = similarity(key, candidate);
        if score < threshold {
            continue;
        }
        match &best {
            Some(current) if score <= current.score => {}
            _ => best = Some(RankedMatch { candidate, score }),
        }
    }

    if let Some(found) = &best {
        tracing::trace!(
            target: "matcher",
            key,
            candidate = found.candidate,
            score = found.score,
            "Ranked match"
        );
    }
    best
}
