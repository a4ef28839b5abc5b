//! Core data models for playlist reconciliation.
//!
//! Defines [`Track`] and [`Playlist`], loaded from the exported playlist
//! document. Both are immutable once loaded; track order is meaningful
//! because it defines the sequence numbers applied by the organizer.
//!
//! # Document format
//!
//! ```json
//! {
//!   "playlist_name": "Road Trip",
//!   "creator": "someone",
//!   "tracks": [
//!     { "name": "Song A", "artists": ["Artist"], "artist_str": "Artist",
//!       "album": "Album", "id": 1234 }
//!   ]
//! }
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::organizer::sanitize_filename;

/// A track of an online playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Track title as published
    pub title: String,
    /// Individual artist names, in credit order
    pub artist_names: Vec<String>,
    /// All artists as one display string
    pub artist_joined: String,
    /// Album title (optional)
    pub album: Option<String>,
    /// Identifier on the online service (optional)
    pub external_id: Option<String>,
    /// Precomputed file stem, when the document carries one
    full_title: Option<String>,
}

impl Track {
    /// Create a track, joining the artists with `", "`.
    pub fn new(title: impl Into<String>, artists: &[&str]) -> Self {
        let artist_names: Vec<String> = artists.iter().map(|a| a.to_string()).collect();
        Self {
            title: title.into(),
            artist_joined: artist_names.join(", "),
            artist_names,
            album: None,
            external_id: None,
            full_title: None,
        }
    }

    /// Filesystem-safe `"{title} - {artists}"` stem used as the ranked
    /// match key and for renamed sidecar files.
    pub fn full_title(&self) -> String {
        match &self.full_title {
            Some(full) if !full.is_empty() => sanitize_filename(full),
            _ => sanitize_filename(&format!("{} - {}", self.title, self.artist_joined)),
        }
    }

    /// Human readable label for logs and reports
    pub fn label(&self) -> String {
        if self.artist_joined.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.artist_joined)
        }
    }
}

/// An ordered playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub name: String,
    pub creator: String,
    pub tracks: Vec<Track>,
}

impl Playlist {
    /// Load a playlist document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_found(path)
            } else {
                Error::Io(e)
            }
        })?;
        let mut playlist = Self::from_json(&contents)?;
        if playlist.name.is_empty() {
            // Fall back to the document's file name
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                playlist.name = stem.to_string();
            }
        }
        tracing::debug!(
            path = %path.display(),
            tracks = playlist.tracks.len(),
            "Loaded playlist"
        );
        Ok(playlist)
    }

    /// Parse a playlist document.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawPlaylist = serde_json::from_str(json)
            .map_err(|e| Error::playlist(format!("invalid playlist document: {}", e)))?;
        let tracks = raw
            .tracks
            .ok_or_else(|| Error::playlist("document has no 'tracks' field"))?;

        Ok(Self {
            name: raw.playlist_name,
            creator: raw.creator,
            tracks: tracks.into_iter().map(Track::from).collect(),
        })
    }
}

#[derive(Deserialize)]
struct RawPlaylist {
    #[serde(default)]
    playlist_name: String,
    #[serde(default)]
    creator: String,
    tracks: Option<Vec<RawTrack>>,
}

#[derive(Deserialize)]
struct RawTrack {
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<String>,
    artist_str: Option<String>,
    album: Option<String>,
    id: Option<serde_json::Value>,
    full_title: Option<String>,
}

impl From<RawTrack> for Track {
    fn from(raw: RawTrack) -> Self {
        let artist_joined = raw
            .artist_str
            .unwrap_or_else(|| raw.artists.join(", "));
        let external_id = raw.id.and_then(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        Self {
            title: raw.name,
            artist_names: raw.artists,
            artist_joined,
            album: raw.album,
            external_id,
            full_title: raw.full_title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const DOC: &str = r#"{
        "playlist_name": "Road Trip",
        "creator": "someone",
        "track_count": 2,
        "tracks": [
            { "name": "Song A", "artists": ["Artist", "Guest"], "album": "First", "id": 1234 },
            { "name": "AC/DC?", "artists": ["Band"], "artist_str": "Band", "id": "abc" }
        ]
    }"#;

    #[test]
    fn test_parse_document() {
        let playlist = Playlist::from_json(DOC).unwrap();
        assert_eq!(playlist.name, "Road Trip");
        assert_eq!(playlist.creator, "someone");
        assert_eq!(playlist.tracks.len(), 2);

        let first = &playlist.tracks[0];
        assert_eq!(first.title, "Song A");
        assert_eq!(first.artist_joined, "Artist, Guest");
        assert_eq!(first.album.as_deref(), Some("First"));
        assert_eq!(first.external_id.as_deref(), Some("1234"));
        assert_eq!(playlist.tracks[1].external_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_full_title_is_sanitized() {
        let playlist = Playlist::from_json(DOC).unwrap();
        assert_eq!(playlist.tracks[0].full_title(), "Song A - Artist, Guest");
        assert_eq!(playlist.tracks[1].full_title(), "AC／DC？ - Band");
    }

    #[test]
    fn test_explicit_full_title_wins() {
        let doc = r#"{"tracks": [{"name": "x", "artists": ["y"], "full_title": "Custom: Stem"}]}"#;
        let playlist = Playlist::from_json(doc).unwrap();
        assert_eq!(playlist.tracks[0].full_title(), "Custom： Stem");
    }

    #[test]
    fn test_missing_tracks_is_rejected() {
        let err = Playlist::from_json(r#"{"playlist_name": "x"}"#).unwrap_err();
        assert!(matches!(err, Error::Playlist(_)));
    }

    #[test]
    fn test_load_falls_back_to_file_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Night Drive.json");
        std::fs::write(&path, r#"{"tracks": []}"#).unwrap();

        let playlist = Playlist::load(&path).unwrap();
        assert_eq!(playlist.name, "Night Drive");
        assert!(playlist.tracks.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = Playlist::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_label() {
        assert_eq!(Track::new("Solo", &[]).label(), "Solo");
        assert_eq!(Track::new("Duet", &["A", "B"]).label(), "Duet - A, B");
    }
}
