//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\playlist-minder\config.toml
//! - macOS: ~/Library/Application Support/playlist-minder/config.toml
//! - Linux: ~/.config/playlist-minder/config.toml
//!
//! Loading is layered: built-in defaults, then the config file, then
//! [`ConfigOverrides`] collected from the command line and environment.
//! The resulting [`Config`] is passed explicitly into every operation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where local music lives and where playlists are assembled
    pub library: LibraryConfig,

    /// Track-to-file matching settings
    pub matching: MatchingConfig,

    /// Audio format classification
    pub formats: FormatsConfig,

    /// External decoder settings
    pub decoder: DecoderConfig,

    /// Numbering defaults
    pub sort: SortConfig,
}

/// Library locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Root of the local music collection searched by `collect`
    pub music_dir: PathBuf,

    /// Parent directory holding one sub-directory per playlist
    pub playlist_root: PathBuf,

    /// Whether to descend into sub-directories of `music_dir`
    pub recursive: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            music_dir: dirs::audio_dir().unwrap_or_else(|| PathBuf::from("music")),
            playlist_root: PathBuf::from("Myplaylist"),
            recursive: true,
        }
    }
}

/// Matching settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Use normalized (punctuation/case-insensitive) substring matching
    pub fuzzy: bool,

    /// Minimum similarity (0.0 - 1.0) accepted by ranked matching
    pub threshold: f64,

    /// File extensions considered by `collect`, without the dot
    pub extensions: Vec<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy: false,
            threshold: crate::matcher::DEFAULT_THRESHOLD,
            extensions: FormatsConfig::default().audio_extensions(),
        }
    }
}

/// Which extensions are playable and which still need decoding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatsConfig {
    /// Decoded formats, in order of preference when names collide
    pub decoded: Vec<String>,

    /// Formats that must go through the decoder first
    pub encrypted: Vec<String>,

    /// Extension of lyric sidecar files
    pub lyrics: String,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            decoded: ["flac", "mp3", "wav", "ogg", "m4a"]
                .into_iter()
                .map(String::from)
                .collect(),
            encrypted: vec!["ncm".to_string()],
            lyrics: "lrc".to_string(),
        }
    }
}

impl FormatsConfig {
    /// Check whether an extension (any case, no dot) is an encrypted format
    pub fn is_encrypted(&self, ext: &str) -> bool {
        self.encrypted.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Check whether an extension (any case, no dot) is a decoded format
    pub fn is_decoded(&self, ext: &str) -> bool {
        self.decoded.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Preference rank of an extension: decoded formats in listed order,
    /// then encrypted formats, then anything else.
    pub fn rank(&self, ext: &str) -> usize {
        self.decoded
            .iter()
            .chain(self.encrypted.iter())
            .position(|e| e.eq_ignore_ascii_case(ext))
            .unwrap_or(usize::MAX)
    }

    /// Every audio extension known to the tool (decoded, then encrypted)
    pub fn audio_extensions(&self) -> Vec<String> {
        self.decoded
            .iter()
            .chain(self.encrypted.iter())
            .cloned()
            .collect()
    }
}

/// Decoder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Decoder executable (name on PATH or absolute path)
    pub program: PathBuf,

    /// Delete the encrypted source after a confirmed successful decode
    pub delete_source: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ncmdump"),
            delete_source: true,
        }
    }
}

/// Numbering defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    /// Number given to the last track of the playlist.
    /// Unset means the track count, so numbering starts at 1.
    pub end_number: Option<u32>,
}

/// Values supplied on the command line or through the environment.
///
/// `None` leaves the file/default value untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub music_dir: Option<PathBuf>,
    pub playlist_root: Option<PathBuf>,
    pub recursive: Option<bool>,
    pub fuzzy: Option<bool>,
    pub threshold: Option<f64>,
    pub decoder_program: Option<PathBuf>,
    pub delete_source: Option<bool>,
    pub end_number: Option<u32>,
}

impl Config {
    /// Apply the last configuration layer.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(dir) = overrides.music_dir {
            self.library.music_dir = dir;
        }
        if let Some(root) = overrides.playlist_root {
            self.library.playlist_root = root;
        }
        if let Some(recursive) = overrides.recursive {
            self.library.recursive = recursive;
        }
        if let Some(fuzzy) = overrides.fuzzy {
            self.matching.fuzzy = fuzzy;
        }
        if let Some(threshold) = overrides.threshold {
            self.matching.threshold = threshold;
        }
        if let Some(program) = overrides.decoder_program {
            self.decoder.program = program;
        }
        if let Some(delete) = overrides.delete_source {
            self.decoder.delete_source = delete;
        }
        if let Some(end) = overrides.end_number {
            self.sort.end_number = Some(end);
        }
    }

    /// Reject values no operation can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.matching.threshold) {
            return Err(ConfigError::Invalid(format!(
                "matching.threshold must be between 0 and 1, got {}",
                self.matching.threshold
            )));
        }
        if self.matching.extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "matching.extensions must not be empty".to_string(),
            ));
        }
        if self.formats.decoded.is_empty() {
            return Err(ConfigError::Invalid(
                "formats.decoded must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("playlist-minder"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from an explicit file, failing on any problem
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let config =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

/// Save configuration to the default location
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    let path = dir.join("config.toml");
    save_to(config, &path)?;
    Ok(path)
}

/// Save configuration to an explicit file
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        crate::error::Error::config(e.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
