//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\music-matcher\config.toml
//! - macOS: ~/Library/Application Support/music-matcher/config.toml
//! - Linux: ~/.config/music-matcher/config.toml
//!
//! Matching thresholds are deliberately absent: they are policy constants
//! in [`crate::identification`], not knobs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials
    pub credentials: Credentials,

    /// Import/identification policy
    pub import: ImportConfig,

    /// Catalog sources
    pub catalog: CatalogConfig,
}

/// API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// AcoustID API key for fingerprint lookups
    pub acoustid_api_key: Option<String>,
}

/// When acoustic fingerprinting may be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintingMode {
    Never,
    /// Only for files arriving with a new download
    #[default]
    NewFiles,
    AllFiles,
}

impl FingerprintingMode {
    /// Whether fingerprinting is allowed for a batch.
    pub fn allows(self, new_download: bool) -> bool {
        match self {
            Self::Never => false,
            Self::NewFiles => new_download,
            Self::AllFiles => true,
        }
    }
}

impl std::str::FromStr for FingerprintingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "never" => Ok(Self::Never),
            "new_files" => Ok(Self::NewFiles),
            "all_files" | "always" => Ok(Self::AllFiles),
            other => Err(format!("unknown fingerprinting mode: {}", other)),
        }
    }
}

/// Import/identification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub fingerprinting: FingerprintingMode,

    /// Pair candidates with files the library already holds for their album
    pub include_existing: bool,

    /// Search the remote catalog when the mirror has nothing
    pub add_new_artists: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            fingerprinting: FingerprintingMode::default(),
            include_existing: true,
            add_new_artists: true,
        }
    }
}

/// Catalog source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON snapshot of the local catalog mirror
    pub path: Option<PathBuf>,

    /// MusicBrainz web service root
    pub musicbrainz_url: String,

    /// Max releases to fetch per remote search
    pub remote_search_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            musicbrainz_url: "https://musicbrainz.org/ws/2".to_string(),
            remote_search_limit: 10,
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("music-matcher"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from an explicit path
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

/// Save configuration to the default location
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &dir.join("config.toml"))
}

/// Save configuration to an explicit path
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

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[credentials]"));
        assert!(toml.contains("[import]"));
        assert!(toml.contains("[catalog]"));
        assert!(toml.contains("fingerprinting = \"new_files\""));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[import]
fingerprinting = "all_files"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.import.fingerprinting, FingerprintingMode::AllFiles);
        assert!(config.import.include_existing);
        assert!(config.credentials.acoustid_api_key.is_none());
        assert_eq!(config.catalog.musicbrainz_url, "https://musicbrainz.org/ws/2");
        assert_eq!(config.catalog.remote_search_limit, 10);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.credentials.acoustid_api_key = Some("test-key-123".to_string());
        config.import.fingerprinting = FingerprintingMode::Never;
        config.catalog.path = Some(PathBuf::from("/data/catalog.json"));

        save_to(&config, &path).unwrap();
        let loaded = load_from(&path).unwrap();

        assert_eq!(loaded.credentials.acoustid_api_key.as_deref(), Some("test-key-123"));
        assert_eq!(loaded.import.fingerprinting, FingerprintingMode::Never);
        assert_eq!(loaded.catalog.path, Some(PathBuf::from("/data/catalog.json")));
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_load_from_invalid_toml_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[import\nfingerprinting = ").unwrap();

        assert!(matches!(load_from(&path), Err(ConfigError::Parse(..))));
    }

    #[test]
    fn test_fingerprinting_policy() {
        assert!(!FingerprintingMode::Never.allows(true));
        assert!(FingerprintingMode::NewFiles.allows(true));
        assert!(!FingerprintingMode::NewFiles.allows(false));
        assert!(FingerprintingMode::AllFiles.allows(false));
    }

    #[test]
    fn test_fingerprinting_mode_from_str() {
        assert_eq!("new-files".parse(), Ok(FingerprintingMode::NewFiles));
        assert_eq!("ALL_FILES".parse(), Ok(FingerprintingMode::AllFiles));
        assert!("sometimes".parse::<FingerprintingMode>().is_err());
    }
}
