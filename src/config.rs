//! Configuration management for PopMovies
//!
//! Handles config file loading/saving and API key lookup.
//! Config is stored at ~/.config/popmovies/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::tmdb::DEFAULT_BASE_URL;

/// Environment variable overriding the API key
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

/// Environment variable overriding the API base URL
pub const API_BASE_ENV: &str = "POPMOVIES_API_BASE";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// TMDB API read access token
    pub tmdb_api_key: Option<String>,
    /// Override for the TMDB API base URL
    pub api_base_url: Option<String>,
    /// HTTP timeout per request
    pub request_timeout_secs: Option<u64>,
    /// Default tracing filter when RUST_LOG is unset ("warn", "popmovies=debug")
    pub log_level: Option<String>,
}

impl Config {
    /// Get config file path (~/.config/popmovies/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("popmovies").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Load config from an explicit path. Unlike `load`, a missing or
    /// malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load from `path` if given, otherwise from the default location
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Ok(Self::load()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Get TMDB API key with fallback chain:
    /// 1. Environment variable TMDB_API_KEY
    /// 2. Key from config file
    pub fn tmdb_api_key(&self) -> Result<String> {
        if let Some(key) = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()) {
            return Ok(key);
        }

        self.tmdb_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No TMDB API key. Set {} or add tmdb_api_key to {}",
                    API_KEY_ENV,
                    Self::path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "config.toml".into())
                )
            })
    }

    /// API base URL: environment, then config, then TMDB
    pub fn api_base_url(&self) -> String {
        std::env::var(API_BASE_ENV)
            .ok()
            .filter(|u| !u.is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.tmdb_api_key.is_none());
        assert_eq!(config.request_timeout_secs(), 30);
        assert_eq!(config.log_level(), "warn");
    }

    #[test]
    fn test_zero_timeout_falls_back() {
        let config = Config {
            request_timeout_secs: Some(0),
            ..Config::default()
        };
        assert_eq!(config.request_timeout_secs(), 30);
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("popmovies").join("config.toml");

        let config = Config {
            tmdb_api_key: Some("abc123".into()),
            api_base_url: Some("http://localhost:8080".into()),
            request_timeout_secs: Some(5),
            log_level: Some("popmovies=debug".into()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str("tmdb_api_key = \"k\"\n").unwrap();
        assert_eq!(config.tmdb_api_key.as_deref(), Some("k"));
        assert!(config.api_base_url.is_none());
    }
}
