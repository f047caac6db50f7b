//! Configuration loading.
//!
//! Reads `config.toml` from the workboard home directory (or an explicit
//! path). A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const HOME_DIR_NAME: &str = ".workboard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where snapshots are stored. Defaults to the workboard home directory.
    pub data_dir: Option<PathBuf>,
    /// Quiet period before a search edit is applied.
    pub search_debounce_ms: u64,
    /// How long before a task's due date its reminder fires.
    pub reminder_lead_minutes: i64,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: None,
            search_debounce_ms: 300,
            reminder_lead_minutes: 60,
            log: None,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => home_dir().join("config.toml"),
        };
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read { path: path.clone(), source })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Snapshot directory, with `override_dir` taking precedence.
    pub fn data_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.data_dir.clone())
            .unwrap_or_else(home_dir)
    }
}

/// `~/.workboard`, or `./.workboard` when no home directory is known.
pub fn home_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().join(HOME_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(HOME_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.search_debounce_ms, 300);
    }

    #[test]
    fn test_partial_file() {
        let config = Config::parse("reminder_lead_minutes = 15\nlog = \"workboard=debug\"\n").unwrap();
        assert_eq!(config.reminder_lead_minutes, 15);
        assert_eq!(config.search_debounce_ms, 300);
        assert_eq!(config.log.as_deref(), Some("workboard=debug"));
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "search_debounce_ms = \"soon\"").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config { data_dir: Some(PathBuf::from("/srv/wb")), ..Config::default() };
        assert_eq!(config.data_dir(None), PathBuf::from("/srv/wb"));
        assert_eq!(config.data_dir(Some(Path::new("/tmp/x"))), PathBuf::from("/tmp/x"));
    }
}
