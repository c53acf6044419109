//! Configuration management for Menagerie CLI
//!
//! Stores the backend URL, default alias and replica location in
//! ~/.config/menagerie/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use menagerie_sync::SyncConfig;

const CONFIG_DIR: &str = "menagerie";
const CONFIG_FILE: &str = "config.toml";
const REPLICA_FILE: &str = "replica.json";

/// CLI Configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Overrides the built-in backend URL; `MENAGERIE_BACKEND_URL` still wins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_path: Option<PathBuf>,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(CONFIG_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        toml::from_str(&content).with_context(|| "Failed to parse config file")
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {:?}", dir))?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Where the local graph replica is persisted between runs
    pub fn replica_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.replica_path {
            return Ok(path.clone());
        }
        let dir = dirs::data_dir()
            .context("Could not determine data directory")?
            .join(CONFIG_DIR);
        Ok(dir.join(REPLICA_FILE))
    }

    /// Sync settings: environment first, then this file, then defaults
    pub fn sync_config(&self) -> Result<SyncConfig> {
        let mut sync = SyncConfig::from_env()?;
        if std::env::var("MENAGERIE_BACKEND_URL").is_err() {
            if let Some(url) = &self.backend_url {
                sync = sync.with_backend_url(url.clone());
            }
        }
        Ok(sync)
    }

    /// Alias from the command line, falling back to the default
    pub fn alias(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.default_alias.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_alias_wins() {
        let config = Config {
            default_alias: Some("alice".to_string()),
            ..Default::default()
        };
        assert_eq!(config.alias(Some("bob")).as_deref(), Some("bob"));
        assert_eq!(config.alias(None).as_deref(), Some("alice"));
    }

    #[test]
    fn test_toml_round_trip_skips_unset() {
        let config = Config {
            backend_url: Some("http://agents.local".to_string()),
            ..Default::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(!text.contains("default_alias"));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.backend_url.as_deref(), Some("http://agents.local"));
    }

    #[test]
    fn test_explicit_replica_path() {
        let config = Config {
            replica_path: Some(PathBuf::from("/tmp/replica.json")),
            ..Default::default()
        };
        assert_eq!(config.replica_path().unwrap(), PathBuf::from("/tmp/replica.json"));
    }
}
