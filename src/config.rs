//! Application configuration management.
//!
//! Configuration is stored at `~/.config/matchcache/config.json`; the
//! database lands under the platform data directory unless overridden by
//! the `MATCHCACHE_DB` environment variable.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "matchcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Database file name
const DATABASE_FILE: &str = "profiles.db";

/// Profiles requested per page
const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub page_size: i64,
    pub database_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            database_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Where the profile store lives. `MATCHCACHE_DB` wins over the config
    /// file, which wins over the platform default.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Ok(path) = std::env::var("MATCHCACHE_DB") {
            return Ok(PathBuf::from(path));
        }
        if let Some(ref path) = self.database_path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(DATABASE_FILE))
    }
}
