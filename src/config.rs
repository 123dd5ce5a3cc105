//! Application configuration management.
//!
//! Loads and saves the client configuration: the backend base URL and an
//! optional override for where credentials are stored.
//!
//! Configuration lives at `~/.config/wheeldrop/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/storage directory paths
const APP_NAME: &str = "wheeldrop";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default backend base URL
const DEFAULT_API_BASE_URL: &str = "https://api.wheeldrop.app";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    /// Where the credential store keeps the token pair; platform data
    /// directory when unset.
    pub storage_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            storage_dir: None,
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

    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.storage_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find user data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
