//! Application configuration management.
//!
//! The configuration names the remote database and the failed-fetch cooldown
//! policy. It is stored at `~/.config/schoolwatch/config.json`; environment
//! variables override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sync::FailedFetchPolicy;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "schoolwatch";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Overrides `database_url`
pub const DATABASE_URL_ENV: &str = "SCHOOLWATCH_DATABASE_URL";

/// Database auth token; wins over the keychain
pub const AUTH_TOKEN_ENV: &str = "SCHOOLWATCH_AUTH_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub database_url: Option<String>,
    #[serde(default)]
    pub failed_fetch_policy: FailedFetchPolicy,
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.database_url = Some(url);
            }
        }
    }

    /// Auth token from the environment, if set
    pub fn env_auth_token() -> Option<String> {
        std::env::var(AUTH_TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
