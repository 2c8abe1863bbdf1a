//! Application configuration management.
//!
//! Configuration is stored at `~/.config/etiquetas/config.json` and covers
//! the webhook base URL and an optional cache directory override. The
//! branch table itself is static (see [`crate::branch`]) and never
//! persisted.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "etiquetas";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default base URL of the n8n webhooks.
pub const DEFAULT_WEBHOOK_BASE: &str = "https://n8n.sveletrica.com/webhook";

/// Environment variable that overrides the webhook base (takes precedence
/// over the config file; handy for pointing a kiosk at a staging n8n).
pub const WEBHOOK_BASE_ENV: &str = "ETIQUETAS_WEBHOOK_BASE";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub webhook_base: Option<String>,
    pub cache_dir: Option<PathBuf>,
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

    /// Resolve the webhook base: environment variable, then config file,
    /// then the built-in default.
    pub fn resolve_webhook_base(&self) -> String {
        std::env::var(WEBHOOK_BASE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.webhook_base.clone())
            .unwrap_or_else(|| DEFAULT_WEBHOOK_BASE.to_string())
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
