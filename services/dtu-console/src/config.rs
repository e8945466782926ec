//! Configuration types for the DTU console

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub locale: LocaleConfig,
}

/// Where the DTU is reachable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Where the session and locale preference are persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// First-run locale selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Language tag used instead of the host environment's, e.g. `de-AT`
    #[serde(default)]
    pub preferred: Option<String>,
}

fn default_base_url() -> String {
    "http://192.168.4.1".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("dtu-console.json")
}

impl Config {
    pub fn validate(&self) -> crate::Result<()> {
        let url = reqwest::Url::parse(&self.device.base_url).map_err(|e| {
            crate::ConsoleError::Config(format!(
                "Invalid device base_url '{}': {}",
                self.device.base_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(crate::ConsoleError::Config(format!(
                "Device base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::ConsoleError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
