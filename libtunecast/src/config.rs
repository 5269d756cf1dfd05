//! Configuration management for Tunecast

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub socket: SocketConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token sent with every request, if present
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    pub kv_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Messages loaded when a conversation opens
    #[serde(default = "default_message_page_size")]
    pub message_page_size: u32,
    #[serde(default = "default_notification_limit")]
    pub notification_limit: u32,
    /// Per-subscriber buffer of the signal bus
    #[serde(default = "default_signal_capacity")]
    pub signal_capacity: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_message_page_size() -> u32 {
    15
}

fn default_notification_limit() -> u32 {
    999
}

fn default_signal_capacity() -> usize {
    100
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.local/share/tunecast".to_string(),
            kv_path: "~/.local/share/tunecast/kv.db".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            message_page_size: default_message_page_size(),
            notification_limit: default_notification_limit(),
            signal_capacity: default_signal_capacity(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:3000/v1".to_string(),
                token: None,
                timeout_secs: default_timeout_secs(),
            },
            socket: SocketConfig {
                url: "ws://localhost:3000".to_string(),
            },
            storage: StorageConfig::default(),
            sync: SyncConfig::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("api.base_url".to_string()).into());
        }
        if self.socket.url.trim().is_empty() {
            return Err(ConfigError::MissingField("socket.url".to_string()).into());
        }
        for (field, value) in [
            ("sync.message_page_size", self.sync.message_page_size as usize),
            ("sync.notification_limit", self.sync.notification_limit as usize),
            ("sync.signal_capacity", self.sync.signal_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be at least 1".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Data directory with `~` expanded
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.data_dir).to_string())
    }

    /// Key-value database path with `~` expanded
    pub fn kv_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.kv_path).to_string())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TUNECAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("tunecast").join("config.toml"))
}

/// Resolve the data directory path following XDG Base Directory spec
pub fn resolve_data_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("tunecast"))
}
