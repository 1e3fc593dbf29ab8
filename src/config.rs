use serde::Deserialize;
use std::path::PathBuf;
use crate::error::{SiteError, Result};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Where the CSV dataset comes from.
    pub source: SourceConfig,
    /// Persisted storage configuration.
    pub storage: StorageConfig,
    /// HTTP API configuration (optional).
    #[serde(default)]
    pub api: ApiConfig,
}

/// HTTP API configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Whether `serve` starts the HTTP API.
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,
    /// Port to listen on.
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Directory served as a fallback next to the API (e.g. the table page).
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { enabled: default_api_enabled(), port: default_api_port(), static_dir: None }
    }
}

fn default_api_enabled() -> bool { true }
fn default_api_port() -> u16 { 8080 }

/// The delimited-text dataset used to seed the store.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Path of the CSV file. The first line is a header.
    pub path: PathBuf,
}

/// Key-value storage parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding one file per storage key.
    pub dir: PathBuf,
    /// Key under which the whole record collection is stored.
    #[serde(default = "default_storage_key")]
    pub key: String,
}

fn default_storage_key() -> String { "websites".into() }

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SiteError::Config(format!("Cannot read config file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| SiteError::Config(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.storage.key.is_empty() {
            return Err(SiteError::Config("storage.key must not be empty".into()));
        }
        // The key doubles as a file name.
        if !self
            .storage
            .key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(SiteError::Config(format!(
                "storage.key '{}' may only contain letters, digits, '_' and '-'",
                self.storage.key
            )));
        }
        if self.api.port == 0 {
            return Err(SiteError::Config("api.port must be > 0".into()));
        }
        Ok(())
    }
}
