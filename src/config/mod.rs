//! Service configuration for folio.
//!
//! Configuration is read from `~/.config/folio/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! This is distinct from the mounted `settings.json` that feeds
//! [`crate::settings`]: it only says where things are.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::DEFAULT_CATALOG_URL;
use crate::settings::source::DEFAULT_SETTINGS_PATH;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerSection,
    pub catalog: CatalogSection,
    pub api: ApiSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: SocketAddr,
    pub settings_path: PathBuf,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl CatalogSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// Advertised as `api.baseUrl`; `FOLIO_API_BASE_URL` takes precedence.
    pub base_url: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/folio/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("folio").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# folio service configuration

[server]
# Address the configuration endpoint listens on
bind_addr = "127.0.0.1:3000"

# Mounted settings document (theme, page size, feature flags).
# A missing or invalid file falls back to built-in settings.
settings_path = "/app/settings.json"

[catalog]
# Base URL of the books/ratings API
base_url = "http://localhost:5100"

# Request timeout in milliseconds
timeout_ms = 10000

[api]
# API base URL advertised to clients as api.baseUrl.
# FOLIO_API_BASE_URL overrides this.
# base_url = "http://localhost:5100/api"
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
