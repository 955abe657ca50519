use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::settings::document::RawConfigDocument;

pub const DEFAULT_SETTINGS_PATH: &str = "/app/settings.json";

/// Why a settings document could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadDiagnostic {
    #[error("Settings file not found at {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read settings file at {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings from {origin}: {source}")]
    Malformed {
        origin: String,
        source: serde_json::Error,
    },

    #[error("Failed to fetch settings from {url}: {source}")]
    Remote { url: String, source: reqwest::Error },

    #[error("Settings endpoint {url} returned {status}")]
    RemoteStatus { url: String, status: u16 },
}

/// A trusted backing store for the raw settings document.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Read and parse the document, reporting why that failed.
    async fn try_load(&self) -> Result<RawConfigDocument, ConfigLoadDiagnostic>;

    /// Where the document comes from, for log lines.
    fn describe(&self) -> String;

    /// Read the document, substituting [`RawConfigDocument::fallback`] on any
    /// failure. The failure is only logged.
    async fn load(&self) -> RawConfigDocument {
        match self.try_load().await {
            Ok(document) => {
                tracing::info!("Loaded settings from {}", self.describe());
                document
            }
            Err(diagnostic) => {
                tracing::warn!("{}; using built-in settings", diagnostic);
                RawConfigDocument::fallback()
            }
        }
    }
}

/// Settings read from a JSON file, typically a mounted `settings.json`.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigSource {
    fn default() -> Self {
        Self::new(DEFAULT_SETTINGS_PATH)
    }
}

#[async_trait]
impl ConfigSource for FileConfigSource {
    async fn try_load(&self) -> Result<RawConfigDocument, ConfigLoadDiagnostic> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigLoadDiagnostic::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(e) => {
                return Err(ConfigLoadDiagnostic::Unreadable {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        RawConfigDocument::from_json(&content).map_err(|e| ConfigLoadDiagnostic::Malformed {
            origin: self.path.display().to_string(),
            source: e,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Settings served as JSON by a remote endpoint.
pub struct HttpConfigSource {
    client: Client,
    url: String,
}

impl HttpConfigSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ConfigSource for HttpConfigSource {
    async fn try_load(&self) -> Result<RawConfigDocument, ConfigLoadDiagnostic> {
        let remote = |source: reqwest::Error| ConfigLoadDiagnostic::Remote {
            url: self.url.clone(),
            source,
        };

        let response = self.client.get(&self.url).send().await.map_err(remote)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigLoadDiagnostic::RemoteStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(remote)?;
        RawConfigDocument::from_json(&body).map_err(|e| ConfigLoadDiagnostic::Malformed {
            origin: self.url.clone(),
            source: e,
        })
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
