use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::sync::RwLock;
use url::Url;

use crate::app::{FolioError, Result};
use crate::settings::resolver::{resolve, AppConfiguration, ResolveEnv};
use crate::settings::source::ConfigSource;

/// Path of the configuration endpoint served by [`crate::server`].
pub const CONFIG_ENDPOINT: &str = "/api/config";

#[derive(Debug, Clone)]
struct Loaded {
    config: Arc<AppConfiguration>,
    loaded_at: DateTime<Utc>,
}

/// Shared, replace-only holder of the current [`AppConfiguration`].
///
/// Readers get an `Arc` to a complete configuration; a refresh swaps the
/// whole value, never individual fields.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Loaded>>,
}

impl ConfigHandle {
    pub fn new(config: AppConfiguration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Loaded {
                config: Arc::new(config),
                loaded_at: Utc::now(),
            })),
        }
    }

    /// Load and resolve from `source`, falling back to built-in settings.
    pub async fn from_source(source: &dyn ConfigSource, env: &ResolveEnv) -> Self {
        let raw = source.load().await;
        Self::new(resolve(&raw, env))
    }

    pub async fn current(&self) -> Arc<AppConfiguration> {
        self.inner.read().await.config.clone()
    }

    pub async fn loaded_at(&self) -> DateTime<Utc> {
        self.inner.read().await.loaded_at
    }

    pub async fn replace(&self, config: AppConfiguration) -> Arc<AppConfiguration> {
        let config = Arc::new(config);
        let mut guard = self.inner.write().await;
        *guard = Loaded {
            config: config.clone(),
            loaded_at: Utc::now(),
        };
        config
    }

    /// Re-read the backing store and replace the configuration.
    pub async fn reload(&self, source: &dyn ConfigSource, env: &ResolveEnv) -> Arc<AppConfiguration> {
        let raw = source.load().await;
        self.replace(resolve(&raw, env)).await
    }

    /// Fetch the configuration from a running server and replace the current
    /// one. On failure the current configuration is kept.
    pub async fn refresh(&self, client: &ConfigClient) -> Result<Arc<AppConfiguration>> {
        match client.fetch().await {
            Ok(config) => {
                let config = self.replace(config).await;
                tracing::info!(
                    "Configuration refreshed: theme={} page_size={}",
                    config.ui.theme,
                    config.ui.page_size
                );
                Ok(config)
            }
            Err(e) => {
                tracing::error!("Failed to refresh configuration: {}", e);
                Err(e)
            }
        }
    }
}

/// Client for the configuration endpoint.
pub struct ConfigClient {
    client: Client,
    endpoint: Url,
}

impl ConfigClient {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(server_url)?.join(CONFIG_ENDPOINT)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn fetch(&self) -> Result<AppConfiguration> {
        let response = self.client.get(self.endpoint.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FolioError::Config(format!(
                "{} returned {}",
                self.endpoint, status
            )));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::document::RawConfigDocument;
    use crate::settings::source::FileConfigSource;
    use serde_json::json;

    #[tokio::test]
    async fn test_replace_swaps_whole_configuration() {
        let handle = ConfigHandle::new(AppConfiguration::default());
        let before = handle.current().await;
        let first_loaded = handle.loaded_at().await;

        let raw = RawConfigDocument::new(json!({ "Settings": { "ColorScheme": "Red" } }));
        handle.replace(resolve(&raw, &ResolveEnv::default())).await;

        let after = handle.current().await;
        assert_eq!(before.ui.theme, "blue");
        assert_eq!(after.ui.theme, "red");
        assert!(!after.features.enable_ratings);
        assert!(handle.loaded_at().await >= first_loaded);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_current() {
        let handle = ConfigHandle::new(AppConfiguration::default());
        let client = ConfigClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();

        assert!(handle.refresh(&client).await.is_err());
        assert_eq!(*handle.current().await, AppConfiguration::default());
    }

    #[tokio::test]
    async fn test_reload_from_missing_file_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileConfigSource::new(dir.path().join("missing.json"));

        let handle = ConfigHandle::from_source(&source, &ResolveEnv::default()).await;
        let config = handle.current().await;
        assert_eq!(config.ui.page_size, 10);
        assert!(config.features.enable_ratings);
    }

    #[test]
    fn test_client_endpoint() {
        let client = ConfigClient::new("http://localhost:3000", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint().as_str(), "http://localhost:3000/api/config");
    }
}
