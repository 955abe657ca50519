use std::sync::Arc;

use crate::app::error::Result;
use crate::catalog::{CatalogApi, HttpCatalogClient};
use crate::config::ServiceConfig;
use crate::search::{BookSearch, RatingSearch};
use crate::settings::{
    AppConfiguration, ConfigHandle, ConfigSource, FileConfigSource, HttpConfigSource, ResolveEnv,
};

pub struct AppContext {
    pub service: ServiceConfig,
    pub source: Arc<dyn ConfigSource>,
    pub env: ResolveEnv,
    pub config: ConfigHandle,
    pub catalog: Arc<dyn CatalogApi + Send + Sync>,
}

impl AppContext {
    /// Wire the context from service configuration and the process
    /// environment, loading the settings document once.
    pub async fn new(service: ServiceConfig) -> Result<Self> {
        let env = Self::resolve_env(&service);
        let location = service.server.settings_path.to_string_lossy().into_owned();
        let source = Self::settings_source(&location, &service);
        let catalog: Arc<dyn CatalogApi + Send + Sync> = Arc::new(HttpCatalogClient::new(
            &service.catalog.base_url,
            service.catalog.timeout(),
        )?);
        let config = ConfigHandle::from_source(source.as_ref(), &env).await;

        Ok(Self {
            service,
            source,
            env,
            config,
            catalog,
        })
    }

    /// `http://` and `https://` locations are fetched, anything else is a file.
    pub fn settings_source(location: &str, service: &ServiceConfig) -> Arc<dyn ConfigSource> {
        if location.starts_with("http://") || location.starts_with("https://") {
            Arc::new(HttpConfigSource::new(location, service.catalog.timeout()))
        } else {
            Arc::new(FileConfigSource::new(location))
        }
    }

    pub async fn configuration(&self) -> Arc<AppConfiguration> {
        self.config.current().await
    }

    /// A book search session sized from the current `ui.pageSize`.
    pub async fn book_search(&self) -> BookSearch {
        let per_page = self.configuration().await.ui.page_size;
        self.book_search_sized(per_page)
    }

    pub fn book_search_sized(&self, per_page: u32) -> BookSearch {
        BookSearch::for_books(self.catalog.clone(), per_page)
    }

    pub async fn rating_search(&self) -> RatingSearch {
        let per_page = self.configuration().await.ui.page_size;
        self.rating_search_sized(per_page)
    }

    pub fn rating_search_sized(&self, per_page: u32) -> RatingSearch {
        RatingSearch::for_ratings(self.catalog.clone(), per_page)
    }

    fn resolve_env(service: &ServiceConfig) -> ResolveEnv {
        let mut env = ResolveEnv::from_env();
        if env.api_base_url.is_none() {
            env.api_base_url = service.api.base_url.clone().filter(|v| !v.is_empty());
        }
        env
    }
}
