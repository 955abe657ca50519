use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::app::{FolioError, Result};
use crate::catalog::{BookSummary, CatalogApi, Page, PaginationMeta, RatingEntry, RatingQuery, SearchQuery};

pub const DEFAULT_CATALOG_URL: &str = "http://localhost:5100";

pub struct HttpCatalogClient {
    client: Client,
    base_url: Url,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // Url::join drops the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn listing_url(&self, resource: &str, pairs: &[(&'static str, String)]) -> Result<Url> {
        let mut url = self.base_url.join(resource)?;
        url.query_pairs_mut()
            .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FolioError::CatalogStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn fetch_books(&self, query: &SearchQuery) -> Result<Page<BookSummary>> {
        let url = self.listing_url("books/", &query.query_pairs())?;
        let body = self.get_json(url).await?;
        Ok(decode_page(body, "books", query.page, query.per_page))
    }

    async fn fetch_ratings(&self, query: &RatingQuery) -> Result<Page<RatingEntry>> {
        let url = self.listing_url("ratings/", &query.query_pairs())?;
        let body = self.get_json(url).await?;
        Ok(decode_page(body, "ratings", query.page, query.per_page))
    }
}

/// Decode `{ <key>: [...], pagination: {...} }`.
///
/// A body missing either part, or with parts of the wrong shape, decodes to an
/// empty page at the requested position.
pub(crate) fn decode_page<T: DeserializeOwned>(
    mut body: Value,
    key: &str,
    page: u32,
    per_page: u32,
) -> Page<T> {
    let items = body
        .get_mut(key)
        .map(Value::take)
        .and_then(|v| serde_json::from_value::<Vec<T>>(v).ok());
    let pagination = body
        .get_mut("pagination")
        .map(Value::take)
        .and_then(|v| serde_json::from_value::<PaginationMeta>(v).ok());

    match (items, pagination) {
        (Some(items), Some(pagination)) => Page { items, pagination },
        _ => {
            tracing::warn!("Malformed {} response; treating as empty", key);
            Page::empty(page, per_page)
        }
    }
}
