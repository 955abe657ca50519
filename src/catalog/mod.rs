pub mod http_client;
pub mod query;
pub mod types;

use async_trait::async_trait;

use crate::app::Result;

pub use http_client::{HttpCatalogClient, DEFAULT_CATALOG_URL};
pub use query::{RatingQuery, SearchQuery};
pub use types::{BookSummary, Page, PaginationMeta, RatingEntry};

/// Read access to the remote book catalog.
#[async_trait]
pub trait CatalogApi {
    async fn fetch_books(&self, query: &SearchQuery) -> Result<Page<BookSummary>>;

    async fn fetch_ratings(&self, query: &RatingQuery) -> Result<Page<RatingEntry>>;
}
