use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::app::Result;
use crate::catalog::{
    BookSummary, CatalogApi, Page, PaginationMeta, RatingEntry, RatingQuery, SearchQuery,
};
use crate::search::pagination::{self, PageSummary, PaginationWindow};

/// A paginated, filterable catalog listing.
#[async_trait]
pub trait Listing: Send + Sync {
    type Filters: Clone + Default + fmt::Debug + Send + Sync;
    type Item: Clone + Send + Sync;

    /// Plural noun for user-facing messages, e.g. "books".
    fn noun(&self) -> &'static str;

    async fn fetch(
        &self,
        filters: &Self::Filters,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Self::Item>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilters {
    pub search: String,
    pub category: String,
    pub author: String,
}

impl BookFilters {
    pub fn new(
        search: impl Into<String>,
        category: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            search: search.into(),
            category: category.into(),
            author: author.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingFilters {
    pub book_id: String,
    pub user_id: String,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

pub struct BookListing {
    catalog: Arc<dyn CatalogApi + Send + Sync>,
}

impl BookListing {
    pub fn new(catalog: Arc<dyn CatalogApi + Send + Sync>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Listing for BookListing {
    type Filters = BookFilters;
    type Item = BookSummary;

    fn noun(&self) -> &'static str {
        "books"
    }

    async fn fetch(&self, filters: &BookFilters, page: u32, per_page: u32) -> Result<Page<BookSummary>> {
        let mut query = SearchQuery::new(page, per_page);
        query.search = filters.search.clone();
        query.category = filters.category.clone();
        query.author = filters.author.clone();
        self.catalog.fetch_books(&query).await
    }
}

pub struct RatingListing {
    catalog: Arc<dyn CatalogApi + Send + Sync>,
}

impl RatingListing {
    pub fn new(catalog: Arc<dyn CatalogApi + Send + Sync>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Listing for RatingListing {
    type Filters = RatingFilters;
    type Item = RatingEntry;

    fn noun(&self) -> &'static str {
        "ratings"
    }

    async fn fetch(&self, filters: &RatingFilters, page: u32, per_page: u32) -> Result<Page<RatingEntry>> {
        let mut query = RatingQuery::new(page, per_page);
        query.book_id = filters.book_id.clone();
        query.user_id = filters.user_id.clone();
        query.min_score = filters.min_score;
        query.max_score = filters.max_score;
        self.catalog.fetch_ratings(&query).await
    }
}

/// A failed request, shown to the user with a retry affordance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchError {
    pub message: String,
    pub detail: String,
    pub retryable: bool,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// What happened to the response of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results and pagination were replaced.
    Applied,
    /// The request failed; previous results were kept and an error recorded.
    Failed,
    /// A newer request was issued meanwhile; the response was dropped.
    Stale,
}

/// Point-in-time copy of a session's state.
#[derive(Debug, Clone)]
pub struct SearchSnapshot<F, T> {
    pub filters: F,
    pub per_page: u32,
    pub requested_page: u32,
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
    pub error: Option<SearchError>,
    pub loading: bool,
}

impl<F, T> SearchSnapshot<F, T> {
    pub fn window(&self, max_visible: u32) -> Option<PaginationWindow> {
        pagination::window(self.pagination.page, self.pagination.pages, max_visible)
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary::from_meta(&self.pagination)
    }
}

/// Categories and authors present in a page of books, sorted and de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub authors: Vec<String>,
}

impl FilterOptions {
    pub fn from_books(books: &[BookSummary]) -> Self {
        let mut categories = BTreeSet::new();
        let mut authors = BTreeSet::new();
        for book in books {
            categories.extend(book.categories.iter().filter(|c| !c.is_empty()).cloned());
            authors.extend(book.authors.iter().filter(|a| !a.is_empty()).cloned());
        }
        Self {
            categories: categories.into_iter().collect(),
            authors: authors.into_iter().collect(),
        }
    }
}

struct State<F, T> {
    filters: F,
    per_page: u32,
    requested_page: u32,
    items: Vec<T>,
    pagination: PaginationMeta,
    error: Option<SearchError>,
    /// Token of the most recently issued request.
    latest: u64,
}

/// Search, filter and pagination state for one user session.
///
/// Every request is tagged with a monotonically increasing token. Only the
/// response to the most recently issued request is applied; responses to
/// earlier requests are discarded whenever they arrive, so overlapping calls
/// settle on the state of the last call made.
pub struct SearchSession<L: Listing> {
    listing: L,
    state: Mutex<State<L::Filters, L::Item>>,
    in_flight: AtomicUsize,
}

/// Counts a request as in flight until dropped, including when the caller
/// abandons the request future.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub type BookSearch = SearchSession<BookListing>;
pub type RatingSearch = SearchSession<RatingListing>;

impl<L: Listing> SearchSession<L> {
    pub fn new(listing: L, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        Self {
            listing,
            state: Mutex::new(State {
                filters: L::Filters::default(),
                per_page,
                requested_page: 1,
                items: Vec::new(),
                pagination: PaginationMeta::empty(1, per_page),
                error: None,
                latest: 0,
            }),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Replace the filters and load the first page.
    pub async fn search(&self, filters: L::Filters) -> SearchOutcome {
        self.issue(1, Some(filters), None).await
    }

    /// Replace the filters and load `page` directly.
    pub async fn search_at(&self, filters: L::Filters, page: u32) -> SearchOutcome {
        self.issue(page, Some(filters), None).await
    }

    /// Clear every filter and load the first page.
    pub async fn reset(&self) -> SearchOutcome {
        self.issue(1, Some(L::Filters::default()), None).await
    }

    /// Load `page` with the current filters. No bounds are applied here.
    pub async fn go_to_page(&self, page: u32) -> SearchOutcome {
        self.issue(page, None, None).await
    }

    /// Re-issue the last requested page.
    pub async fn retry(&self) -> SearchOutcome {
        let page = self.state.lock().await.requested_page;
        self.issue(page, None, None).await
    }

    /// Change the page size and reload the first page with the current filters.
    pub async fn set_page_size(&self, per_page: u32) -> SearchOutcome {
        self.issue(1, None, Some(per_page.max(1))).await
    }

    pub async fn snapshot(&self) -> SearchSnapshot<L::Filters, L::Item> {
        let state = self.state.lock().await;
        SearchSnapshot {
            filters: state.filters.clone(),
            per_page: state.per_page,
            requested_page: state.requested_page,
            items: state.items.clone(),
            pagination: state.pagination,
            error: state.error.clone(),
            loading: self.in_flight.load(Ordering::SeqCst) > 0,
        }
    }

    async fn issue(
        &self,
        page: u32,
        filters: Option<L::Filters>,
        per_page: Option<u32>,
    ) -> SearchOutcome {
        let _in_flight = InFlight::start(&self.in_flight);
        let (token, filters, per_page) = {
            let mut state = self.state.lock().await;
            if let Some(filters) = filters {
                state.filters = filters;
            }
            if let Some(per_page) = per_page {
                state.per_page = per_page;
            }
            state.latest += 1;
            state.requested_page = page;
            state.error = None;
            (state.latest, state.filters.clone(), state.per_page)
        };

        tracing::debug!(
            "Request #{} for {} page {} ({} per page) with {:?}",
            token,
            self.listing.noun(),
            page,
            per_page,
            filters
        );

        let result = self.listing.fetch(&filters, page, per_page).await;

        let mut state = self.state.lock().await;

        if token != state.latest {
            tracing::debug!(
                "Discarding response #{} for {}; #{} is newer",
                token,
                self.listing.noun(),
                state.latest
            );
            return SearchOutcome::Stale;
        }

        match result {
            Ok(page) => {
                state.items = page.items;
                state.pagination = page.pagination;
                state.error = None;
                SearchOutcome::Applied
            }
            Err(e) => {
                tracing::error!("Error loading {}: {}", self.listing.noun(), e);
                state.error = Some(SearchError {
                    message: format!("Failed to load {}. Please try again.", self.listing.noun()),
                    detail: e.to_string(),
                    retryable: true,
                });
                SearchOutcome::Failed
            }
        }
    }
}

impl SearchSession<BookListing> {
    pub fn for_books(catalog: Arc<dyn CatalogApi + Send + Sync>, per_page: u32) -> Self {
        Self::new(BookListing::new(catalog), per_page)
    }

    /// Convenience for `search(BookFilters::new(term, category, author))`.
    pub async fn search_books(&self, term: &str, category: &str, author: &str) -> SearchOutcome {
        self.search(BookFilters::new(term, category, author)).await
    }

    pub async fn filter_options(&self) -> FilterOptions {
        FilterOptions::from_books(&self.state.lock().await.items)
    }
}

impl SearchSession<RatingListing> {
    pub fn for_ratings(catalog: Arc<dyn CatalogApi + Send + Sync>, per_page: u32) -> Self {
        Self::new(RatingListing::new(catalog), per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FolioError;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// Catalog double that records queries and answers with a page of
    /// `per_page` books, optionally delayed or failing per page number.
    #[derive(Default)]
    struct MockCatalog {
        queries: StdMutex<Vec<SearchQuery>>,
        delays: HashMap<u32, Duration>,
        failing: StdMutex<bool>,
        failing_pages: HashSet<u32>,
        total_pages: u32,
    }

    impl MockCatalog {
        fn with_pages(total_pages: u32) -> Self {
            Self {
                total_pages,
                ..Default::default()
            }
        }

        fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }

        fn last_query(&self) -> SearchQuery {
            self.queries.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl CatalogApi for MockCatalog {
        async fn fetch_books(&self, query: &SearchQuery) -> Result<Page<BookSummary>> {
            self.queries.lock().unwrap().push(query.clone());
            if let Some(delay) = self.delays.get(&query.page) {
                tokio::time::sleep(*delay).await;
            }
            if *self.failing.lock().unwrap() || self.failing_pages.contains(&query.page) {
                return Err(FolioError::CatalogStatus {
                    status: 503,
                    url: "http://catalog.test/books/".into(),
                });
            }

            let items = (0..query.per_page)
                .map(|i| BookSummary {
                    title: Some(format!("Book {}-{}", query.page, i)),
                    authors: vec![format!("Author {}", i % 2)],
                    categories: vec!["Fiction".into()],
                    ..Default::default()
                })
                .collect();
            Ok(Page {
                items,
                pagination: PaginationMeta {
                    page: query.page,
                    per_page: query.per_page,
                    pages: self.total_pages,
                    total: u64::from(self.total_pages) * u64::from(query.per_page),
                },
            })
        }

        async fn fetch_ratings(&self, query: &RatingQuery) -> Result<Page<RatingEntry>> {
            Ok(Page::empty(query.page, query.per_page))
        }
    }

    fn session(catalog: Arc<MockCatalog>, per_page: u32) -> BookSearch {
        SearchSession::for_books(catalog, per_page)
    }

    #[tokio::test]
    async fn test_search_resets_to_first_page() {
        let catalog = Arc::new(MockCatalog::with_pages(10));
        let search = session(catalog.clone(), 5);

        assert_eq!(search.go_to_page(4).await, SearchOutcome::Applied);
        assert_eq!(search.search_books("dune", "", "").await, SearchOutcome::Applied);

        let query = catalog.last_query();
        assert_eq!(query.page, 1);
        assert_eq!(query.search, "dune");

        let snapshot = search.snapshot().await;
        assert_eq!(snapshot.pagination.page, 1);
        assert_eq!(snapshot.items.len(), 5);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_empty_filters_send_only_paging() {
        let catalog = Arc::new(MockCatalog::with_pages(3));
        let search = session(catalog.clone(), 10);

        search.search_books("", "", "").await;

        let keys: Vec<_> = catalog
            .last_query()
            .query_pairs()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["page", "per_page"]);
    }

    #[tokio::test]
    async fn test_go_to_page_keeps_filters() {
        let catalog = Arc::new(MockCatalog::with_pages(10));
        let search = session(catalog.clone(), 10);

        search.search_books("", "History", "Tolstoy").await;
        search.go_to_page(7).await;

        let query = catalog.last_query();
        assert_eq!(query.page, 7);
        assert_eq!(query.category, "History");
        assert_eq!(query.author, "Tolstoy");
    }

    #[tokio::test]
    async fn test_search_at_opens_requested_page() {
        let catalog = Arc::new(MockCatalog::with_pages(10));
        let search = session(catalog.clone(), 10);

        search.search_at(BookFilters::new("", "Poetry", ""), 6).await;

        let query = catalog.last_query();
        assert_eq!((query.page, query.category.as_str()), (6, "Poetry"));
        assert_eq!(search.snapshot().await.requested_page, 6);
    }

    #[tokio::test]
    async fn test_reset_clears_filters() {
        let catalog = Arc::new(MockCatalog::with_pages(10));
        let search = session(catalog.clone(), 10);

        search.search_books("war", "History", "Tolstoy").await;
        search.go_to_page(3).await;
        search.reset().await;

        let query = catalog.last_query();
        assert_eq!(query.page, 1);
        assert!(query.search.is_empty() && query.category.is_empty() && query.author.is_empty());
        assert_eq!(search.snapshot().await.filters, BookFilters::default());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_results() {
        let catalog = Arc::new(MockCatalog::with_pages(10));
        let search = session(catalog.clone(), 4);

        search.go_to_page(2).await;
        catalog.set_failing(true);
        assert_eq!(search.go_to_page(3).await, SearchOutcome::Failed);

        let snapshot = search.snapshot().await;
        assert_eq!(snapshot.pagination.page, 2);
        assert_eq!(snapshot.items.len(), 4);
        let error = snapshot.error.unwrap();
        assert!(error.retryable);
        assert_eq!(error.message, "Failed to load books. Please try again.");

        catalog.set_failing(false);
        assert_eq!(search.retry().await, SearchOutcome::Applied);
        let snapshot = search.snapshot().await;
        assert_eq!(snapshot.pagination.page, 3);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_overlapping_requests_slow_first() {
        let mut catalog = MockCatalog::with_pages(10);
        catalog.delays.insert(2, Duration::from_millis(80));
        let search = session(Arc::new(catalog), 10);

        let (first, second) = tokio::join!(search.go_to_page(2), search.go_to_page(5));
        assert_eq!(first, SearchOutcome::Stale);
        assert_eq!(second, SearchOutcome::Applied);
        assert_eq!(search.snapshot().await.pagination.page, 5);
    }

    #[tokio::test]
    async fn test_overlapping_requests_slow_second() {
        let mut catalog = MockCatalog::with_pages(10);
        catalog.delays.insert(2, Duration::from_millis(10));
        catalog.delays.insert(5, Duration::from_millis(80));
        let search = session(Arc::new(catalog), 10);

        let (first, second) = tokio::join!(search.go_to_page(2), search.go_to_page(5));
        assert_eq!(first, SearchOutcome::Stale);
        assert_eq!(second, SearchOutcome::Applied);
        assert_eq!(search.snapshot().await.pagination.page, 5);
    }

    #[tokio::test]
    async fn test_stale_failure_is_discarded() {
        let mut catalog = MockCatalog::with_pages(10);
        catalog.delays.insert(2, Duration::from_millis(80));
        catalog.failing_pages.insert(2);
        let search = session(Arc::new(catalog), 3);

        let (first, second) = tokio::join!(search.go_to_page(2), search.go_to_page(5));
        assert_eq!(first, SearchOutcome::Stale);
        assert_eq!(second, SearchOutcome::Applied);

        let snapshot = search.snapshot().await;
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.pagination.page, 5);
        assert!(snapshot
            .items
            .iter()
            .all(|book| book.display_title().starts_with("Book 5-")));
    }

    #[tokio::test]
    async fn test_abandoned_request_does_not_stay_loading() {
        let mut catalog = MockCatalog::with_pages(10);
        catalog.delays.insert(2, Duration::from_millis(200));
        let search = session(Arc::new(catalog), 10);

        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), search.go_to_page(2)).await;
        assert!(abandoned.is_err());

        assert_eq!(search.go_to_page(3).await, SearchOutcome::Applied);
        let snapshot = search.snapshot().await;
        assert!(!snapshot.loading);
        assert_eq!(snapshot.pagination.page, 3);
    }

    #[tokio::test]
    async fn test_new_request_clears_previous_error() {
        let mut catalog = MockCatalog::with_pages(10);
        catalog.delays.insert(4, Duration::from_millis(80));
        let catalog = Arc::new(catalog);
        let search = session(catalog.clone(), 10);

        catalog.set_failing(true);
        assert_eq!(search.go_to_page(3).await, SearchOutcome::Failed);
        catalog.set_failing(false);

        let (outcome, during) = tokio::join!(search.go_to_page(4), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            search.snapshot().await
        });
        assert!(during.loading);
        assert!(during.error.is_none());
        assert_eq!(outcome, SearchOutcome::Applied);
        assert!(!search.snapshot().await.loading);
    }

    #[tokio::test]
    async fn test_set_page_size_reloads_first_page() {
        let catalog = Arc::new(MockCatalog::with_pages(10));
        let search = session(catalog.clone(), 10);

        search.go_to_page(4).await;
        search.set_page_size(25).await;

        let query = catalog.last_query();
        assert_eq!((query.page, query.per_page), (1, 25));
        assert_eq!(search.snapshot().await.per_page, 25);
    }

    #[tokio::test]
    async fn test_filter_options_and_window() {
        let catalog = Arc::new(MockCatalog::with_pages(10));
        let search = session(catalog, 3);

        search.go_to_page(10).await;

        let options = search.filter_options().await;
        assert_eq!(options.categories, vec!["Fiction"]);
        assert_eq!(options.authors, vec!["Author 0", "Author 1"]);

        let window = search.snapshot().await.window(5).unwrap();
        assert_eq!(window.pages, vec![6, 7, 8, 9, 10]);
    }

    #[tokio::test]
    async fn test_rating_session() {
        let catalog = Arc::new(MockCatalog::with_pages(1));
        let ratings = SearchSession::for_ratings(catalog, 10);

        let filters = RatingFilters {
            min_score: Some(4.0),
            ..Default::default()
        };
        assert_eq!(ratings.search(filters.clone()).await, SearchOutcome::Applied);

        let snapshot = ratings.snapshot().await;
        assert_eq!(snapshot.filters, filters);
        assert!(snapshot.items.is_empty());
        assert!(snapshot.window(5).is_none());
    }
}
