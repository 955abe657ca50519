//! Search, filter and pagination state driving catalog queries.

pub mod pagination;
pub mod session;

pub use pagination::{window, PageSummary, PaginationWindow, DEFAULT_MAX_VISIBLE};
pub use session::{
    BookFilters, BookListing, BookSearch, FilterOptions, Listing, RatingFilters, RatingListing,
    RatingSearch, SearchError, SearchOutcome, SearchSession, SearchSnapshot,
};
