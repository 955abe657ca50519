//! # Folio
//!
//! Configuration resolution and paginated catalog search for a book-browsing
//! front end.
//!
//! ## Architecture
//!
//! ```text
//! settings.json → ConfigSource → resolve() → AppConfiguration → GET /api/config
//!                                                   │
//!                                   ui.pageSize ────┘
//!                                        │
//! SearchSession → CatalogApi → catalog REST API → Page + PaginationWindow
//! ```
//!
//! - [`settings`]: reads the untrusted settings document and resolves it into a
//!   fully defaulted configuration
//! - [`server`]: serves the resolved configuration over HTTP
//! - [`catalog`]: typed client for the books and ratings listings
//! - [`search`]: search/filter/page state and the pagination window
//!
//! ## Quick Start
//!
//! ```bash
//! # Serve the configuration endpoint
//! folio serve --settings ./settings.json
//!
//! # Print the resolved configuration
//! folio config
//!
//! # Search the catalog
//! folio books --search dune --page 2
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the settings
/// source, the resolved configuration and the catalog client.
pub mod app;

/// Catalog REST client.
///
/// - [`CatalogApi`](catalog::CatalogApi): async trait for listing books and ratings
/// - [`HttpCatalogClient`](catalog::HttpCatalogClient): reqwest-based implementation
pub mod catalog;

/// Command-line interface using clap.
///
/// - `serve` - Serve the configuration endpoint
/// - `config` - Print the resolved configuration
/// - `refresh --url <server>` - Fetch the configuration from a running server
/// - `books` / `ratings` - Query the catalog
pub mod cli;

/// Service configuration.
///
/// Loads from `~/.config/folio/config.toml`.
pub mod config;

pub mod search;

/// HTTP server for `GET /api/config`, built with axum.
pub mod server;

pub mod settings;
