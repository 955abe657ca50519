use std::net::SocketAddr;

use crate::app::{AppContext, FolioError, Result};
use crate::catalog::{BookSummary, RatingEntry};
use crate::search::{
    BookFilters, RatingFilters, SearchOutcome, SearchSnapshot, DEFAULT_MAX_VISIBLE,
};
use crate::server::{Server, ServerState};
use crate::settings::ConfigClient;

pub async fn serve(ctx: &AppContext, bind: Option<SocketAddr>) -> Result<()> {
    let addr = bind.unwrap_or(ctx.service.server.bind_addr);
    let state = ServerState::new(ctx.source.clone(), ctx.env.clone(), ctx.config.clone());
    let server = Server::bind(addr, state).await?;
    println!("Listening on http://{}", server.local_addr()?);
    server.run().await
}

pub async fn show_config(ctx: &AppContext) -> Result<()> {
    let config = ctx.configuration().await;
    println!("{}", serde_json::to_string_pretty(config.as_ref())?);
    Ok(())
}

pub async fn refresh_config(ctx: &AppContext, url: &str) -> Result<()> {
    let client = ConfigClient::new(url, ctx.service.catalog.timeout())?;
    let config = ctx.config.refresh(&client).await?;

    println!(
        "Refreshed from {} at {}",
        client.endpoint(),
        ctx.config.loaded_at().await.to_rfc3339()
    );
    println!("Theme: {}", config.ui.theme);
    println!(
        "Page size: {} (max {})",
        config.ui.page_size, config.ui.max_page_size
    );
    for (id, enabled) in config.feature_flags.iter() {
        println!("  {:<24} {}", id, if enabled { "on" } else { "off" });
    }
    Ok(())
}

pub async fn list_books(
    ctx: &AppContext,
    filters: BookFilters,
    page: u32,
    per_page: Option<u32>,
) -> Result<()> {
    let session = match per_page {
        Some(per_page) => ctx.book_search_sized(per_page),
        None => ctx.book_search().await,
    };
    let outcome = session.search_at(filters, page).await;
    let snapshot = session.snapshot().await;
    check_outcome(outcome, &snapshot)?;

    if snapshot.items.is_empty() {
        println!("No books found");
    }
    for book in &snapshot.items {
        print_book(book);
    }

    let options = session.filter_options().await;
    if !options.categories.is_empty() {
        println!();
        println!("Categories: {}", options.categories.join(", "));
    }

    print_footer(&snapshot);
    Ok(())
}

pub async fn list_ratings(
    ctx: &AppContext,
    filters: RatingFilters,
    page: u32,
    per_page: Option<u32>,
) -> Result<()> {
    let session = match per_page {
        Some(per_page) => ctx.rating_search_sized(per_page),
        None => ctx.rating_search().await,
    };
    let outcome = session.search_at(filters, page).await;
    let snapshot = session.snapshot().await;
    check_outcome(outcome, &snapshot)?;

    if snapshot.items.is_empty() {
        println!("No ratings found");
    }
    for rating in &snapshot.items {
        print_rating(rating);
    }

    print_footer(&snapshot);
    Ok(())
}

fn check_outcome<F, T>(outcome: SearchOutcome, snapshot: &SearchSnapshot<F, T>) -> Result<()> {
    match (outcome, &snapshot.error) {
        (SearchOutcome::Failed, Some(error)) => {
            eprintln!("{}", error.message);
            Err(FolioError::Other(error.detail.clone()))
        }
        _ => Ok(()),
    }
}

fn print_book(book: &BookSummary) {
    let authors = if book.authors.is_empty() {
        "Unknown author".to_string()
    } else {
        book.authors.join(", ")
    };
    println!("{}", book.display_title());
    println!("    by {}", authors);
    if let Some(date) = &book.published_date {
        println!("    published {}", date);
    }
}

fn print_rating(rating: &RatingEntry) {
    let score = rating
        .score
        .map(|s| format!("{:.1}", s))
        .unwrap_or_else(|| "-".to_string());
    let title = rating.title.as_deref().unwrap_or("Untitled");
    let reviewer = rating.profile_name.as_deref().unwrap_or("anonymous");
    println!("[{}] {} ({})", score, title, reviewer);
    if let Some(summary) = &rating.summary {
        println!("    {}", summary);
    }
}

fn print_footer<F, T>(snapshot: &SearchSnapshot<F, T>) {
    println!();
    println!("{}", snapshot.summary());
    if let Some(window) = snapshot.window(DEFAULT_MAX_VISIBLE) {
        println!("{}", window);
    }
}
