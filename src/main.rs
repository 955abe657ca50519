use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use folio::app::AppContext;
use folio::cli::{commands, Cli, Commands};
use folio::config::ServiceConfig;
use folio::search::{BookFilters, RatingFilters};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut service = match &cli.config {
        Some(path) => ServiceConfig::load_from(path)?,
        None => ServiceConfig::load()?,
    };
    if let Some(settings) = cli.settings {
        service.server.settings_path = PathBuf::from(settings);
    }
    if let Some(catalog_url) = cli.catalog_url {
        service.catalog.base_url = catalog_url;
    }

    let ctx = AppContext::new(service).await?;

    match cli.command {
        Commands::Serve { bind } => {
            commands::serve(&ctx, bind).await?;
        }
        Commands::Config => {
            commands::show_config(&ctx).await?;
        }
        Commands::Refresh { url } => {
            commands::refresh_config(&ctx, &url).await?;
        }
        Commands::Books {
            search,
            category,
            author,
            page,
            per_page,
        } => {
            let filters = BookFilters::new(search, category, author);
            commands::list_books(&ctx, filters, page, per_page).await?;
        }
        Commands::Ratings {
            book_id,
            user_id,
            min_score,
            max_score,
            page,
            per_page,
        } => {
            let filters = RatingFilters {
                book_id,
                user_id,
                min_score,
                max_score,
            };
            commands::list_ratings(&ctx, filters, page, per_page).await?;
        }
    }

    Ok(())
}
