pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Catalog browsing configuration service and search client", long_about = None)]
pub struct Cli {
    /// Settings document to resolve: a file path or an http(s) URL
    #[arg(long, env = "FOLIO_SETTINGS_PATH", global = true)]
    pub settings: Option<String>,

    /// Base URL of the catalog API
    #[arg(long, env = "FOLIO_CATALOG_URL", global = true)]
    pub catalog_url: Option<String>,

    /// Service configuration file (default: ~/.config/folio/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve GET /api/config
    Serve {
        /// Address to listen on, overriding [server].bind_addr
        #[arg(short, long)]
        bind: Option<std::net::SocketAddr>,
    },
    /// Print the resolved configuration as JSON
    Config,
    /// Fetch the configuration from a running server
    Refresh {
        /// Base URL of the server
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        url: String,
    },
    /// Search books in the catalog
    Books {
        /// Free-text search term
        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(short, long, default_value = "")]
        category: String,

        #[arg(short, long, default_value = "")]
        author: String,

        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Results per page (default: ui.pageSize)
        #[arg(long)]
        per_page: Option<u32>,
    },
    /// List book ratings
    Ratings {
        #[arg(long, default_value = "")]
        book_id: String,

        #[arg(long, default_value = "")]
        user_id: String,

        #[arg(long)]
        min_score: Option<f64>,

        #[arg(long)]
        max_score: Option<f64>,

        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Results per page (default: ui.pageSize)
        #[arg(long)]
        per_page: Option<u32>,
    },
}
