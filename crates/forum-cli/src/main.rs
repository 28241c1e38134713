//! Forum Search
//!
//! Multi-entity search over a forum's topics, posts, users and categories.
//!
//! # Usage
//!
//! ```bash
//! forum-search import forum.json
//! forum-search query <term> [--type-filter T] [--context-type T --context-id ID]
//! forum-search show <term> [...same flags]
//! forum-search log [--limit N]
//! forum-search stats
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/forum-search/config.toml)
//! 3. Environment variables (FORUM_SEARCH_*)
//! 4. CLI flags

use std::path::Path;

use anyhow::Result;
use clap::Parser;

use forum_cli::{
    handle_import, handle_log, handle_search, handle_stats, init_logging, load_settings, Cli,
    Commands,
};
use forum_search::SearchMode;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    init_logging(&settings)?;

    match &cli.command {
        Commands::Import { file } => {
            handle_import(&settings, Path::new(file))?;
        }
        Commands::Query(args) => {
            handle_search(&settings, args, SearchMode::Header).await?;
        }
        Commands::Show(args) => {
            handle_search(&settings, args, SearchMode::FullPage).await?;
        }
        Commands::Log { limit } => {
            handle_log(&settings, *limit)?;
        }
        Commands::Stats => {
            handle_stats(&settings)?;
        }
    }

    Ok(())
}
