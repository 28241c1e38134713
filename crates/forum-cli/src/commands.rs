//! Command implementations.
//!
//! Handles:
//! - Configuration loading with CLI overrides
//! - Logging setup
//! - Import, search, search log and stats commands

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use forum_index::{EntityIndex, EntityIndexer, EntitySearcher};
use forum_search::{
    EngineOptions, SearchControl, SearchEngine, SearchMode, SearchResultEnvelope, SiteSettings,
};
use forum_storage::Storage;
use forum_types::Settings;

use crate::cli::{Cli, SearchArgs};
use crate::fixture::{import_entities, ForumFixture, ImportSummary};

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(db_path) = &cli.db_path {
        settings.db_path = db_path.clone();
    }
    if let Some(index_path) = &cli.index_path {
        settings.search_index_path = index_path.clone();
    }
    if let Some(log_level) = &cli.log_level {
        settings.log_level = log_level.clone();
    }

    Ok(settings)
}

/// Initialize logging. RUST_LOG wins over the configured level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn open_storage(settings: &Settings) -> Result<Arc<Storage>> {
    let path = settings.expanded_db_path();
    let storage = Storage::open(&path)
        .with_context(|| format!("Failed to open storage at {}", path.display()))?;
    Ok(Arc::new(storage))
}

fn open_index(settings: &Settings) -> Result<EntityIndex> {
    let path = settings.expanded_index_path();
    EntityIndex::open_or_create(&path)
        .with_context(|| format!("Failed to open search index at {}", path.display()))
}

/// Import a JSON file into storage and the index.
pub fn handle_import(settings: &Settings, file: &Path) -> Result<ImportSummary> {
    let entities = ForumFixture::from_path(file)?.into_entities();

    let storage = open_storage(settings)?;
    let index = open_index(settings)?;
    let indexer = EntityIndexer::new(&index).context("Failed to open index writer")?;

    let summary = import_entities(&storage, &indexer, &entities)?;
    println!("Imported {} records from {}", summary.total(), file.display());
    println!("  Topics:     {}", summary.topics);
    println!("  Posts:      {}", summary.posts);
    println!("  Users:      {}", summary.users);
    println!("  Categories: {}", summary.categories);
    Ok(summary)
}

/// Run one search and print the result envelope as JSON.
pub async fn handle_search(
    settings: &Settings,
    args: &SearchArgs,
    mode: SearchMode,
) -> Result<SearchResultEnvelope> {
    let storage = open_storage(settings)?;
    let index = open_index(settings)?;
    let searcher = Arc::new(EntitySearcher::new(&index).context("Failed to open index reader")?);

    let site = Arc::new(SiteSettings::from_settings(settings));
    if args.no_log {
        site.set_log_search_queries(false);
    }

    let engine = SearchEngine::with_storage(
        storage,
        searcher,
        site,
        EngineOptions::from_settings(settings),
    );

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling search");
            on_interrupt.cancel();
        }
    });

    let control = SearchControl::unbounded()
        .with_timeout(Duration::from_millis(settings.search_timeout_ms))
        .with_cancellation(token);

    let outcome = engine
        .search(&args.to_request(mode), &args.viewer(), &control)
        .await;
    interrupt.abort();
    engine.flush_audit().await;

    // Do not reveal whether a forbidden context exists
    let envelope = outcome.map_err(|e| {
        let e = e.masked();
        anyhow::anyhow!("Search failed ({}): {}", e.kind(), e)
    })?;

    let json = serde_json::to_string_pretty(&envelope).context("Failed to encode results")?;
    println!("{}", json);
    Ok(envelope)
}

/// Print recorded searches, oldest first.
pub fn handle_log(settings: &Settings, limit: Option<usize>) -> Result<()> {
    let storage = open_storage(settings)?;
    let entries = storage
        .search_log_entries(limit)
        .context("Failed to read search log")?;

    if entries.is_empty() {
        println!("No searches recorded");
        return Ok(());
    }

    for entry in entries {
        let context = entry
            .context_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let user = entry
            .user_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "anonymous".to_string());
        println!(
            "{}  {:<10} {:<10} {}",
            entry.occurred_at.to_rfc3339(),
            context,
            user,
            entry.term
        );
    }
    Ok(())
}

/// Print record counts.
pub fn handle_stats(settings: &Settings) -> Result<()> {
    let storage = open_storage(settings)?;
    let stats = storage.stats().context("Failed to collect stats")?;
    let index = open_index(settings)?;
    let searcher = EntitySearcher::new(&index).context("Failed to open index reader")?;

    info!(db_path = %settings.db_path, "Collected stats");
    println!("Database: {}", settings.expanded_db_path().display());
    println!("  Topics:      {}", stats.topics);
    println!("  Posts:       {}", stats.posts);
    println!("  Users:       {}", stats.users);
    println!("  Categories:  {}", stats.categories);
    println!("  Search log:  {}", stats.search_log_entries);
    println!("Index: {}", settings.expanded_index_path().display());
    println!("  Documents:   {}", searcher.num_docs());
    Ok(())
}
