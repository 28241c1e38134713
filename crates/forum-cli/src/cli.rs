//! CLI argument parsing for the forum search binary.
//!
//! CLI flags override config file and environment values.

use clap::{Args, Parser, Subcommand};

use forum_search::{SearchMode, SearchRequest};
use forum_types::Viewer;

/// Forum Search
///
/// Multi-entity search over topics, posts, users and categories.
#[derive(Parser, Debug)]
#[command(name = "forum-search")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/forum-search/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override database path
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Override search index path
    #[arg(long, global = true)]
    pub index_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load forum content from a JSON file into storage and the index
    Import {
        /// JSON file with categories, users, topics and posts
        file: String,
    },

    /// Quick search, as from the header dropdown
    Query(SearchArgs),

    /// Full-page search
    Show(SearchArgs),

    /// Print recorded searches
    Log {
        /// Only the most recent N entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show record counts
    Stats,
}

/// Flags shared by `query` and `show`
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Search term (an id when --search-for-id is set)
    pub term: String,

    /// Restrict results to one type (topic, post, user, category)
    #[arg(short, long)]
    pub type_filter: Option<String>,

    /// Treat the term as an id of --type-filter
    #[arg(long)]
    pub search_for_id: bool,

    /// Search within a user, topic or category
    #[arg(long, requires = "context_id")]
    pub context_type: Option<String>,

    /// Username or id of the context entity
    #[arg(long, requires = "context_type")]
    pub context_id: Option<String>,

    /// Attach excerpts to post results
    #[arg(short = 'b', long)]
    pub include_blurb: bool,

    /// Search as this user id (anonymous when absent)
    #[arg(long)]
    pub as_user: Option<u64>,

    /// Search with staff visibility
    #[arg(long)]
    pub staff: bool,

    /// Do not record this search in the search log
    #[arg(long)]
    pub no_log: bool,
}

impl SearchArgs {
    pub fn to_request(&self, mode: SearchMode) -> SearchRequest {
        let mut request = SearchRequest::new(self.term.clone()).with_mode(mode);
        request.type_filter = self.type_filter.clone();
        request.search_for_id = self.search_for_id;
        request.include_blurb = self.include_blurb;
        if let (Some(context_type), Some(context_id)) = (&self.context_type, &self.context_id) {
            request = request.with_context(context_type.clone(), context_id.clone());
        }
        request
    }

    pub fn viewer(&self) -> Viewer {
        Viewer {
            user_id: self.as_user,
            staff: self.staff,
        }
    }
}
