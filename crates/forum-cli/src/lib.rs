//! Forum search CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations
//! - `fixture`: JSON import format

pub mod cli;
pub mod commands;
pub mod fixture;

pub use cli::{Cli, Commands, SearchArgs};
pub use commands::{
    handle_import, handle_log, handle_search, handle_stats, init_logging, load_settings,
};
pub use fixture::{import_entities, ForumFixture, ImportSummary};
