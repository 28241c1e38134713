//! Column family definitions for RocksDB.
//!
//! Each column family isolates data with different access patterns:
//! - topics, posts, users, categories: entity records keyed by id
//! - usernames: lower-cased username -> user id
//! - search_log: append-only audit of executed search terms

use forum_types::EntityType;
use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for topics
pub const CF_TOPICS: &str = "topics";

/// Column family name for posts
pub const CF_POSTS: &str = "posts";

/// Column family name for users
pub const CF_USERS: &str = "users";

/// Column family name for the username index
pub const CF_USERNAMES: &str = "usernames";

/// Column family name for categories
pub const CF_CATEGORIES: &str = "categories";

/// Column family name for the search log
pub const CF_SEARCH_LOG: &str = "search_log";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[
    CF_TOPICS,
    CF_POSTS,
    CF_USERS,
    CF_USERNAMES,
    CF_CATEGORIES,
    CF_SEARCH_LOG,
];

/// Column family holding records of the given entity type
pub fn cf_for(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Topic => CF_TOPICS,
        EntityType::Post => CF_POSTS,
        EntityType::User => CF_USERS,
        EntityType::Category => CF_CATEGORIES,
    }
}

/// Append-only log, compressed
fn search_log_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_TOPICS, Options::default()),
        ColumnFamilyDescriptor::new(CF_POSTS, Options::default()),
        ColumnFamilyDescriptor::new(CF_USERS, Options::default()),
        ColumnFamilyDescriptor::new(CF_USERNAMES, Options::default()),
        ColumnFamilyDescriptor::new(CF_CATEGORIES, Options::default()),
        ColumnFamilyDescriptor::new(CF_SEARCH_LOG, search_log_options()),
    ]
}
