//! Storage layer for forum search.
//!
//! Provides RocksDB-backed storage with:
//! - One column family per entity type, keyed by zero-padded id
//! - A case-insensitive username index for user lookups
//! - An append-only search log with time-prefixed keys

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;

pub use db::{Storage, StorageStats};
pub use error::StorageError;
pub use keys::{EntityKey, SearchLogKey};
