//! # forum-index
//!
//! Full-text index for forum search using Tantivy.
//!
//! This crate is the ranked-matching primitive behind the per-entity search
//! strategies. It stores no entity content beyond the identifiers needed to
//! scope and order matches; records are loaded from storage afterwards.
//!
//! ## Features
//! - Embedded Tantivy index with MmapDirectory for persistence
//! - One schema for topics, posts, users and categories
//! - BM25 ranking with a deterministic tie-break
//! - Scoping by owning user, topic or category

pub mod document;
pub mod error;
pub mod index;
pub mod indexer;
pub mod schema;
pub mod searcher;

pub use document::{entity_text, entity_to_doc};
pub use error::IndexError;
pub use index::EntityIndex;
pub use indexer::EntityIndexer;
pub use schema::{build_entity_schema, doc_key, IndexSchema};
pub use searcher::{EntitySearcher, IndexHit, IndexQuery, ScopeFilter};
