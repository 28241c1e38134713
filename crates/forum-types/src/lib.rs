//! # forum-types
//!
//! Shared domain types for forum search.
//!
//! This crate defines the data structures used throughout the system:
//! - Entities: topics, posts, users and categories
//! - Viewer: the identity a search runs as
//! - Search log entries: audit records of executed terms
//! - Settings: layered configuration

pub mod config;
pub mod entity;
pub mod error;
pub mod search_log;
pub mod viewer;

pub use config::Settings;
pub use entity::{Category, Entity, EntityType, Post, Topic, User};
pub use error::ForumError;
pub use search_log::SearchLogEntry;
pub use viewer::Viewer;
