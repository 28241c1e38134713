//! Error types shared across forum search crates.

use thiserror::Error;

/// Unified error type for domain and configuration failures.
#[derive(Debug, Error)]
pub enum ForumError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
