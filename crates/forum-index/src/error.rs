//! Index error types.

use thiserror::Error;

/// Errors that can occur during indexing and search.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Index writer is poisoned or held elsewhere
    #[error("Index is locked: {0}")]
    IndexLocked(String),
}
