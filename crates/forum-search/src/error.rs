//! Search error taxonomy.
//!
//! Request errors (malformed input, stale or forbidden context) are kept
//! distinct from system errors (deadline expiry, backing store failure) so
//! transports can reject the former and retry or report the latter.

use forum_types::EntityType;
use thiserror::Error;

/// Errors produced while planning or executing a search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Blank term outside id-lookup mode
    #[error("Search term is empty")]
    EmptyQuery,

    /// Type filter is not a searchable entity type
    #[error("Invalid type filter: {0}")]
    InvalidTypeFilter(String),

    /// Id lookup without a type filter, or with a term that is not an id
    #[error("Invalid id lookup: {0}")]
    InvalidIdLookup(String),

    /// Context type is not a context-capable entity type
    #[error("Invalid search context type: {0}")]
    InvalidContextType(String),

    /// Context descriptor has no id
    #[error("Search context is missing an id")]
    MissingContextId,

    /// Context entity does not exist
    #[error("{entity_type} '{id}' not found")]
    EntityNotFound { entity_type: EntityType, id: String },

    /// Context entity exists but the viewer may not see it
    #[error("Not authorized to search within {entity_type} '{id}'")]
    NotAuthorized { entity_type: EntityType, id: String },

    /// Caller cancelled the request
    #[error("Search was cancelled")]
    Cancelled,

    /// Caller deadline expired
    #[error("Search timed out")]
    Timeout,

    /// Storage, index or worker failure
    #[error("Backing store failure: {0}")]
    BackingStore(String),
}

impl SearchError {
    /// Stable snake_case name for transports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::EmptyQuery => "empty_query",
            SearchError::InvalidTypeFilter(_) => "invalid_type_filter",
            SearchError::InvalidIdLookup(_) => "invalid_id_lookup",
            SearchError::InvalidContextType(_) => "invalid_context_type",
            SearchError::MissingContextId => "missing_context_id",
            SearchError::EntityNotFound { .. } => "entity_not_found",
            SearchError::NotAuthorized { .. } => "not_authorized",
            SearchError::Cancelled => "cancelled",
            SearchError::Timeout => "timeout",
            SearchError::BackingStore(_) => "backing_store_failure",
        }
    }

    /// Malformed, stale or forbidden request. Never retried.
    pub fn is_rejected_request(&self) -> bool {
        !matches!(
            self,
            SearchError::Cancelled | SearchError::Timeout | SearchError::BackingStore(_)
        )
    }

    /// Deadline expiry or cancellation; the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::Cancelled | SearchError::Timeout)
    }

    /// Collapse `NotAuthorized` into `EntityNotFound` so a transport does
    /// not reveal that a forbidden context exists.
    pub fn masked(self) -> Self {
        match self {
            SearchError::NotAuthorized { entity_type, id } => {
                SearchError::EntityNotFound { entity_type, id }
            }
            other => other,
        }
    }
}

impl From<forum_storage::StorageError> for SearchError {
    fn from(err: forum_storage::StorageError) -> Self {
        SearchError::BackingStore(err.to_string())
    }
}

impl From<forum_index::IndexError> for SearchError {
    fn from(err: forum_index::IndexError) -> Self {
        SearchError::BackingStore(err.to_string())
    }
}

impl From<tokio::task::JoinError> for SearchError {
    fn from(err: tokio::task::JoinError) -> Self {
        SearchError::BackingStore(format!("search worker failed: {}", err))
    }
}
