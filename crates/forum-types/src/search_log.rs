//! Audit records of executed search terms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::EntityType;

/// One executed search term.
///
/// Immutable once written. The term is stored exactly as supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchLogEntry {
    pub term: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub context_type: Option<EntityType>,
    /// Searching user, None for anonymous searches
    #[serde(default)]
    pub user_id: Option<u64>,
}

impl SearchLogEntry {
    pub fn new(term: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            term: term.into(),
            occurred_at,
            context_type: None,
            user_id: None,
        }
    }

    pub fn with_context_type(mut self, context_type: Option<EntityType>) -> Self {
        self.context_type = context_type;
        self
    }

    pub fn with_user(mut self, user_id: Option<u64>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
