use std::sync::Arc;

use async_trait::async_trait;

use forum_types::{EntityType, Viewer};

use super::backend::IndexedBackend;
use super::EntitySearchStrategy;
use crate::context::ResolvedContext;
use crate::error::SearchError;
use crate::result::ResultItem;

/// Username and display name search.
///
/// Contexts are not applied here; the composer filters users against them.
pub struct UserSearch {
    backend: Arc<IndexedBackend>,
}

impl UserSearch {
    pub fn new(backend: Arc<IndexedBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl EntitySearchStrategy for UserSearch {
    fn entity_type(&self) -> EntityType {
        EntityType::User
    }

    fn supports_context(&self, _context_type: EntityType) -> bool {
        false
    }

    async fn search_by_term(
        &self,
        term: &str,
        _context: Option<&ResolvedContext>,
        viewer: &Viewer,
        limit: usize,
    ) -> Result<Vec<ResultItem>, SearchError> {
        self.backend
            .search_type(EntityType::User, term, None, viewer, limit)
            .await
    }

    async fn lookup_by_id(
        &self,
        id: u64,
        viewer: &Viewer,
    ) -> Result<Option<ResultItem>, SearchError> {
        self.backend
            .lookup_visible(EntityType::User, id, viewer)
            .await
    }
}
