use std::sync::Arc;

use async_trait::async_trait;

use forum_types::{EntityType, Viewer};

use super::backend::IndexedBackend;
use super::EntitySearchStrategy;
use crate::context::ResolvedContext;
use crate::error::SearchError;
use crate::result::ResultItem;

/// Category name, slug and description search.
///
/// Contexts are not applied here; the composer filters categories against them.
pub struct CategorySearch {
    backend: Arc<IndexedBackend>,
}

impl CategorySearch {
    pub fn new(backend: Arc<IndexedBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl EntitySearchStrategy for CategorySearch {
    fn entity_type(&self) -> EntityType {
        EntityType::Category
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
            .search_type(EntityType::Category, term, None, viewer, limit)
            .await
    }

    async fn lookup_by_id(
        &self,
        id: u64,
        viewer: &Viewer,
    ) -> Result<Option<ResultItem>, SearchError> {
        self.backend
            .lookup_visible(EntityType::Category, id, viewer)
            .await
    }
}
