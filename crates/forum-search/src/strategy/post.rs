use std::sync::Arc;

use async_trait::async_trait;

use forum_types::{EntityType, Viewer};

use super::backend::IndexedBackend;
use super::EntitySearchStrategy;
use crate::context::ResolvedContext;
use crate::error::SearchError;
use crate::result::ResultItem;

/// Post body search, scoped natively by author, topic or category.
pub struct PostSearch {
    backend: Arc<IndexedBackend>,
}

impl PostSearch {
    pub fn new(backend: Arc<IndexedBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl EntitySearchStrategy for PostSearch {
    fn entity_type(&self) -> EntityType {
        EntityType::Post
    }

    fn supports_context(&self, context_type: EntityType) -> bool {
        context_type.is_context_capable()
    }

    async fn search_by_term(
        &self,
        term: &str,
        context: Option<&ResolvedContext>,
        viewer: &Viewer,
        limit: usize,
    ) -> Result<Vec<ResultItem>, SearchError> {
        let scope = context.and_then(ResolvedContext::scope_filter);
        self.backend
            .search_type(EntityType::Post, term, scope, viewer, limit)
            .await
    }

    async fn lookup_by_id(
        &self,
        id: u64,
        viewer: &Viewer,
    ) -> Result<Option<ResultItem>, SearchError> {
        self.backend
            .lookup_visible(EntityType::Post, id, viewer)
            .await
    }
}
