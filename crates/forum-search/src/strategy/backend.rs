//! Shared plumbing for index-backed strategies.

use std::sync::Arc;

use tracing::debug;

use forum_index::{EntitySearcher, IndexHit, IndexQuery, ScopeFilter};
use forum_types::{Entity, EntityType, Viewer};

use crate::catalog::EntityCatalog;
use crate::error::SearchError;
use crate::guardian::Guardian;
use crate::result::ResultItem;

/// Extra index hits fetched per requested result, so that results dropped
/// by the guardian do not leave a short page.
const OVERFETCH_FACTOR: usize = 3;

/// Index, record store and guardian shared by all indexed strategies.
pub struct IndexedBackend {
    searcher: Arc<EntitySearcher>,
    catalog: Arc<dyn EntityCatalog>,
    guardian: Arc<dyn Guardian>,
}

impl IndexedBackend {
    pub fn new(
        searcher: Arc<EntitySearcher>,
        catalog: Arc<dyn EntityCatalog>,
        guardian: Arc<dyn Guardian>,
    ) -> Self {
        Self {
            searcher,
            catalog,
            guardian,
        }
    }

    /// Ranked index hits. Runs on the blocking pool.
    pub async fn hits(&self, term: &str, query: IndexQuery) -> Result<Vec<IndexHit>, SearchError> {
        let searcher = self.searcher.clone();
        let term = term.to_string();
        let hits = tokio::task::spawn_blocking(move || searcher.search(&term, &query)).await??;
        Ok(hits)
    }

    /// Hit budget for a page of `limit` results.
    pub fn budget(limit: usize) -> usize {
        limit.saturating_mul(OVERFETCH_FACTOR)
    }

    /// Load entities in `ids` order and keep those the viewer may see.
    pub async fn load_visible(
        &self,
        entity_type: EntityType,
        ids: &[u64],
        viewer: &Viewer,
    ) -> Result<Vec<Entity>, SearchError> {
        let entities = self.catalog.fetch_many(entity_type, ids).await?;
        let loaded = entities.len();

        let mut visible = Vec::with_capacity(loaded);
        for entity in entities {
            if self.guardian.can_see(viewer, &entity).await {
                visible.push(entity);
            }
        }

        if visible.len() < ids.len() {
            debug!(
                entity_type = %entity_type,
                requested = ids.len(),
                loaded,
                visible = visible.len(),
                "Dropped missing or hidden entities"
            );
        }
        Ok(visible)
    }

    /// One entity by id, if it exists and is visible.
    pub async fn lookup_visible(
        &self,
        entity_type: EntityType,
        id: u64,
        viewer: &Viewer,
    ) -> Result<Option<ResultItem>, SearchError> {
        let Some(entity) = self.catalog.fetch(entity_type, id).await? else {
            return Ok(None);
        };
        if !self.guardian.can_see(viewer, &entity).await {
            return Ok(None);
        }
        Ok(Some(ResultItem::from_entity(&entity, 0.0)))
    }

    /// Term search over a single document type: hits, then visible records,
    /// in rank order, at most `limit`.
    pub async fn search_type(
        &self,
        entity_type: EntityType,
        term: &str,
        scope: Option<ScopeFilter>,
        viewer: &Viewer,
        limit: usize,
    ) -> Result<Vec<ResultItem>, SearchError> {
        let query = IndexQuery::new(Self::budget(limit))
            .with_doc_type(entity_type)
            .with_scope(scope);
        let hits = self.hits(term, query).await?;

        let ranked: Vec<(u64, f32)> = hits.iter().map(|h| (h.entity_id, h.score)).collect();
        self.materialize(entity_type, &ranked, viewer, limit).await
    }

    /// Turn ranked `(id, score)` pairs into result items.
    pub async fn materialize(
        &self,
        entity_type: EntityType,
        ranked: &[(u64, f32)],
        viewer: &Viewer,
        limit: usize,
    ) -> Result<Vec<ResultItem>, SearchError> {
        let ids: Vec<u64> = ranked.iter().map(|(id, _)| *id).collect();
        let visible = self.load_visible(entity_type, &ids, viewer).await?;

        let items = visible
            .iter()
            .filter_map(|entity| {
                ranked
                    .iter()
                    .find(|(id, _)| *id == entity.id())
                    .map(|(_, score)| ResultItem::from_entity(entity, *score))
            })
            .take(limit)
            .collect();
        Ok(items)
    }
}
