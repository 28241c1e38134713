//! Topic search.
//!
//! A topic matches when its title matches or when any visible post inside it
//! matches. Each topic appears once, ranked by its best hit.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use forum_index::IndexQuery;
use forum_types::{Entity, EntityType, Viewer};

use super::backend::IndexedBackend;
use super::EntitySearchStrategy;
use crate::context::ResolvedContext;
use crate::error::SearchError;
use crate::result::ResultItem;

pub struct TopicSearch {
    backend: Arc<IndexedBackend>,
}

impl TopicSearch {
    pub fn new(backend: Arc<IndexedBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl EntitySearchStrategy for TopicSearch {
    fn entity_type(&self) -> EntityType {
        EntityType::Topic
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
        let query = IndexQuery::new(IndexedBackend::budget(limit))
            .with_doc_type(EntityType::Topic)
            .with_doc_type(EntityType::Post)
            .with_scope(context.and_then(ResolvedContext::scope_filter));
        let hits = self.backend.hits(term, query).await?;

        // A hidden post must not surface its topic
        let post_ids: Vec<u64> = hits
            .iter()
            .filter(|hit| hit.entity_type == EntityType::Post)
            .map(|hit| hit.entity_id)
            .collect();
        let visible_posts: HashSet<u64> = self
            .backend
            .load_visible(EntityType::Post, &post_ids, viewer)
            .await?
            .iter()
            .map(Entity::id)
            .collect();

        let mut ranked: Vec<(u64, f32)> = Vec::new();
        for hit in &hits {
            let topic_id = match hit.entity_type {
                EntityType::Topic => Some(hit.entity_id),
                EntityType::Post if visible_posts.contains(&hit.entity_id) => hit.topic_id,
                _ => None,
            };
            if let Some(topic_id) = topic_id {
                if !ranked.iter().any(|(id, _)| *id == topic_id) {
                    ranked.push((topic_id, hit.score));
                }
            }
        }

        self.backend
            .materialize(EntityType::Topic, &ranked, viewer, limit)
            .await
    }

    async fn lookup_by_id(
        &self,
        id: u64,
        viewer: &Viewer,
    ) -> Result<Option<ResultItem>, SearchError> {
        self.backend
            .lookup_visible(EntityType::Topic, id, viewer)
            .await
    }
}
