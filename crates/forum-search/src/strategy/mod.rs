//! Per-entity-type search strategies.
//!
//! Each searchable type has one strategy. The composer dispatches to them
//! with a validated plan; they never see raw request input.

mod backend;
mod category;
mod mock;
mod post;
mod topic;
mod user;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use forum_types::{EntityType, Viewer};

use crate::context::ResolvedContext;
use crate::error::SearchError;
use crate::result::ResultItem;

pub use backend::IndexedBackend;
pub use category::CategorySearch;
pub use mock::MockStrategy;
pub use post::PostSearch;
pub use topic::TopicSearch;
pub use user::UserSearch;

/// Search behavior for one entity type.
#[async_trait]
pub trait EntitySearchStrategy: Send + Sync {
    /// The type this strategy returns.
    fn entity_type(&self) -> EntityType;

    /// Whether `search_by_term` applies a context of this type itself.
    ///
    /// When false, the composer filters the results against the context.
    fn supports_context(&self, context_type: EntityType) -> bool;

    /// Ranked matches for a term, at most `limit`, visible to `viewer`.
    async fn search_by_term(
        &self,
        term: &str,
        context: Option<&ResolvedContext>,
        viewer: &Viewer,
        limit: usize,
    ) -> Result<Vec<ResultItem>, SearchError>;

    /// The entity with this id, if it exists and `viewer` may see it.
    async fn lookup_by_id(
        &self,
        id: u64,
        viewer: &Viewer,
    ) -> Result<Option<ResultItem>, SearchError>;
}

/// Strategies keyed by the type they serve.
#[derive(Clone, Default)]
pub struct StrategySet {
    strategies: BTreeMap<EntityType, Arc<dyn EntitySearchStrategy>>,
}

impl StrategySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index-backed strategies for every type.
    pub fn indexed(backend: Arc<IndexedBackend>) -> Self {
        Self::new()
            .with(Arc::new(TopicSearch::new(backend.clone())))
            .with(Arc::new(PostSearch::new(backend.clone())))
            .with(Arc::new(UserSearch::new(backend.clone())))
            .with(Arc::new(CategorySearch::new(backend)))
    }

    /// Register a strategy, replacing any for the same type.
    pub fn with(mut self, strategy: Arc<dyn EntitySearchStrategy>) -> Self {
        self.strategies.insert(strategy.entity_type(), strategy);
        self
    }

    pub fn get(&self, entity_type: EntityType) -> Option<&Arc<dyn EntitySearchStrategy>> {
        self.strategies.get(&entity_type)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
