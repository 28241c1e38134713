use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use forum_types::{EntityType, Viewer};

use super::EntitySearchStrategy;
use crate::context::ResolvedContext;
use crate::error::SearchError;
use crate::result::ResultItem;

/// Mock strategy for testing.
///
/// Returns canned items regardless of term and context, so tests can tell
/// whether the composer applied a context. Counts every dispatch.
pub struct MockStrategy {
    entity_type: EntityType,
    /// Items returned by both term search and id lookup
    pub items: Vec<ResultItem>,
    /// Context types this mock claims to scope natively
    pub scoped: HashSet<EntityType>,
    /// Simulated latency per call
    pub delay: Option<Duration>,
    /// Fail every call with a backing store error
    pub fail: bool,
    term_calls: AtomicUsize,
    id_calls: AtomicUsize,
}

impl MockStrategy {
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            items: Vec::new(),
            scoped: HashSet::new(),
            delay: None,
            fail: false,
            term_calls: AtomicUsize::new(0),
            id_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_items(mut self, items: Vec<ResultItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_native_scope(mut self, context_type: EntityType) -> Self {
        self.scoped.insert(context_type);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn term_calls(&self) -> usize {
        self.term_calls.load(Ordering::SeqCst)
    }

    pub fn id_calls(&self) -> usize {
        self.id_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.term_calls() + self.id_calls()
    }

    async fn simulate(&self) -> Result<(), SearchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SearchError::BackingStore(format!(
                "{} strategy failed",
                self.entity_type
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EntitySearchStrategy for MockStrategy {
    fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn supports_context(&self, context_type: EntityType) -> bool {
        self.scoped.contains(&context_type)
    }

    async fn search_by_term(
        &self,
        _term: &str,
        _context: Option<&ResolvedContext>,
        _viewer: &Viewer,
        limit: usize,
    ) -> Result<Vec<ResultItem>, SearchError> {
        self.term_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        Ok(self.items.iter().take(limit).cloned().collect())
    }

    async fn lookup_by_id(
        &self,
        id: u64,
        _viewer: &Viewer,
    ) -> Result<Option<ResultItem>, SearchError> {
        self.id_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        Ok(self.items.iter().find(|item| item.id == id).cloned())
    }
}
