//! Fan-out over the selected strategies and assembly of the envelope.

use futures::future::try_join_all;
use tracing::{debug, error};

use forum_types::{EntityType, Viewer};

use crate::blurb::BlurbGenerator;
use crate::error::SearchError;
use crate::plan::{QueryPlan, SearchMode};
use crate::result::{ResultItem, SearchResultEnvelope};
use crate::strategy::StrategySet;

/// Per-type result caps for each search mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultLimits {
    pub header: usize,
    pub full_page: usize,
}

impl Default for ResultLimits {
    fn default() -> Self {
        Self {
            header: 5,
            full_page: 50,
        }
    }
}

impl ResultLimits {
    pub fn for_mode(&self, mode: SearchMode) -> usize {
        match mode {
            SearchMode::Header => self.header,
            SearchMode::FullPage => self.full_page,
        }
    }
}

/// Runs a plan against the strategies and builds the result envelope.
///
/// Per-type searches run concurrently; the first failure fails the whole
/// search, so a partial envelope is never returned.
pub struct ResultComposer {
    strategies: StrategySet,
    blurbs: BlurbGenerator,
    limits: ResultLimits,
}

impl ResultComposer {
    pub fn new(strategies: StrategySet, blurbs: BlurbGenerator, limits: ResultLimits) -> Self {
        Self {
            strategies,
            blurbs,
            limits,
        }
    }

    pub async fn execute(
        &self,
        plan: &QueryPlan,
        viewer: &Viewer,
    ) -> Result<SearchResultEnvelope, SearchError> {
        let limit = self.limits.for_mode(plan.mode());
        let selected = plan.selected_types();

        let per_type =
            try_join_all(selected.iter().map(|t| self.search_type(plan, *t, viewer, limit))).await?;

        let mut envelope = SearchResultEnvelope::new();
        for (entity_type, mut items) in per_type {
            if plan.want_blurb() && entity_type == EntityType::Post {
                self.attach_blurbs(&mut items, plan.term());
            }
            envelope.set(entity_type, items);
        }
        Ok(envelope)
    }

    async fn search_type(
        &self,
        plan: &QueryPlan,
        entity_type: EntityType,
        viewer: &Viewer,
        limit: usize,
    ) -> Result<(EntityType, Vec<ResultItem>), SearchError> {
        let Some(strategy) = self.strategies.get(entity_type) else {
            error!(entity_type = %entity_type, "No search strategy registered");
            return Err(SearchError::BackingStore(format!(
                "no search strategy registered for {}",
                entity_type
            )));
        };

        let mut items = match plan.lookup_id() {
            Some(id) => strategy.lookup_by_id(id, viewer).await?.into_iter().collect(),
            None => {
                strategy
                    .search_by_term(plan.term(), plan.context(), viewer, limit)
                    .await?
            }
        };

        // Id lookups and strategies that cannot scope are checked here
        if let Some(context) = plan.context() {
            if plan.is_id_lookup() || !strategy.supports_context(context.entity_type()) {
                let before = items.len();
                items.retain(|item| context.admits(item));
                debug!(
                    entity_type = %entity_type,
                    context_type = %context.entity_type(),
                    dropped = before - items.len(),
                    "Applied search context"
                );
            }
        }

        items.truncate(limit);
        Ok((entity_type, items))
    }

    fn attach_blurbs(&self, items: &mut [ResultItem], term: &str) {
        for item in items.iter_mut() {
            if let Some(body) = &item.body {
                item.blurb = Some(self.blurbs.generate(body, term));
            }
        }
    }
}
