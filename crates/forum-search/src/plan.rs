//! Request validation and query planning.
//!
//! A `SearchRequest` is untrusted input. `QueryPlanBuilder::build` turns it
//! into a `QueryPlan`: every field validated and the context resolved and
//! authorized. Strategies only ever see a plan.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use forum_types::{EntityType, Viewer};

use crate::catalog::EntityCatalog;
use crate::context::{RawContextDescriptor, ResolvedContext, SearchContextResolver};
use crate::error::SearchError;
use crate::guardian::Guardian;

/// Where the search is run from, which decides the per-type result limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Quick search dropdown
    #[default]
    Header,
    /// Dedicated search page
    FullPage,
}

/// An incoming search request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub term: String,
    #[serde(default)]
    pub type_filter: Option<String>,
    /// Treat the term as an entity id of `type_filter`
    #[serde(default)]
    pub search_for_id: bool,
    #[serde(default)]
    pub search_context: Option<RawContextDescriptor>,
    #[serde(default)]
    pub include_blurb: bool,
    #[serde(default)]
    pub mode: SearchMode,
}

impl SearchRequest {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    pub fn with_type_filter(mut self, type_filter: impl Into<String>) -> Self {
        self.type_filter = Some(type_filter.into());
        self
    }

    pub fn for_id(mut self) -> Self {
        self.search_for_id = true;
        self
    }

    pub fn with_context(mut self, context_type: impl Into<String>, id: impl Into<String>) -> Self {
        self.search_context = Some(RawContextDescriptor::new(context_type, id));
        self
    }

    pub fn with_blurb(mut self) -> Self {
        self.include_blurb = true;
        self
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A validated, executable search.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    term: String,
    lookup_id: Option<u64>,
    type_filter: Option<EntityType>,
    context: Option<ResolvedContext>,
    want_blurb: bool,
    mode: SearchMode,
}

impl QueryPlan {
    /// Normalized (trimmed) term
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn lookup_id(&self) -> Option<u64> {
        self.lookup_id
    }

    pub fn is_id_lookup(&self) -> bool {
        self.lookup_id.is_some()
    }

    pub fn type_filter(&self) -> Option<EntityType> {
        self.type_filter
    }

    pub fn context(&self) -> Option<&ResolvedContext> {
        self.context.as_ref()
    }

    pub fn want_blurb(&self) -> bool {
        self.want_blurb
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Entity types to search.
    ///
    /// With no filter, all of them. With a filter, that type, plus posts
    /// when topics are filtered in term mode: topic matches come from the
    /// posts inside them, and those posts are reported alongside.
    pub fn selected_types(&self) -> Vec<EntityType> {
        match self.type_filter {
            None => EntityType::ALL.to_vec(),
            Some(EntityType::Topic) if !self.is_id_lookup() => {
                vec![EntityType::Topic, EntityType::Post]
            }
            Some(entity_type) => vec![entity_type],
        }
    }
}

/// Validates requests and resolves their context.
pub struct QueryPlanBuilder {
    resolver: SearchContextResolver,
}

impl QueryPlanBuilder {
    pub fn new(catalog: Arc<dyn EntityCatalog>, guardian: Arc<dyn Guardian>) -> Self {
        Self {
            resolver: SearchContextResolver::new(catalog, guardian),
        }
    }

    /// Build a plan.
    ///
    /// Local checks (type filter, id lookup, empty term) run before the
    /// context is resolved, so malformed requests never touch storage.
    pub async fn build(
        &self,
        request: &SearchRequest,
        viewer: &Viewer,
    ) -> Result<QueryPlan, SearchError> {
        let type_filter = parse_type_filter(request.type_filter.as_deref())?;
        let term = request.term.trim();

        let lookup_id = if request.search_for_id {
            let entity_type = type_filter.ok_or_else(|| {
                SearchError::InvalidIdLookup("id lookup requires a type filter".to_string())
            })?;
            let id = entity_type.parse_id(term).ok_or_else(|| {
                SearchError::InvalidIdLookup(format!(
                    "'{}' is not a valid {} id",
                    request.term, entity_type
                ))
            })?;
            Some(id)
        } else {
            if term.is_empty() {
                return Err(SearchError::EmptyQuery);
            }
            None
        };

        let context = match &request.search_context {
            Some(raw) => Some(self.resolver.resolve(raw, viewer).await?),
            None => None,
        };

        Ok(QueryPlan {
            term: term.to_string(),
            lookup_id,
            type_filter,
            context,
            want_blurb: request.include_blurb,
            mode: request.mode,
        })
    }
}

/// A blank filter means "all types".
fn parse_type_filter(raw: Option<&str>) -> Result<Option<EntityType>, SearchError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(name) => EntityType::parse(name)
            .map(Some)
            .ok_or_else(|| SearchError::InvalidTypeFilter(name.to_string())),
    }
}
