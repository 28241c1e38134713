//! # forum-search
//!
//! Multi-entity search core for a forum.
//!
//! A request names a term and optionally a type filter, an id lookup and a
//! search context (a user, topic or category). The engine:
//! 1. validates the request and resolves the context, checking with the
//!    `Guardian` that the viewer may see it
//! 2. dispatches the plan to one `EntitySearchStrategy` per selected type
//! 3. cross-checks results against the context where a strategy cannot
//!    scope natively
//! 4. attaches blurbs to post results on request
//! 5. records the search in the audit log when auditing is enabled
//!
//! Results come back as a `SearchResultEnvelope` holding a list for every
//! entity type, empty when nothing matched.

pub mod audit;
pub mod blurb;
pub mod catalog;
pub mod composer;
pub mod context;
pub mod control;
pub mod engine;
pub mod error;
pub mod guardian;
pub mod plan;
pub mod result;
pub mod settings;
pub mod strategy;

pub use audit::{MemoryLogSink, SearchAuditLog, SearchLogSink};
pub use blurb::BlurbGenerator;
pub use catalog::{EntityCatalog, MockCatalog, StorageCatalog};
pub use composer::{ResultComposer, ResultLimits};
pub use context::{RawContextDescriptor, ResolvedContext, SearchContextResolver};
pub use control::SearchControl;
pub use engine::{EngineOptions, SearchEngine};
pub use error::SearchError;
pub use guardian::{Guardian, MockGuardian, PermissionGuardian};
pub use plan::{QueryPlan, QueryPlanBuilder, SearchMode, SearchRequest};
pub use result::{ResultItem, SearchResultEnvelope};
pub use settings::{AuditingConfig, SiteSettings};
pub use strategy::{
    CategorySearch, EntitySearchStrategy, IndexedBackend, MockStrategy, PostSearch, StrategySet,
    TopicSearch, UserSearch,
};
