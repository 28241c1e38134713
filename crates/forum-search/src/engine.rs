//! Search engine facade.
//!
//! Wires planning, composition and auditing behind a single `search` call.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use forum_index::EntitySearcher;
use forum_storage::Storage;
use forum_types::{Settings, Viewer};

use crate::audit::{SearchAuditLog, SearchLogSink};
use crate::blurb::BlurbGenerator;
use crate::catalog::{EntityCatalog, StorageCatalog};
use crate::composer::{ResultComposer, ResultLimits};
use crate::control::SearchControl;
use crate::error::SearchError;
use crate::guardian::{Guardian, PermissionGuardian};
use crate::plan::{QueryPlanBuilder, SearchRequest};
use crate::result::SearchResultEnvelope;
use crate::settings::AuditingConfig;
use crate::strategy::{IndexedBackend, StrategySet};

/// Tunables taken from `Settings`.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub blurb_length: usize,
    pub limits: ResultLimits,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            blurb_length: crate::blurb::DEFAULT_BLURB_LENGTH,
            limits: ResultLimits::default(),
        }
    }
}

impl EngineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            blurb_length: settings.blurb_length,
            limits: ResultLimits {
                header: settings.header_search_limit,
                full_page: settings.full_page_search_limit,
            },
        }
    }
}

/// Multi-entity search over a forum.
pub struct SearchEngine {
    planner: QueryPlanBuilder,
    composer: ResultComposer,
    audit: SearchAuditLog,
    auditing: Arc<dyn AuditingConfig>,
}

impl SearchEngine {
    pub fn new(
        catalog: Arc<dyn EntityCatalog>,
        guardian: Arc<dyn Guardian>,
        strategies: StrategySet,
        audit_sink: Arc<dyn SearchLogSink>,
        auditing: Arc<dyn AuditingConfig>,
        options: EngineOptions,
    ) -> Self {
        Self {
            planner: QueryPlanBuilder::new(catalog, guardian),
            composer: ResultComposer::new(
                strategies,
                BlurbGenerator::new(options.blurb_length),
                options.limits,
            ),
            audit: SearchAuditLog::new(audit_sink),
            auditing,
        }
    }

    /// Engine over the RocksDB store and Tantivy index, with flag-based
    /// permissions and the store's search log as audit sink.
    pub fn with_storage(
        storage: Arc<Storage>,
        searcher: Arc<EntitySearcher>,
        auditing: Arc<dyn AuditingConfig>,
        options: EngineOptions,
    ) -> Self {
        let catalog: Arc<dyn EntityCatalog> = Arc::new(StorageCatalog::new(storage.clone()));
        let guardian: Arc<dyn Guardian> = Arc::new(PermissionGuardian::new(catalog.clone()));
        let backend = Arc::new(IndexedBackend::new(
            searcher,
            catalog.clone(),
            guardian.clone(),
        ));

        Self::new(
            catalog,
            guardian,
            StrategySet::indexed(backend),
            storage,
            auditing,
            options,
        )
    }

    /// Run one search.
    ///
    /// The request is validated and its context authorized before any
    /// strategy runs. Only successful searches reach the audit log.
    pub async fn search(
        &self,
        request: &SearchRequest,
        viewer: &Viewer,
        control: &SearchControl,
    ) -> Result<SearchResultEnvelope, SearchError> {
        let start = Instant::now();

        let outcome = control
            .run(async {
                let plan = self.planner.build(request, viewer).await?;
                debug!(
                    term = plan.term(),
                    types = ?plan.selected_types(),
                    id_lookup = plan.is_id_lookup(),
                    context = ?plan.context().map(|c| c.entity_type()),
                    "Planned search"
                );
                let envelope = self.composer.execute(&plan, viewer).await?;
                Ok((plan, envelope))
            })
            .await;

        let (plan, envelope) = match outcome {
            Ok(done) => done,
            Err(e) => {
                if e.is_rejected_request() {
                    debug!(kind = e.kind(), error = %e, "Search rejected");
                } else {
                    warn!(kind = e.kind(), error = %e, "Search failed");
                }
                return Err(e);
            }
        };

        self.audit.record(
            &request.term,
            plan.context(),
            viewer,
            self.auditing.auditing_enabled(),
        );

        info!(
            term = plan.term(),
            results = envelope.total(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Search complete"
        );
        Ok(envelope)
    }

    /// Wait for queued audit writes.
    pub async fn flush_audit(&self) {
        self.audit.flush().await;
    }

    pub fn audit_log(&self) -> &SearchAuditLog {
        &self.audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryLogSink;
    use crate::catalog::MockCatalog;
    use crate::guardian::MockGuardian;
    use crate::plan::SearchMode;
    use crate::result::ResultItem;
    use crate::settings::SiteSettings;
    use crate::strategy::MockStrategy;
    use chrono::Utc;
    use forum_types::{Category, Entity, EntityType, Post, User};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    struct Fixture {
        strategies: Vec<Arc<MockStrategy>>,
        sink: Arc<MemoryLogSink>,
        site: Arc<SiteSettings>,
        engine: SearchEngine,
    }

    fn fixture(guardian: MockGuardian, posts: MockStrategy) -> Fixture {
        fixture_with_sink(guardian, posts, MemoryLogSink::new())
    }

    fn fixture_with_sink(
        guardian: MockGuardian,
        posts: MockStrategy,
        sink: MemoryLogSink,
    ) -> Fixture {
        let catalog = MockCatalog::new()
            .with_entity(Entity::User(User::new(7, "bruce", Utc::now())))
            .with_entity(Entity::Category(Category::new(2, "Staff", "staff", Utc::now())));
        let strategies = vec![
            Arc::new(MockStrategy::new(EntityType::Topic)),
            Arc::new(posts),
            Arc::new(MockStrategy::new(EntityType::User)),
            Arc::new(MockStrategy::new(EntityType::Category)),
        ];
        let set = strategies
            .iter()
            .fold(StrategySet::new(), |set, s| set.with(s.clone()));
        let sink = Arc::new(sink);
        let site = Arc::new(SiteSettings::new(true));

        let engine = SearchEngine::new(
            Arc::new(catalog),
            Arc::new(guardian),
            set,
            sink.clone(),
            site.clone(),
            EngineOptions::default(),
        );
        Fixture {
            strategies,
            sink,
            site,
            engine,
        }
    }

    fn dispatches(fixture: &Fixture) -> usize {
        fixture.strategies.iter().map(|s| s.calls()).sum()
    }

    fn awesome_post() -> ResultItem {
        ResultItem::from_entity(
            &Entity::Post(Post::new(1, 3, 7, "this is my really awesome post", Utc::now())),
            1.0,
        )
    }

    #[tokio::test]
    async fn test_successful_search_is_audited() {
        let f = fixture(
            MockGuardian::allow_all(),
            MockStrategy::new(EntityType::Post).with_items(vec![awesome_post()]),
        );

        let envelope = f
            .engine
            .search(
                &SearchRequest::new("awesome").with_context("user", "bruce"),
                &Viewer::user(7),
                &SearchControl::unbounded(),
            )
            .await
            .unwrap();
        f.engine.flush_audit().await;

        assert_eq!(envelope.ids(EntityType::Post), vec![1]);
        let entries = f.sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].term, "awesome");
        assert_eq!(entries[0].context_type, Some(EntityType::User));
    }

    #[tokio::test]
    async fn test_unauthorized_context_dispatches_nothing() {
        let f = fixture(
            MockGuardian::allow_all().except(EntityType::Category, 2),
            MockStrategy::new(EntityType::Post).with_items(vec![awesome_post()]),
        );

        let err = f
            .engine
            .search(
                &SearchRequest::new("awesome").with_context("category", "2"),
                &Viewer::user(9),
                &SearchControl::unbounded(),
            )
            .await
            .unwrap_err();
        f.engine.flush_audit().await;

        assert!(matches!(err, SearchError::NotAuthorized { .. }));
        assert_eq!(dispatches(&f), 0);
        assert!(f.sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_requests_dispatch_nothing() {
        let f = fixture(MockGuardian::allow_all(), MockStrategy::new(EntityType::Post));
        let viewer = Viewer::anonymous();
        let control = SearchControl::unbounded();

        let requests = [
            SearchRequest::new(""),
            SearchRequest::new("x").with_type_filter("badge"),
            SearchRequest::new("x").for_id(),
            SearchRequest::new("x").with_context("security", "hats"),
            SearchRequest::new("x").with_context("user", "nobody"),
        ];
        for request in &requests {
            let err = f.engine.search(request, &viewer, &control).await.unwrap_err();
            assert!(err.is_rejected_request(), "{:?} gave {:?}", request, err);
        }
        f.engine.flush_audit().await;

        assert_eq!(dispatches(&f), 0);
        assert!(f.sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_audit_toggle_read_per_request() {
        let f = fixture(MockGuardian::allow_all(), MockStrategy::new(EntityType::Post));
        let viewer = Viewer::anonymous();
        let control = SearchControl::unbounded();

        f.site.set_log_search_queries(false);
        f.engine
            .search(&SearchRequest::new("quiet"), &viewer, &control)
            .await
            .unwrap();

        f.site.set_log_search_queries(true);
        f.engine
            .search(&SearchRequest::new("loud"), &viewer, &control)
            .await
            .unwrap();
        f.engine.flush_audit().await;

        let terms: Vec<String> = f.sink.entries().into_iter().map(|e| e.term).collect();
        assert_eq!(terms, vec!["loud".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_reported_as_timeout() {
        let f = fixture(
            MockGuardian::allow_all(),
            MockStrategy::new(EntityType::Post).with_delay(Duration::from_secs(10)),
        );

        let err = f
            .engine
            .search(
                &SearchRequest::new("slow").with_mode(SearchMode::FullPage),
                &Viewer::anonymous(),
                &SearchControl::unbounded().with_timeout(Duration::from_millis(100)),
            )
            .await
            .unwrap_err();
        f.engine.flush_audit().await;

        assert_eq!(err, SearchError::Timeout);
        assert!(err.is_retryable());
        assert!(f.sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let f = fixture(MockGuardian::allow_all(), MockStrategy::new(EntityType::Post));
        let token = CancellationToken::new();
        token.cancel();

        let err = f
            .engine
            .search(
                &SearchRequest::new("x"),
                &Viewer::anonymous(),
                &SearchControl::unbounded().with_cancellation(token),
            )
            .await
            .unwrap_err();

        assert_eq!(err, SearchError::Cancelled);
        assert_eq!(dispatches(&f), 0);
    }

    #[tokio::test]
    async fn test_repeated_search_is_stable() {
        let f = fixture(
            MockGuardian::allow_all(),
            MockStrategy::new(EntityType::Post).with_items(vec![awesome_post()]),
        );
        let request = SearchRequest::new("awesome").with_blurb();
        let viewer = Viewer::anonymous();
        let control = SearchControl::unbounded();

        let first = f.engine.search(&request, &viewer, &control).await.unwrap();
        let second = f.engine.search(&request, &viewer, &control).await.unwrap();
        f.engine.flush_audit().await;

        assert_eq!(first, second);
        assert_eq!(f.sink.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_audit_write_keeps_result() {
        let f = fixture_with_sink(
            MockGuardian::allow_all(),
            MockStrategy::new(EntityType::Post).with_items(vec![awesome_post()]),
            MemoryLogSink::failing(),
        );

        let envelope = f
            .engine
            .search(
                &SearchRequest::new("awesome"),
                &Viewer::anonymous(),
                &SearchControl::unbounded(),
            )
            .await
            .unwrap();
        f.engine.flush_audit().await;

        assert_eq!(envelope.ids(EntityType::Post), vec![1]);
        assert_eq!(f.engine.audit_log().failed_writes(), 1);
        assert!(f.sink.entries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_while_in_flight() {
        let f = fixture(
            MockGuardian::allow_all(),
            MockStrategy::new(EntityType::Post)
                .with_items(vec![awesome_post()])
                .with_delay(Duration::from_secs(10)),
        );
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let err = f
            .engine
            .search(
                &SearchRequest::new("awesome"),
                &Viewer::anonymous(),
                &SearchControl::unbounded().with_cancellation(token),
            )
            .await
            .unwrap_err();
        f.engine.flush_audit().await;

        assert_eq!(err, SearchError::Cancelled);
        assert!(!err.is_rejected_request());
        assert_eq!(f.strategies[1].term_calls(), 1);
        assert!(f.sink.entries().is_empty());
    }
}
