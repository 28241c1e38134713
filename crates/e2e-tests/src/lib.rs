//! End-to-end test infrastructure for forum search.
//!
//! Provides a shared TestHarness backed by a real RocksDB store and Tantivy
//! index, plus builders for forum fixtures.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use forum_index::{EntityIndex, EntityIndexer, EntitySearcher};
use forum_search::{
    EngineOptions, EntityCatalog, Guardian, IndexedBackend, PermissionGuardian, SearchEngine,
    SiteSettings, StorageCatalog, StrategySet,
};
use forum_storage::Storage;
use forum_types::{Category, Entity, Post, Topic, User};

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Shared storage instance
    pub storage: Arc<Storage>,
    pub index: EntityIndex,
    pub indexer: EntityIndexer,
    /// Live settings handed to every engine built by this harness
    pub site: Arc<SiteSettings>,
}

impl TestHarness {
    /// Create a new test harness with temp directory, storage and index.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let storage = Arc::new(
            Storage::open(&temp_dir.path().join("db")).expect("Failed to open test storage"),
        );
        let index = EntityIndex::open_or_create(temp_dir.path().join("search-index"))
            .expect("Failed to open test index");
        let indexer = EntityIndexer::new(&index).expect("Failed to open index writer");

        Self {
            _temp_dir: temp_dir,
            storage,
            index,
            indexer,
            site: Arc::new(SiteSettings::new(true)),
        }
    }

    /// Store and index entities, then commit.
    pub fn add(&self, entities: &[Entity]) {
        for entity in entities {
            self.storage
                .put_entity(entity)
                .expect("Failed to store entity");
        }
        self.indexer
            .index_entities(entities)
            .expect("Failed to index entities");
        self.indexer.commit().expect("Failed to commit index");
    }

    /// Engine with flag-based permissions.
    pub fn engine(&self) -> SearchEngine {
        let catalog = Arc::new(StorageCatalog::new(self.storage.clone()));
        self.engine_with_guardian(Arc::new(PermissionGuardian::new(catalog)))
    }

    /// Engine with the given guardian for both context checks and results.
    pub fn engine_with_guardian(&self, guardian: Arc<dyn Guardian>) -> SearchEngine {
        let searcher =
            Arc::new(EntitySearcher::new(&self.index).expect("Failed to open index reader"));
        let catalog: Arc<dyn EntityCatalog> = Arc::new(StorageCatalog::new(self.storage.clone()));
        let backend = Arc::new(IndexedBackend::new(
            searcher,
            catalog.clone(),
            guardian.clone(),
        ));

        SearchEngine::new(
            catalog,
            guardian,
            StrategySet::indexed(backend),
            self.storage.clone(),
            self.site.clone(),
            EngineOptions::default(),
        )
    }

    /// Terms in the search log, oldest first.
    pub fn logged_terms(&self) -> Vec<String> {
        self.storage
            .search_log_entries(None)
            .expect("Failed to read search log")
            .into_iter()
            .map(|entry| entry.term)
            .collect()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed timestamp `ms` milliseconds after a base instant.
pub fn at(ms: i64) -> DateTime<Utc> {
    let base: i64 = 1_706_540_400_000;
    Utc.timestamp_millis_opt(base + ms)
        .single()
        .expect("Invalid test timestamp")
}

pub fn user(id: u64, username: &str) -> Entity {
    Entity::User(User::new(id, username, at(id as i64)))
}

pub fn topic(id: u64, title: &str, user_id: u64) -> Entity {
    Entity::Topic(Topic::new(id, title, user_id, at(1_000 + id as i64)))
}

pub fn topic_in(id: u64, title: &str, user_id: u64, category_id: u64) -> Entity {
    Entity::Topic(Topic::new(id, title, user_id, at(1_000 + id as i64)).with_category(category_id))
}

pub fn post(id: u64, topic_id: u64, user_id: u64, raw: &str) -> Entity {
    Entity::Post(Post::new(id, topic_id, user_id, raw, at(2_000 + id as i64)))
}

pub fn post_in(id: u64, topic_id: u64, user_id: u64, category_id: u64, raw: &str) -> Entity {
    Entity::Post(
        Post::new(id, topic_id, user_id, raw, at(2_000 + id as i64))
            .with_category(Some(category_id)),
    )
}

pub fn category(id: u64, name: &str, slug: &str) -> Entity {
    Entity::Category(Category::new(id, name, slug, at(id as i64)))
}
