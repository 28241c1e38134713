//! Entity record access for the search core.
//!
//! Strategies and the context resolver load records through this trait so
//! they can run against RocksDB in production and an in-memory map in tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use forum_storage::Storage;
use forum_types::{Entity, EntityType, User};

use crate::error::SearchError;

/// Read access to forum entities.
#[async_trait]
pub trait EntityCatalog: Send + Sync {
    /// Load one entity.
    async fn fetch(&self, entity_type: EntityType, id: u64) -> Result<Option<Entity>, SearchError>;

    /// Load several entities of one type, in the order of `ids`, skipping
    /// ids that do not exist.
    async fn fetch_many(
        &self,
        entity_type: EntityType,
        ids: &[u64],
    ) -> Result<Vec<Entity>, SearchError>;

    /// Case-insensitive username lookup.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, SearchError>;
}

/// Catalog backed by the RocksDB store.
///
/// Storage calls are blocking, so each one runs on the blocking pool.
pub struct StorageCatalog {
    storage: Arc<Storage>,
}

impl StorageCatalog {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl EntityCatalog for StorageCatalog {
    async fn fetch(&self, entity_type: EntityType, id: u64) -> Result<Option<Entity>, SearchError> {
        let storage = self.storage.clone();
        let entity =
            tokio::task::spawn_blocking(move || storage.get_entity(entity_type, id)).await??;
        Ok(entity)
    }

    async fn fetch_many(
        &self,
        entity_type: EntityType,
        ids: &[u64],
    ) -> Result<Vec<Entity>, SearchError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let storage = self.storage.clone();
        let ids = ids.to_vec();
        let entities =
            tokio::task::spawn_blocking(move || storage.get_entities(entity_type, &ids)).await??;
        debug!(entity_type = %entity_type, count = entities.len(), "Loaded entities");
        Ok(entities)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, SearchError> {
        let storage = self.storage.clone();
        let username = username.to_string();
        let user =
            tokio::task::spawn_blocking(move || storage.find_user_by_username(&username)).await??;
        Ok(user)
    }
}

/// In-memory catalog for tests.
#[derive(Default)]
pub struct MockCatalog {
    entities: HashMap<(EntityType, u64), Entity>,
    failure: Option<String>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities
            .insert((entity.entity_type(), entity.id()), entity);
        self
    }

    /// Every call fails with a backing store error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    fn check(&self) -> Result<(), SearchError> {
        match &self.failure {
            Some(message) => Err(SearchError::BackingStore(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EntityCatalog for MockCatalog {
    async fn fetch(&self, entity_type: EntityType, id: u64) -> Result<Option<Entity>, SearchError> {
        self.check()?;
        Ok(self.entities.get(&(entity_type, id)).cloned())
    }

    async fn fetch_many(
        &self,
        entity_type: EntityType,
        ids: &[u64],
    ) -> Result<Vec<Entity>, SearchError> {
        self.check()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.entities.get(&(entity_type, *id)).cloned())
            .collect())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, SearchError> {
        self.check()?;
        let wanted = username.to_lowercase();
        Ok(self.entities.values().find_map(|entity| match entity {
            Entity::User(user) if user.username_lower() == wanted => Some(user.clone()),
            _ => None,
        }))
    }
}
