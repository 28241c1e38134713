//! RocksDB wrapper for forum search storage.
//!
//! Provides:
//! - Database open with column family setup
//! - Entity writes (with username index maintenance) and exact-key reads
//! - Append-only search log writes and chronological scans

use std::path::Path;

use chrono::Utc;
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use tracing::{debug, info};

use forum_types::{Category, Entity, EntityType, Post, SearchLogEntry, Topic, User};

use crate::column_families::{
    build_cf_descriptors, cf_for, CF_CATEGORIES, CF_POSTS, CF_SEARCH_LOG, CF_TOPICS, CF_USERNAMES,
    CF_USERS,
};
use crate::error::StorageError;
use crate::keys::{EntityKey, SearchLogKey};

/// Main storage interface for forum search
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    /// Store an entity, replacing any previous version with the same id.
    ///
    /// Users also update the username index; a renamed user loses its old
    /// username entry in the same batch.
    pub fn put_entity(&self, entity: &Entity) -> Result<(), StorageError> {
        let cf = self.cf(cf_for(entity.entity_type()))?;
        let key = EntityKey::new(entity.id());
        let bytes = entity.to_bytes()?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf, key.to_bytes(), &bytes);

        if let Entity::User(user) = entity {
            let usernames_cf = self.cf(CF_USERNAMES)?;
            if let Some(Entity::User(previous)) = self.get_entity(EntityType::User, user.id)? {
                if previous.username_lower() != user.username_lower() {
                    batch.delete_cf(&usernames_cf, previous.username_lower().as_bytes());
                }
            }
            batch.put_cf(
                &usernames_cf,
                user.username_lower().as_bytes(),
                key.to_bytes(),
            );
        }

        self.db.write(batch)?;
        debug!(entity_type = %entity.entity_type(), id = entity.id(), "Stored entity");
        Ok(())
    }

    pub fn put_topic(&self, topic: &Topic) -> Result<(), StorageError> {
        self.put_entity(&Entity::Topic(topic.clone()))
    }

    pub fn put_post(&self, post: &Post) -> Result<(), StorageError> {
        self.put_entity(&Entity::Post(post.clone()))
    }

    pub fn put_user(&self, user: &User) -> Result<(), StorageError> {
        self.put_entity(&Entity::User(user.clone()))
    }

    pub fn put_category(&self, category: &Category) -> Result<(), StorageError> {
        self.put_entity(&Entity::Category(category.clone()))
    }

    /// Get an entity by type and id.
    pub fn get_entity(
        &self,
        entity_type: EntityType,
        id: u64,
    ) -> Result<Option<Entity>, StorageError> {
        let cf = self.cf(cf_for(entity_type))?;

        match self.db.get_cf(&cf, EntityKey::new(id).to_bytes())? {
            Some(bytes) => {
                let entity = Entity::from_bytes(&bytes)?;
                if entity.entity_type() != entity_type {
                    return Err(StorageError::Corrupt(format!(
                        "expected {} record for id {}, found {}",
                        entity_type,
                        id,
                        entity.entity_type()
                    )));
                }
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Get several entities of one type, preserving the order of `ids` and
    /// skipping ids that do not exist.
    pub fn get_entities(
        &self,
        entity_type: EntityType,
        ids: &[u64],
    ) -> Result<Vec<Entity>, StorageError> {
        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.get_entity(entity_type, *id)? {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    pub fn get_topic(&self, id: u64) -> Result<Option<Topic>, StorageError> {
        match self.get_entity(EntityType::Topic, id)? {
            Some(Entity::Topic(topic)) => Ok(Some(topic)),
            _ => Ok(None),
        }
    }

    pub fn get_post(&self, id: u64) -> Result<Option<Post>, StorageError> {
        match self.get_entity(EntityType::Post, id)? {
            Some(Entity::Post(post)) => Ok(Some(post)),
            _ => Ok(None),
        }
    }

    pub fn get_user(&self, id: u64) -> Result<Option<User>, StorageError> {
        match self.get_entity(EntityType::User, id)? {
            Some(Entity::User(user)) => Ok(Some(user)),
            _ => Ok(None),
        }
    }

    pub fn get_category(&self, id: u64) -> Result<Option<Category>, StorageError> {
        match self.get_entity(EntityType::Category, id)? {
            Some(Entity::Category(category)) => Ok(Some(category)),
            _ => Ok(None),
        }
    }

    /// Find a user by username, ignoring case.
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let usernames_cf = self.cf(CF_USERNAMES)?;
        let lookup = username.trim().to_lowercase();
        if lookup.is_empty() {
            return Ok(None);
        }

        match self.db.get_cf(&usernames_cf, lookup.as_bytes())? {
            Some(key_bytes) => {
                let key = EntityKey::from_bytes(&key_bytes)?;
                self.get_user(key.id)
            }
            None => Ok(None),
        }
    }

    /// Append a search log entry.
    pub fn append_search_log(&self, entry: &SearchLogEntry) -> Result<SearchLogKey, StorageError> {
        let cf = self.cf(CF_SEARCH_LOG)?;
        let key = SearchLogKey::new(entry.occurred_at.timestamp_millis());
        let bytes = entry.to_bytes()?;

        self.db.put_cf(&cf, key.to_bytes(), &bytes)?;
        debug!(term = %entry.term, key = %key.ulid, "Appended search log entry");
        Ok(key)
    }

    /// Read search log entries in chronological order.
    ///
    /// With a limit, returns the most recent `limit` entries (still oldest first).
    pub fn search_log_entries(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<SearchLogEntry>, StorageError> {
        let cf = self.cf(CF_SEARCH_LOG)?;
        let mut entries = Vec::new();

        match limit {
            Some(limit) => {
                for item in self.db.iterator_cf(&cf, IteratorMode::End).take(limit) {
                    let (_, value) = item?;
                    entries.push(SearchLogEntry::from_bytes(&value)?);
                }
                entries.reverse();
            }
            None => {
                for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
                    let (_, value) = item?;
                    entries.push(SearchLogEntry::from_bytes(&value)?);
                }
            }
        }

        Ok(entries)
    }

    /// Number of search log entries.
    pub fn search_log_count(&self) -> Result<u64, StorageError> {
        self.count_cf(CF_SEARCH_LOG)
    }

    fn count_cf(&self, name: &str) -> Result<u64, StorageError> {
        let cf = self.cf(name)?;
        let mut count = 0;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    /// Record counts per column family.
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        Ok(StorageStats {
            topics: self.count_cf(CF_TOPICS)?,
            posts: self.count_cf(CF_POSTS)?,
            users: self.count_cf(CF_USERS)?,
            categories: self.count_cf(CF_CATEGORIES)?,
            search_log_entries: self.count_cf(CF_SEARCH_LOG)?,
            collected_at: Utc::now(),
        })
    }
}

/// Record counts for a storage instance
#[derive(Debug, Clone)]
pub struct StorageStats {
    pub topics: u64,
    pub posts: u64,
    pub users: u64,
    pub categories: u64,
    pub search_log_entries: u64,
    pub collected_at: chrono::DateTime<Utc>,
}
