//! JSON import format for forum content.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use forum_index::EntityIndexer;
use forum_storage::Storage;
use forum_types::{Category, Entity, EntityType, Post, Topic, User};

/// Forum content as read from an import file.
#[derive(Debug, Default, Deserialize)]
pub struct ForumFixture {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub posts: Vec<Post>,
}

impl ForumFixture {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid import file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// All records as entities. Posts without a category inherit their
    /// topic's, so category-scoped searches find them.
    pub fn into_entities(self) -> Vec<Entity> {
        let topic_categories: HashMap<u64, Option<u64>> = self
            .topics
            .iter()
            .map(|topic| (topic.id, topic.category_id))
            .collect();

        let mut entities = Vec::new();
        entities.extend(self.categories.into_iter().map(Entity::Category));
        entities.extend(self.users.into_iter().map(Entity::User));
        entities.extend(self.topics.into_iter().map(Entity::Topic));
        entities.extend(self.posts.into_iter().map(|post| {
            let inherited = topic_categories.get(&post.topic_id).copied().flatten();
            let category_id = post.category_id.or(inherited);
            Entity::Post(post.with_category(category_id))
        }));
        entities
    }
}

/// Record counts written by an import.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub topics: usize,
    pub posts: usize,
    pub users: usize,
    pub categories: usize,
}

impl ImportSummary {
    fn count(&mut self, entity_type: EntityType) {
        match entity_type {
            EntityType::Topic => self.topics += 1,
            EntityType::Post => self.posts += 1,
            EntityType::User => self.users += 1,
            EntityType::Category => self.categories += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.topics + self.posts + self.users + self.categories
    }
}

/// Write entities to storage and the index, then commit the index.
pub fn import_entities(
    storage: &Storage,
    indexer: &EntityIndexer,
    entities: &[Entity],
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for entity in entities {
        storage
            .put_entity(entity)
            .with_context(|| format!("Failed to store {} {}", entity.entity_type(), entity.id()))?;
        summary.count(entity.entity_type());
    }

    indexer
        .index_entities(entities)
        .context("Failed to index entities")?;
    indexer.commit().context("Failed to commit index")?;

    info!(
        topics = summary.topics,
        posts = summary.posts,
        users = summary.users,
        categories = summary.categories,
        "Import complete"
    );
    Ok(summary)
}
