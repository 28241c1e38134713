//! Search result items and the per-type result envelope.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use forum_types::{Entity, EntityType};

/// One matching entity, in the shape returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    pub id: u64,

    #[serde(rename = "type")]
    pub entity_type: EntityType,

    /// Topic title, category name or username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Display name for users
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_number: Option<u32>,

    pub created_at: DateTime<Utc>,

    /// Relevance score from the index; 0.0 for id lookups
    #[serde(default)]
    pub score: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blurb: Option<String>,

    /// Full post body, kept for blurb generation only
    #[serde(skip)]
    pub body: Option<String>,
}

impl ResultItem {
    pub fn from_entity(entity: &Entity, score: f32) -> Self {
        let mut item = Self {
            id: entity.id(),
            entity_type: entity.entity_type(),
            title: None,
            name: None,
            topic_id: None,
            user_id: entity.owner_user_id(),
            category_id: entity.category_id(),
            post_number: None,
            created_at: entity.created_at(),
            score,
            blurb: None,
            body: None,
        };

        match entity {
            Entity::Topic(topic) => {
                item.title = Some(topic.title.clone());
                item.topic_id = Some(topic.id);
            }
            Entity::Post(post) => {
                item.topic_id = Some(post.topic_id);
                item.post_number = Some(post.post_number);
                item.body = Some(post.raw.clone());
            }
            Entity::User(user) => {
                item.title = Some(user.username.clone());
                item.name = user.name.clone();
            }
            Entity::Category(category) => {
                item.title = Some(category.name.clone());
            }
        }

        item
    }
}

/// Results grouped by entity type.
///
/// Every type is always present, so an empty list means "no matches" and
/// never "not searched". Serializes as a map keyed by plural type name.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultEnvelope {
    results: BTreeMap<EntityType, Vec<ResultItem>>,
}

impl Default for SearchResultEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchResultEnvelope {
    pub fn new() -> Self {
        Self {
            results: EntityType::ALL.iter().map(|t| (*t, Vec::new())).collect(),
        }
    }

    pub fn set(&mut self, entity_type: EntityType, items: Vec<ResultItem>) {
        self.results.insert(entity_type, items);
    }

    pub fn get(&self, entity_type: EntityType) -> &[ResultItem] {
        self.results
            .get(&entity_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn topics(&self) -> &[ResultItem] {
        self.get(EntityType::Topic)
    }

    pub fn posts(&self) -> &[ResultItem] {
        self.get(EntityType::Post)
    }

    pub fn users(&self) -> &[ResultItem] {
        self.get(EntityType::User)
    }

    pub fn categories(&self) -> &[ResultItem] {
        self.get(EntityType::Category)
    }

    /// Ids of one type, in result order.
    pub fn ids(&self, entity_type: EntityType) -> Vec<u64> {
        self.get(entity_type).iter().map(|item| item.id).collect()
    }

    pub fn total(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl Serialize for SearchResultEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(EntityType::ALL.len()))?;
        for entity_type in EntityType::ALL {
            map.serialize_entry(entity_type.plural(), self.get(entity_type))?;
        }
        map.end()
    }
}
