//! Searchable forum entities.
//!
//! The set of searchable entity kinds is closed: topics, posts, users and
//! categories. Every entity carries a positive numeric identifier.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed enumeration of searchable entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Topic,
    Post,
    User,
    Category,
}

impl EntityType {
    /// Every searchable type, in envelope order.
    pub const ALL: [EntityType; 4] = [
        EntityType::Topic,
        EntityType::Post,
        EntityType::User,
        EntityType::Category,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Topic => "topic",
            EntityType::Post => "post",
            EntityType::User => "user",
            EntityType::Category => "category",
        }
    }

    /// Key used for this type in serialized result envelopes.
    pub fn plural(&self) -> &'static str {
        match self {
            EntityType::Topic => "topics",
            EntityType::Post => "posts",
            EntityType::User => "users",
            EntityType::Category => "categories",
        }
    }

    /// Parse a singular or plural type name, ignoring case and surrounding
    /// whitespace. Returns None for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        EntityType::ALL
            .into_iter()
            .find(|t| normalized == t.as_str() || normalized == t.plural())
    }

    /// Whether entities of this type may scope a search.
    ///
    /// Posts are searchable but never act as a search context.
    pub fn is_context_capable(&self) -> bool {
        !matches!(self, EntityType::Post)
    }

    /// Parse an identifier in this type's format.
    ///
    /// All types currently use positive integers; anything else (signs,
    /// separators, zero, overflow) is rejected.
    pub fn parse_id(&self, raw: &str) -> Option<u64> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse::<u64>().ok().filter(|id| *id > 0)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown entity type: {}", s))
    }
}

/// A discussion thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: u64,
    pub title: String,
    /// Author of the opening post
    pub user_id: u64,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Unlisted topics are only visible to their author and staff
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl Topic {
    pub fn new(id: u64, title: impl Into<String>, user_id: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            user_id,
            category_id: None,
            created_at,
            visible: true,
            deleted: false,
        }
    }

    pub fn with_category(mut self, category_id: u64) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// A single message within a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub topic_id: u64,
    pub user_id: u64,
    #[serde(default = "default_post_number")]
    pub post_number: u32,
    /// Raw post body as written by the author
    pub raw: String,
    /// Copied from the parent topic so posts can be scoped by category
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl Post {
    pub fn new(
        id: u64,
        topic_id: u64,
        user_id: u64,
        raw: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            topic_id,
            user_id,
            post_number: default_post_number(),
            raw: raw.into(),
            category_id: None,
            created_at,
            hidden: false,
            deleted: false,
        }
    }

    pub fn with_post_number(mut self, post_number: u32) -> Self {
        self.post_number = post_number;
        self
    }

    pub fn with_category(mut self, category_id: Option<u64>) -> Self {
        self.category_id = category_id;
        self
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Placeholder accounts created for incoming mail; never searchable by others
    #[serde(default)]
    pub staged: bool,
}

impl User {
    pub fn new(id: u64, username: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            username: username.into(),
            name: None,
            created_at,
            active: true,
            staged: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Lower-cased username used for case-insensitive lookups.
    pub fn username_lower(&self) -> String {
        self.username.to_lowercase()
    }
}

/// A topic category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read_restricted: bool,
}

impl Category {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        slug: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            slug: slug.into(),
            description: None,
            created_at,
            read_restricted: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Any searchable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entity {
    Topic(Topic),
    Post(Post),
    User(User),
    Category(Category),
}

impl Entity {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Topic(_) => EntityType::Topic,
            Entity::Post(_) => EntityType::Post,
            Entity::User(_) => EntityType::User,
            Entity::Category(_) => EntityType::Category,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Entity::Topic(t) => t.id,
            Entity::Post(p) => p.id,
            Entity::User(u) => u.id,
            Entity::Category(c) => c.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Entity::Topic(t) => t.created_at,
            Entity::Post(p) => p.created_at,
            Entity::User(u) => u.created_at,
            Entity::Category(c) => c.created_at,
        }
    }

    /// User this entity belongs to, if any. A user belongs to itself.
    pub fn owner_user_id(&self) -> Option<u64> {
        match self {
            Entity::Topic(t) => Some(t.user_id),
            Entity::Post(p) => Some(p.user_id),
            Entity::User(u) => Some(u.id),
            Entity::Category(_) => None,
        }
    }

    /// Topic this entity belongs to, if any. A topic belongs to itself.
    pub fn topic_id(&self) -> Option<u64> {
        match self {
            Entity::Topic(t) => Some(t.id),
            Entity::Post(p) => Some(p.topic_id),
            Entity::User(_) | Entity::Category(_) => None,
        }
    }

    /// Category this entity belongs to, if any. A category belongs to itself.
    pub fn category_id(&self) -> Option<u64> {
        match self {
            Entity::Topic(t) => t.category_id,
            Entity::Post(p) => p.category_id,
            Entity::User(_) => None,
            Entity::Category(c) => Some(c.id),
        }
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

fn default_true() -> bool {
    true
}

fn default_post_number() -> u32 {
    1
}
