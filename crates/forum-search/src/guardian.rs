//! Authorization oracle.
//!
//! The core never decides visibility itself; it asks a `Guardian`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::warn;

use forum_types::{Entity, EntityType, Viewer};

use crate::catalog::EntityCatalog;
use crate::error::SearchError;

/// Answers whether a viewer may see an entity.
///
/// Implementations may consult external storage, so the check is async.
/// A guardian must never perform search itself.
#[async_trait]
pub trait Guardian: Send + Sync {
    async fn can_see(&self, viewer: &Viewer, entity: &Entity) -> bool;
}

/// Visibility rules derived from entity flags.
///
/// Staff see everything. Otherwise:
/// - deleted topics and posts are invisible
/// - unlisted topics and hidden posts are visible only to their author
/// - inactive and staged users are visible only to themselves
/// - read-restricted categories are invisible
///
/// Visibility is inherited: a post is visible only if its topic is, and a
/// topic only if its category is. A post whose topic no longer exists is
/// invisible; a category id with no record restricts nothing. Lookup
/// failures deny.
pub struct PermissionGuardian {
    catalog: Arc<dyn EntityCatalog>,
}

impl PermissionGuardian {
    pub fn new(catalog: Arc<dyn EntityCatalog>) -> Self {
        Self { catalog }
    }

    fn allows(viewer: &Viewer, entity: &Entity) -> bool {
        match entity {
            Entity::Topic(topic) => !topic.deleted && (topic.visible || viewer.is_user(topic.user_id)),
            Entity::Post(post) => !post.deleted && (!post.hidden || viewer.is_user(post.user_id)),
            Entity::User(user) => viewer.is_user(user.id) || (user.active && !user.staged),
            Entity::Category(category) => !category.read_restricted,
        }
    }

    async fn category_allows(&self, viewer: &Viewer, category_id: Option<u64>) -> bool {
        let Some(id) = category_id else {
            return true;
        };
        match self.catalog.fetch(EntityType::Category, id).await {
            Ok(Some(category)) => Self::allows(viewer, &category),
            Ok(None) => true,
            Err(e) => lookup_failed(EntityType::Category, id, &e),
        }
    }

    async fn topic_allows(&self, viewer: &Viewer, topic_id: u64) -> bool {
        match self.catalog.fetch(EntityType::Topic, topic_id).await {
            Ok(Some(topic)) => {
                Self::allows(viewer, &topic) && self.category_allows(viewer, topic.category_id()).await
            }
            Ok(None) => false,
            Err(e) => lookup_failed(EntityType::Topic, topic_id, &e),
        }
    }
}

fn lookup_failed(entity_type: EntityType, id: u64, error: &SearchError) -> bool {
    warn!(entity_type = %entity_type, id, error = %error, "Permission check could not load parent");
    false
}

#[async_trait]
impl Guardian for PermissionGuardian {
    async fn can_see(&self, viewer: &Viewer, entity: &Entity) -> bool {
        if viewer.staff {
            return true;
        }
        if !Self::allows(viewer, entity) {
            return false;
        }
        match entity {
            Entity::Topic(topic) => self.category_allows(viewer, topic.category_id).await,
            Entity::Post(post) => self.topic_allows(viewer, post.topic_id).await,
            Entity::User(_) | Entity::Category(_) => true,
        }
    }
}

/// Configurable guardian for tests.
///
/// Allows or denies everything by default, with per-entity exceptions, and
/// counts how often it was consulted.
pub struct MockGuardian {
    allow_by_default: bool,
    exceptions: HashSet<(EntityType, u64)>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(EntityType, u64)>>,
}

impl MockGuardian {
    pub fn allow_all() -> Self {
        Self {
            allow_by_default: true,
            exceptions: HashSet::new(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn deny_all() -> Self {
        Self {
            allow_by_default: false,
            ..Self::allow_all()
        }
    }

    /// Flip the default answer for one entity.
    pub fn except(mut self, entity_type: EntityType, id: u64) -> Self {
        self.exceptions.insert((entity_type, id));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Entities checked so far, in call order.
    pub fn seen(&self) -> Vec<(EntityType, u64)> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Guardian for MockGuardian {
    async fn can_see(&self, _viewer: &Viewer, entity: &Entity) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = (entity.entity_type(), entity.id());
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(key);
        }
        self.allow_by_default != self.exceptions.contains(&key)
    }
}
