//! Search context resolution.
//!
//! A context narrows a search to the content of one user, topic or
//! category. The descriptor arrives as raw strings; resolution validates
//! it, loads the entity and checks that the viewer may see it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use forum_index::ScopeFilter;
use forum_types::{Entity, EntityType, Viewer};

use crate::catalog::EntityCatalog;
use crate::error::SearchError;
use crate::guardian::Guardian;
use crate::result::ResultItem;

/// Context as supplied by the caller, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContextDescriptor {
    #[serde(rename = "type")]
    pub context_type: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl RawContextDescriptor {
    pub fn new(context_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            context_type: context_type.into(),
            id: Some(id.into()),
        }
    }
}

/// A validated context bound to the entity it names.
#[derive(Debug, Clone)]
pub struct ResolvedContext {
    entity_type: EntityType,
    entity: Arc<Entity>,
}

impl ResolvedContext {
    pub fn new(entity: Arc<Entity>) -> Self {
        Self {
            entity_type: entity.entity_type(),
            entity,
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn id(&self) -> u64 {
        self.entity.id()
    }

    /// Index scope matching this context.
    pub fn scope_filter(&self) -> Option<ScopeFilter> {
        match self.entity_type {
            EntityType::User => Some(ScopeFilter::User(self.id())),
            EntityType::Topic => Some(ScopeFilter::Topic(self.id())),
            EntityType::Category => Some(ScopeFilter::Category(self.id())),
            EntityType::Post => None,
        }
    }

    /// Whether a result belongs to this context.
    pub fn admits(&self, item: &ResultItem) -> bool {
        let id = Some(self.id());
        match self.entity_type {
            EntityType::User => item.user_id == id,
            EntityType::Topic => item.topic_id == id,
            EntityType::Category => item.category_id == id,
            EntityType::Post => false,
        }
    }
}

/// Turns raw descriptors into resolved contexts.
pub struct SearchContextResolver {
    catalog: Arc<dyn EntityCatalog>,
    guardian: Arc<dyn Guardian>,
}

impl SearchContextResolver {
    pub fn new(catalog: Arc<dyn EntityCatalog>, guardian: Arc<dyn Guardian>) -> Self {
        Self { catalog, guardian }
    }

    /// Validate, load and authorize a context.
    ///
    /// Checks run in order: type, id presence, existence, visibility.
    pub async fn resolve(
        &self,
        raw: &RawContextDescriptor,
        viewer: &Viewer,
    ) -> Result<ResolvedContext, SearchError> {
        let entity_type = EntityType::parse(&raw.context_type)
            .filter(EntityType::is_context_capable)
            .ok_or_else(|| SearchError::InvalidContextType(raw.context_type.clone()))?;

        let id = raw
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(SearchError::MissingContextId)?;

        let entity = self
            .lookup(entity_type, id)
            .await?
            .ok_or_else(|| SearchError::EntityNotFound {
                entity_type,
                id: id.to_string(),
            })?;

        if !self.guardian.can_see(viewer, &entity).await {
            debug!(context_type = %entity_type, id, "Context not visible to viewer");
            return Err(SearchError::NotAuthorized {
                entity_type,
                id: id.to_string(),
            });
        }

        Ok(ResolvedContext::new(Arc::new(entity)))
    }

    /// Users are addressed by username first, then by numeric id.
    async fn lookup(&self, entity_type: EntityType, id: &str) -> Result<Option<Entity>, SearchError> {
        if entity_type == EntityType::User {
            if let Some(user) = self.catalog.find_user_by_username(id).await? {
                return Ok(Some(Entity::User(user)));
            }
        }

        match entity_type.parse_id(id) {
            Some(numeric) => self.catalog.fetch(entity_type, numeric).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockCatalog;
    use crate::guardian::MockGuardian;
    use chrono::Utc;
    use forum_types::{Category, Post, Topic, User};

    fn catalog() -> Arc<MockCatalog> {
        Arc::new(
            MockCatalog::new()
                .with_entity(Entity::User(User::new(7, "bruce", Utc::now())))
                .with_entity(Entity::Topic(Topic::new(3, "Welcome", 7, Utc::now())))
                .with_entity(Entity::Category(Category::new(2, "General", "general", Utc::now()))),
        )
    }

    fn resolver(guardian: MockGuardian) -> SearchContextResolver {
        SearchContextResolver::new(catalog(), Arc::new(guardian))
    }

    #[tokio::test]
    async fn test_resolve_user_by_username() {
        let resolver = resolver(MockGuardian::allow_all());
        let ctx = resolver
            .resolve(&RawContextDescriptor::new("user", "Bruce"), &Viewer::anonymous())
            .await
            .unwrap();

        assert_eq!(ctx.entity_type(), EntityType::User);
        assert_eq!(ctx.id(), 7);
    }

    #[tokio::test]
    async fn test_resolve_user_by_id() {
        let resolver = resolver(MockGuardian::allow_all());
        let ctx = resolver
            .resolve(&RawContextDescriptor::new("user", "7"), &Viewer::anonymous())
            .await
            .unwrap();
        assert_eq!(ctx.id(), 7);
    }

    #[tokio::test]
    async fn test_unknown_context_type() {
        let resolver = resolver(MockGuardian::allow_all());
        let err = resolver
            .resolve(&RawContextDescriptor::new("security", "hats"), &Viewer::anonymous())
            .await
            .unwrap_err();
        assert_eq!(err, SearchError::InvalidContextType("security".into()));
    }

    #[tokio::test]
    async fn test_post_is_not_a_context() {
        let resolver = resolver(MockGuardian::allow_all());
        let err = resolver
            .resolve(&RawContextDescriptor::new("post", "1"), &Viewer::anonymous())
            .await
            .unwrap_err();
        assert_eq!(err, SearchError::InvalidContextType("post".into()));
    }

    #[tokio::test]
    async fn test_missing_id() {
        let resolver = resolver(MockGuardian::allow_all());
        let raw = RawContextDescriptor {
            context_type: "topic".into(),
            id: None,
        };
        let err = resolver.resolve(&raw, &Viewer::anonymous()).await.unwrap_err();
        assert_eq!(err, SearchError::MissingContextId);

        let blank = RawContextDescriptor::new("topic", "  ");
        let err = resolver.resolve(&blank, &Viewer::anonymous()).await.unwrap_err();
        assert_eq!(err, SearchError::MissingContextId);
    }

    #[tokio::test]
    async fn test_unknown_entity() {
        let resolver = resolver(MockGuardian::allow_all());

        let err = resolver
            .resolve(&RawContextDescriptor::new("topic", "99"), &Viewer::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::EntityNotFound { entity_type: EntityType::Topic, .. }));

        let err = resolver
            .resolve(&RawContextDescriptor::new("topic", "abc"), &Viewer::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::EntityNotFound { .. }));
    }

    #[tokio::test]
    async fn test_not_authorized() {
        let resolver = resolver(MockGuardian::allow_all().except(EntityType::Category, 2));
        let err = resolver
            .resolve(&RawContextDescriptor::new("category", "2"), &Viewer::user(1))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SearchError::NotAuthorized {
                entity_type: EntityType::Category,
                id: "2".into()
            }
        );
    }

    #[tokio::test]
    async fn test_admits_by_scope() {
        let ctx = ResolvedContext::new(Arc::new(Entity::Topic(Topic::new(3, "Welcome", 7, Utc::now()))));

        let inside = ResultItem::from_entity(&Entity::Post(Post::new(1, 3, 9, "hi", Utc::now())), 0.0);
        let outside = ResultItem::from_entity(&Entity::Post(Post::new(2, 4, 9, "hi", Utc::now())), 0.0);
        let user = ResultItem::from_entity(&Entity::User(User::new(9, "x", Utc::now())), 0.0);

        assert!(ctx.admits(&inside));
        assert!(!ctx.admits(&outside));
        assert!(!ctx.admits(&user));
        assert_eq!(ctx.scope_filter(), Some(ScopeFilter::Topic(3)));
    }
}
