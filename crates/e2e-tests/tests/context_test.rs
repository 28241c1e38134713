//! Search context validation, authorization and scoping.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use e2e_tests::{category, post, post_in, topic, topic_in, user, TestHarness};
use forum_search::{MockGuardian, SearchControl, SearchError, SearchRequest};
use forum_types::{EntityType, Viewer};

fn seeded() -> TestHarness {
    let harness = TestHarness::new();
    harness.add(&[
        user(7, "bruce"),
        user(8, "alfred"),
        category(2, "Batcave", "batcave"),
        topic_in(10, "Gadget ideas", 7, 2),
        topic(11, "Kitchen", 8),
        post_in(100, 10, 7, 2, "test the new grapple"),
        post(101, 11, 8, "test the new recipe"),
    ]);
    harness
}

#[tokio::test]
async fn test_invalid_context_type() {
    let harness = seeded();
    let err = harness
        .engine()
        .search(
            &SearchRequest::new("test").with_context("security", "hole"),
            &Viewer::anonymous(),
            &SearchControl::unbounded(),
        )
        .await
        .unwrap_err();

    assert_eq!(err, SearchError::InvalidContextType("security".to_string()));
    assert!(err.is_rejected_request());
}

#[tokio::test]
async fn test_missing_context_id() {
    let harness = seeded();
    let mut request = SearchRequest::new("test");
    request.search_context = Some(serde_json::from_str(r#"{"type": "user"}"#).unwrap());

    let err = harness
        .engine()
        .search(&request, &Viewer::anonymous(), &SearchControl::unbounded())
        .await
        .unwrap_err();

    assert_eq!(err, SearchError::MissingContextId);
}

#[tokio::test]
async fn test_unauthorized_user_context() {
    let harness = seeded();
    let guardian = Arc::new(MockGuardian::allow_all().except(EntityType::User, 7));
    let engine = harness.engine_with_guardian(guardian.clone());

    let err = engine
        .search(
            &SearchRequest::new("test").with_context("user", "bruce"),
            &Viewer::user(8),
            &SearchControl::unbounded(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SearchError::NotAuthorized {
            entity_type: EntityType::User,
            id: "bruce".to_string()
        }
    );
    // Only the context itself was checked; nothing was searched
    assert_eq!(guardian.seen(), vec![(EntityType::User, 7)]);

    // Transports collapse the distinction
    assert!(matches!(err.masked(), SearchError::EntityNotFound { .. }));
}

#[tokio::test]
async fn test_authorized_user_context() {
    let harness = seeded();
    let engine = harness.engine_with_guardian(Arc::new(MockGuardian::allow_all()));

    let envelope = engine
        .search(
            &SearchRequest::new("test").with_context("user", "bruce"),
            &Viewer::user(8),
            &SearchControl::unbounded(),
        )
        .await
        .unwrap();

    assert_eq!(envelope.ids(EntityType::Post), vec![100]);
    assert_eq!(envelope.ids(EntityType::Topic), vec![10]);
}

#[tokio::test]
async fn test_unknown_context_user() {
    let harness = seeded();
    let err = harness
        .engine()
        .search(
            &SearchRequest::new("test").with_context("user", "joker"),
            &Viewer::anonymous(),
            &SearchControl::unbounded(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SearchError::EntityNotFound {
            entity_type: EntityType::User,
            id: "joker".to_string()
        }
    );
}

#[tokio::test]
async fn test_topic_context_scopes_posts() {
    let harness = seeded();
    let envelope = harness
        .engine()
        .search(
            &SearchRequest::new("test new").with_context("topic", "11"),
            &Viewer::anonymous(),
            &SearchControl::unbounded(),
        )
        .await
        .unwrap();

    assert_eq!(envelope.ids(EntityType::Post), vec![101]);
    assert_eq!(envelope.ids(EntityType::Topic), vec![11]);
    assert!(envelope.users().is_empty());
}

#[tokio::test]
async fn test_category_context_filters_users_and_categories() {
    let harness = seeded();
    let envelope = harness
        .engine()
        .search(
            &SearchRequest::new("batcave").with_context("category", "2"),
            &Viewer::anonymous(),
            &SearchControl::unbounded(),
        )
        .await
        .unwrap();

    // Category 2 belongs to itself
    assert_eq!(envelope.ids(EntityType::Category), vec![2]);

    let envelope = harness
        .engine()
        .search(
            &SearchRequest::new("bruce").with_context("category", "2"),
            &Viewer::anonymous(),
            &SearchControl::unbounded(),
        )
        .await
        .unwrap();
    // Users have no category, so none survive the cross-check
    assert!(envelope.users().is_empty());
}

#[tokio::test]
async fn test_restricted_category_context() {
    let harness = TestHarness::new();
    let mut lounge = forum_types::Category::new(3, "Lounge", "lounge", e2e_tests::at(1));
    lounge.read_restricted = true;
    harness.add(&[forum_types::Entity::Category(lounge)]);
    let engine = harness.engine();
    let request = SearchRequest::new("anything").with_context("category", "3");

    let err = engine
        .search(&request, &Viewer::user(1), &SearchControl::unbounded())
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::NotAuthorized { .. }));

    engine
        .search(&request, &Viewer::staff(1), &SearchControl::unbounded())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_id_lookup_respects_context() {
    let harness = seeded();
    let engine = harness.engine();

    let inside = engine
        .search(
            &SearchRequest::new("100")
                .with_type_filter("post")
                .for_id()
                .with_context("topic", "10"),
            &Viewer::anonymous(),
            &SearchControl::unbounded(),
        )
        .await
        .unwrap();
    assert_eq!(inside.ids(EntityType::Post), vec![100]);

    let outside = engine
        .search(
            &SearchRequest::new("101")
                .with_type_filter("post")
                .for_id()
                .with_context("topic", "10"),
            &Viewer::anonymous(),
            &SearchControl::unbounded(),
        )
        .await
        .unwrap();
    assert!(outside.posts().is_empty());
}
