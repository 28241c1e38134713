//! Document mapping from domain entities to Tantivy documents.

use tantivy::TantivyDocument;

use forum_types::Entity;

use crate::schema::{doc_key, IndexSchema};

/// Searchable text for an entity.
///
/// - Topic: title
/// - Post: raw body
/// - User: username and display name
/// - Category: name, slug and description
pub fn entity_text(entity: &Entity) -> String {
    match entity {
        Entity::Topic(topic) => topic.title.clone(),
        Entity::Post(post) => post.raw.clone(),
        Entity::User(user) => match &user.name {
            Some(name) => format!("{} {}", user.username, name),
            None => user.username.clone(),
        },
        Entity::Category(category) => {
            let mut parts = vec![category.name.clone(), category.slug.clone()];
            if let Some(description) = &category.description {
                parts.push(description.clone());
            }
            parts.join(" ")
        }
    }
}

/// Convert an entity to a Tantivy document.
pub fn entity_to_doc(schema: &IndexSchema, entity: &Entity) -> TantivyDocument {
    let mut doc = TantivyDocument::default();

    doc.add_text(schema.doc_key, doc_key(entity.entity_type(), entity.id()));
    doc.add_text(schema.doc_type, entity.entity_type().as_str());
    doc.add_u64(schema.entity_id, entity.id());

    if let Some(user_id) = entity.owner_user_id() {
        doc.add_u64(schema.user_id, user_id);
    }
    if let Some(topic_id) = entity.topic_id() {
        doc.add_u64(schema.topic_id, topic_id);
    }
    if let Some(category_id) = entity.category_id() {
        doc.add_u64(schema.category_id, category_id);
    }

    doc.add_i64(schema.created_at_ms, entity.created_at().timestamp_millis());
    doc.add_text(schema.text, entity_text(entity));

    doc
}
