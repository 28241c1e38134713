//! Tantivy schema definition for entity search.
//!
//! All four entity types share one schema. Scope fields hold the owning
//! user, topic and category; an entity that is itself a user, topic or
//! category carries its own id in the matching scope field.

use tantivy::schema::{Field, Schema, FAST, INDEXED, STORED, STRING, TEXT};

use forum_types::EntityType;

use crate::IndexError;

/// Unique document key for an entity: `"{type}:{id}"`.
pub fn doc_key(entity_type: EntityType, id: u64) -> String {
    format!("{}:{}", entity_type.as_str(), id)
}

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct IndexSchema {
    schema: Schema,
    /// Unique key "{type}:{id}", used for replacement and deletion (STRING | STORED)
    pub doc_key: Field,
    /// Entity type name (STRING | STORED)
    pub doc_type: Field,
    /// Entity id (u64, INDEXED | STORED | FAST)
    pub entity_id: Field,
    /// Owning user (u64, INDEXED | STORED)
    pub user_id: Field,
    /// Owning topic (u64, INDEXED | STORED)
    pub topic_id: Field,
    /// Owning category (u64, INDEXED | STORED)
    pub category_id: Field,
    /// Creation time in milliseconds (i64, STORED | FAST)
    pub created_at_ms: Field,
    /// Searchable text (TEXT)
    pub text: Field,
}

impl IndexSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create an IndexSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, IndexError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| IndexError::SchemaMismatch(format!("missing {} field", name)))
        };

        Ok(Self {
            doc_key: field("doc_key")?,
            doc_type: field("doc_type")?,
            entity_id: field("entity_id")?,
            user_id: field("user_id")?,
            topic_id: field("topic_id")?,
            category_id: field("category_id")?,
            created_at_ms: field("created_at_ms")?,
            text: field("text")?,
            schema,
        })
    }
}

/// Build the entity search schema.
pub fn build_entity_schema() -> IndexSchema {
    let mut schema_builder = Schema::builder();

    let doc_key = schema_builder.add_text_field("doc_key", STRING | STORED);
    let doc_type = schema_builder.add_text_field("doc_type", STRING | STORED);
    let entity_id = schema_builder.add_u64_field("entity_id", INDEXED | STORED | FAST);

    // Scope fields, absent when the entity has no owner of that kind
    let user_id = schema_builder.add_u64_field("user_id", INDEXED | STORED);
    let topic_id = schema_builder.add_u64_field("topic_id", INDEXED | STORED);
    let category_id = schema_builder.add_u64_field("category_id", INDEXED | STORED);

    let created_at_ms = schema_builder.add_i64_field("created_at_ms", STORED | FAST);

    // Content is loaded from storage, so the text is indexed but not stored
    let text = schema_builder.add_text_field("text", TEXT);

    let schema = schema_builder.build();

    IndexSchema {
        schema,
        doc_key,
        doc_type,
        entity_id,
        user_id,
        topic_id,
        category_id,
        created_at_ms,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_schema() {
        let schema = build_entity_schema();
        assert!(schema.schema.get_field("doc_key").is_ok());
        assert!(schema.schema.get_field("entity_id").is_ok());
        assert!(schema.schema.get_field("text").is_ok());
    }

    #[test]
    fn test_from_schema() {
        let original = build_entity_schema();
        let rebuilt = IndexSchema::from_schema(original.schema().clone()).unwrap();
        assert_eq!(rebuilt.doc_key, original.doc_key);
        assert_eq!(rebuilt.topic_id, original.topic_id);
        assert_eq!(rebuilt.text, original.text);
    }

    #[test]
    fn test_from_schema_missing_field() {
        let mut builder = Schema::builder();
        builder.add_text_field("doc_key", STRING | STORED);
        let result = IndexSchema::from_schema(builder.build());
        assert!(matches!(result, Err(IndexError::SchemaMismatch(_))));
    }

    #[test]
    fn test_doc_key() {
        assert_eq!(doc_key(EntityType::Post, 12), "post:12");
        assert_ne!(doc_key(EntityType::Post, 1), doc_key(EntityType::Topic, 1));
    }
}
