//! Writes entity documents into the index.
//!
//! Documents are keyed by `doc_key`, so re-indexing an entity replaces it.
//! Nothing is searchable until `commit()`.

use std::sync::{Arc, Mutex};

use tantivy::{IndexWriter, Term};
use tracing::{debug, info};

use forum_types::Entity;

use crate::document::entity_to_doc;
use crate::error::IndexError;
use crate::index::EntityIndex;
use crate::schema::{doc_key, IndexSchema};

/// Shared handle on the single index writer.
pub struct EntityIndexer {
    writer: Arc<Mutex<IndexWriter>>,
    schema: IndexSchema,
}

impl EntityIndexer {
    /// Create a new indexer from an EntityIndex.
    pub fn new(index: &EntityIndex) -> Result<Self, IndexError> {
        let writer = index.writer()?;
        let schema = index.schema().clone();

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            schema,
        })
    }

    /// Index many entities under one lock.
    pub fn index_entities(&self, entities: &[Entity]) -> Result<usize, IndexError> {
        let writer = self
            .writer
            .lock()
            .map_err(|e| IndexError::IndexLocked(e.to_string()))?;

        for entity in entities {
            self.replace(&writer, entity)?;
        }

        debug!(count = entities.len(), "Indexed entity batch");
        Ok(entities.len())
    }

    fn replace(&self, writer: &IndexWriter, entity: &Entity) -> Result<(), IndexError> {
        let key = doc_key(entity.entity_type(), entity.id());
        writer.delete_term(Term::from_field_text(self.schema.doc_key, &key));
        writer.add_document(entity_to_doc(&self.schema, entity))?;
        Ok(())
    }

    /// Commit pending changes to make them searchable.
    pub fn commit(&self) -> Result<u64, IndexError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| IndexError::IndexLocked(e.to_string()))?;

        let opstamp = writer.commit()?;
        info!(opstamp, "Committed index changes");
        Ok(opstamp)
    }
}
