//! On-disk entity index.

use std::path::{Path, PathBuf};

use tantivy::query::QueryParser;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tracing::{debug, info};

use crate::error::IndexError;
use crate::schema::{build_entity_schema, IndexSchema};

/// Heap handed to the single index writer.
const WRITER_HEAP_BYTES: usize = 50 * 1024 * 1024;

/// The Tantivy index holding one document per forum entity.
///
/// Opening an index written with a different field layout fails with
/// `SchemaMismatch` instead of silently searching the wrong fields.
pub struct EntityIndex {
    index: Index,
    schema: IndexSchema,
    path: PathBuf,
}

impl EntityIndex {
    /// Open the index in `path`, creating the directory and an empty index
    /// when none exists yet.
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref().to_path_buf();

        let index = if path.join("meta.json").exists() {
            debug!(path = ?path, "Opening existing entity index");
            Index::open_in_dir(&path)?
        } else {
            std::fs::create_dir_all(&path)?;
            info!(path = ?path, "Creating entity index");
            Index::create_in_dir(&path, build_entity_schema().schema().clone())?
        };
        let schema = IndexSchema::from_schema(index.schema())?;

        Ok(Self {
            index,
            schema,
            path,
        })
    }

    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    pub(crate) fn writer(&self) -> Result<IndexWriter, IndexError> {
        Ok(self.index.writer(WRITER_HEAP_BYTES)?)
    }

    /// Reader that picks up commits, including those made by other
    /// processes sharing the directory.
    pub(crate) fn reader(&self) -> Result<IndexReader, IndexError> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;
        debug!(path = ?self.path, "Opened entity index reader");
        Ok(reader)
    }

    /// Parser over the text field where every word of a term must match.
    pub(crate) fn query_parser(&self) -> QueryParser {
        let mut parser = QueryParser::for_index(&self.index, vec![self.schema.text]);
        parser.set_conjunction_by_default();
        parser
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::entity_to_doc;
    use chrono::Utc;
    use forum_types::{Entity, Topic};
    use tempfile::TempDir;

    #[test]
    fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("index");

        let index = EntityIndex::open_or_create(&path).unwrap();

        assert!(path.join("meta.json").exists());
        assert!(index.reader().is_ok());
    }

    #[test]
    fn test_reopen_keeps_committed_documents() {
        let temp_dir = TempDir::new().unwrap();
        {
            let index = EntityIndex::open_or_create(temp_dir.path()).unwrap();
            let mut writer = index.writer().unwrap();
            let topic = Entity::Topic(Topic::new(1, "Welcome", 1, Utc::now()));
            writer
                .add_document(entity_to_doc(index.schema(), &topic))
                .unwrap();
            writer.commit().unwrap();
        }

        let reopened = EntityIndex::open_or_create(temp_dir.path()).unwrap();
        let searcher = reopened.reader().unwrap().searcher();
        assert_eq!(searcher.num_docs(), 1);
    }

    #[test]
    fn test_foreign_schema_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut builder = tantivy::schema::Schema::builder();
        builder.add_text_field("body", tantivy::schema::TEXT);
        Index::create_in_dir(temp_dir.path(), builder.build()).unwrap();

        let result = EntityIndex::open_or_create(temp_dir.path());
        assert!(matches!(result, Err(IndexError::SchemaMismatch(_))));
    }
}
