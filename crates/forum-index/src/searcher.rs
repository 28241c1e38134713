//! Ranked entity search using BM25 scoring.

use std::cmp::Ordering;

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{IndexReader, TantivyDocument, Term};
use tracing::{debug, warn};

use forum_types::EntityType;

use crate::error::IndexError;
use crate::index::EntityIndex;
use crate::schema::IndexSchema;

/// Restricts matches to entities owned by one user, topic or category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeFilter {
    User(u64),
    Topic(u64),
    Category(u64),
}

/// What to search for besides the term itself.
#[derive(Debug, Clone)]
pub struct IndexQuery {
    /// Entity types to match (empty = all types)
    pub doc_types: Vec<EntityType>,
    pub scope: Option<ScopeFilter>,
    pub limit: usize,
}

impl IndexQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            doc_types: Vec::new(),
            scope: None,
            limit,
        }
    }

    pub fn with_doc_type(mut self, doc_type: EntityType) -> Self {
        self.doc_types.push(doc_type);
        self
    }

    pub fn with_scope(mut self, scope: Option<ScopeFilter>) -> Self {
        self.scope = scope;
        self
    }
}

/// A ranked match.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub entity_type: EntityType,
    pub entity_id: u64,
    pub user_id: Option<u64>,
    pub topic_id: Option<u64>,
    pub category_id: Option<u64>,
    /// BM25 relevance score
    pub score: f32,
    pub created_at_ms: i64,
}

/// Ordering used for all hit lists: score descending, then newest first,
/// then lowest id, then entity type.
pub fn hit_order(a: &IndexHit, b: &IndexHit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(b.created_at_ms.cmp(&a.created_at_ms))
        .then(a.entity_id.cmp(&b.entity_id))
        .then(a.entity_type.cmp(&b.entity_type))
}

/// Searcher for ranked entity matches.
pub struct EntitySearcher {
    reader: IndexReader,
    schema: IndexSchema,
    query_parser: QueryParser,
}

impl EntitySearcher {
    /// Create a new searcher from an EntityIndex.
    pub fn new(index: &EntityIndex) -> Result<Self, IndexError> {
        Ok(Self {
            reader: index.reader()?,
            schema: index.schema().clone(),
            query_parser: index.query_parser(),
        })
    }

    fn scope_field(&self, scope: ScopeFilter) -> (Field, u64) {
        match scope {
            ScopeFilter::User(id) => (self.schema.user_id, id),
            ScopeFilter::Topic(id) => (self.schema.topic_id, id),
            ScopeFilter::Category(id) => (self.schema.category_id, id),
        }
    }

    /// Search with a free-text term.
    ///
    /// The term is parsed leniently: syntax the query language cannot
    /// understand is dropped rather than rejected. A blank term or zero limit
    /// returns no hits.
    pub fn search(&self, term: &str, query: &IndexQuery) -> Result<Vec<IndexHit>, IndexError> {
        if term.trim().is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }

        let (text_query, parse_errors) = self.query_parser.parse_query_lenient(term);
        if !parse_errors.is_empty() {
            debug!(term, errors = parse_errors.len(), "Ignored unparseable query syntax");
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = vec![(Occur::Must, text_query)];

        if !query.doc_types.is_empty() {
            let type_clauses: Vec<(Occur, Box<dyn Query>)> = query
                .doc_types
                .iter()
                .map(|t| {
                    let term = Term::from_field_text(self.schema.doc_type, t.as_str());
                    let q: Box<dyn Query> =
                        Box::new(TermQuery::new(term, IndexRecordOption::Basic));
                    (Occur::Should, q)
                })
                .collect();
            clauses.push((Occur::Must, Box::new(BooleanQuery::new(type_clauses))));
        }

        if let Some(scope) = query.scope {
            let (field, id) = self.scope_field(scope);
            let scope_term = Term::from_field_u64(field, id);
            clauses.push((
                Occur::Must,
                Box::new(TermQuery::new(scope_term, IndexRecordOption::Basic)),
            ));
        }

        let final_query = BooleanQuery::new(clauses);
        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&final_query, &TopDocs::with_limit(query.limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;

            let doc_type = doc
                .get_first(self.schema.doc_type)
                .and_then(|v| v.as_str())
                .and_then(EntityType::parse);
            let entity_id = doc
                .get_first(self.schema.entity_id)
                .and_then(|v| v.as_u64());

            let (Some(entity_type), Some(entity_id)) = (doc_type, entity_id) else {
                warn!(?doc_address, "Skipping index document without type or id");
                continue;
            };

            let u64_field = |field: Field| doc.get_first(field).and_then(|v| v.as_u64());

            hits.push(IndexHit {
                entity_type,
                entity_id,
                user_id: u64_field(self.schema.user_id),
                topic_id: u64_field(self.schema.topic_id),
                category_id: u64_field(self.schema.category_id),
                score,
                created_at_ms: doc
                    .get_first(self.schema.created_at_ms)
                    .and_then(|v| v.as_i64())
                    .unwrap_or_default(),
            });
        }

        hits.sort_by(hit_order);

        debug!(term, hits = hits.len(), "Entity index search complete");
        Ok(hits)
    }

    /// Get the number of indexed documents.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::EntityIndexer;
    use chrono::{TimeZone, Utc};
    use forum_types::{Entity, Post, Topic, User};
    use tempfile::TempDir;

    fn at(ms: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn setup(entities: Vec<Entity>) -> (TempDir, EntitySearcher) {
        let temp_dir = TempDir::new().unwrap();
        let index = EntityIndex::open_or_create(temp_dir.path()).unwrap();
        let indexer = EntityIndexer::new(&index).unwrap();
        indexer.index_entities(&entities).unwrap();
        indexer.commit().unwrap();
        let searcher = EntitySearcher::new(&index).unwrap();
        (temp_dir, searcher)
    }

    fn sample_entities() -> Vec<Entity> {
        vec![
            Entity::Topic(Topic::new(1, "Rust memory safety", 10, at(1_000)).with_category(5)),
            Entity::Post(
                Post::new(100, 1, 10, "The borrow checker keeps memory safe", at(2_000))
                    .with_category(Some(5)),
            ),
            Entity::Post(Post::new(101, 2, 11, "Python memory profiling", at(3_000))),
            Entity::User(User::new(10, "ferris", at(500)).with_name("Ferris Crab")),
        ]
    }

    #[test]
    fn test_search_all_types() {
        let (_temp_dir, searcher) = setup(sample_entities());

        let hits = searcher.search("memory", &IndexQuery::new(10)).unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.score > 0.0));
    }

    #[test]
    fn test_doc_type_filter() {
        let (_temp_dir, searcher) = setup(sample_entities());

        let hits = searcher
            .search("memory", &IndexQuery::new(10).with_doc_type(EntityType::Post))
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.entity_type == EntityType::Post));

        let hits = searcher
            .search(
                "memory",
                &IndexQuery::new(10)
                    .with_doc_type(EntityType::Post)
                    .with_doc_type(EntityType::Topic),
            )
            .unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_scope_filters() {
        let (_temp_dir, searcher) = setup(sample_entities());

        let by_user = searcher
            .search(
                "memory",
                &IndexQuery::new(10).with_scope(Some(ScopeFilter::User(10))),
            )
            .unwrap();
        let ids: Vec<u64> = by_user.iter().map(|h| h.entity_id).collect();
        assert_eq!(by_user.len(), 2);
        assert!(ids.contains(&1));
        assert!(ids.contains(&100));

        let by_topic = searcher
            .search(
                "memory",
                &IndexQuery::new(10)
                    .with_doc_type(EntityType::Post)
                    .with_scope(Some(ScopeFilter::Topic(2))),
            )
            .unwrap();
        assert_eq!(by_topic.len(), 1);
        assert_eq!(by_topic[0].entity_id, 101);

        let by_category = searcher
            .search(
                "memory",
                &IndexQuery::new(10).with_scope(Some(ScopeFilter::Category(5))),
            )
            .unwrap();
        assert_eq!(by_category.len(), 2);
    }

    #[test]
    fn test_all_words_must_match() {
        let (_temp_dir, searcher) = setup(sample_entities());

        let hits = searcher
            .search("python memory", &IndexQuery::new(10))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity_id, 101);
    }

    #[test]
    fn test_hit_carries_scope_ids() {
        let (_temp_dir, searcher) = setup(sample_entities());

        let hits = searcher
            .search("borrow", &IndexQuery::new(10))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].topic_id, Some(1));
        assert_eq!(hits[0].user_id, Some(10));
        assert_eq!(hits[0].category_id, Some(5));
        assert_eq!(hits[0].created_at_ms, 2_000);
    }

    #[test]
    fn test_ties_break_newest_first_then_lowest_id() {
        let entities = vec![
            Entity::Post(Post::new(3, 1, 1, "wookie", at(1_000))),
            Entity::Post(Post::new(1, 1, 1, "wookie", at(1_000))),
            Entity::Post(Post::new(2, 1, 1, "wookie", at(5_000))),
        ];
        let (_temp_dir, searcher) = setup(entities);

        let hits = searcher.search("wookie", &IndexQuery::new(10)).unwrap();
        let ids: Vec<u64> = hits.iter().map(|h| h.entity_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let again = searcher.search("wookie", &IndexQuery::new(10)).unwrap();
        assert_eq!(hits, again);
    }

    #[test]
    fn test_username_matches() {
        let (_temp_dir, searcher) = setup(sample_entities());

        let hits = searcher
            .search("ferris", &IndexQuery::new(10).with_doc_type(EntityType::User))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity_id, 10);
    }

    #[test]
    fn test_blank_term_and_zero_limit() {
        let (_temp_dir, searcher) = setup(sample_entities());

        assert!(searcher.search("   ", &IndexQuery::new(10)).unwrap().is_empty());
        assert!(searcher.search("memory", &IndexQuery::new(0)).unwrap().is_empty());
    }

    #[test]
    fn test_unbalanced_syntax_does_not_fail() {
        let (_temp_dir, searcher) = setup(sample_entities());

        let hits = searcher.search("memory \"(", &IndexQuery::new(10));
        assert!(hits.is_ok());
    }

    #[test]
    fn test_limit_and_num_docs() {
        let (_temp_dir, searcher) = setup(sample_entities());

        let hits = searcher.search("memory", &IndexQuery::new(1)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(searcher.num_docs(), 4);
    }
}
