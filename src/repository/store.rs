//! Repository glue
//!
//! Compiles a request, forwards the descriptor to the store as-is and
//! post-processes the rows. Nothing is sent to the store when compilation
//! fails.

use bson::Document;

use crate::query::{
    AggregateQuery, AggregateResponse, CompiledQuery, CursorPage, CursorQuery, FilterNode,
    PageQuery, QueryAssembler,
};

use super::errors::{RepositoryResult, StoreError};

/// Executor of compiled queries
pub trait DocumentStore {
    /// Run a find with filter, sort, projection and window
    fn find(&self, query: &CompiledQuery) -> Result<Vec<Document>, StoreError>;

    /// Run an aggregation pipeline
    fn aggregate(&self, pipeline: &[Document]) -> Result<Vec<Document>, StoreError>;

    /// Count the documents matching a filter
    fn count(&self, filter: &Document) -> Result<u64, StoreError>;
}

/// Query front end over one collection
#[derive(Debug)]
pub struct Repository<S: DocumentStore> {
    store: S,
    assembler: QueryAssembler,
}

impl<S: DocumentStore> Repository<S> {
    pub fn new(store: S, assembler: QueryAssembler) -> Self {
        Self { store, assembler }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn assembler(&self) -> &QueryAssembler {
        &self.assembler
    }

    /// Offset-paged query
    pub fn query(&self, query: &PageQuery) -> RepositoryResult<Vec<Document>> {
        let compiled = self.assembler.compile_query(query)?;
        Ok(self.store.find(&compiled)?)
    }

    /// Number of documents matching a filter
    pub fn count(&self, filter: &FilterNode) -> RepositoryResult<u64> {
        let compiled = self.assembler.compile_filter(filter)?;
        Ok(self.store.count(&compiled)?)
    }

    /// Grouped aggregate, one response per group
    pub fn aggregate(
        &self,
        aggregate: &AggregateQuery,
        filter: &FilterNode,
    ) -> RepositoryResult<Vec<AggregateResponse>> {
        let compiled = self.assembler.compile_aggregate(aggregate, filter)?;
        let rows = self.store.aggregate(&compiled.pipeline())?;
        Ok(compiled.decode(&rows)?)
    }

    /// One page of a cursor-paged query
    pub fn cursor_query(&self, query: &CursorQuery) -> RepositoryResult<CursorPage> {
        let compiled = self.assembler.compile_cursor(query)?;
        let rows = self.store.find(&compiled.query)?;
        Ok(CursorPage::from_rows(&compiled, rows, self.assembler.codec())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use bson::doc;

    use crate::config::CompilerConfig;
    use crate::query::Operator;
    use crate::repository::RepositoryError;
    use crate::schema::{FieldTypeCatalog, TypeKind};

    /// Returns canned rows and records what it was asked to run
    #[derive(Default)]
    struct CannedStore {
        rows: Vec<Document>,
        fail: bool,
        finds: Mutex<Vec<CompiledQuery>>,
        pipelines: Mutex<Vec<Vec<Document>>>,
    }

    impl DocumentStore for CannedStore {
        fn find(&self, query: &CompiledQuery) -> Result<Vec<Document>, StoreError> {
            if self.fail {
                return Err(StoreError::new("unavailable"));
            }
            self.finds.lock().unwrap().push(query.clone());
            Ok(self.rows.clone())
        }

        fn aggregate(&self, pipeline: &[Document]) -> Result<Vec<Document>, StoreError> {
            self.pipelines.lock().unwrap().push(pipeline.to_vec());
            Ok(self.rows.clone())
        }

        fn count(&self, _filter: &Document) -> Result<u64, StoreError> {
            Ok(self.rows.len() as u64)
        }
    }

    fn repository(store: CannedStore) -> Repository<CannedStore> {
        let catalog = FieldTypeCatalog::with_fields([("age", TypeKind::Int)]);
        let assembler = QueryAssembler::new(Arc::new(catalog), CompilerConfig::default());
        Repository::new(store, assembler)
    }

    #[test]
    fn test_query_forwards_compiled() {
        let repo = repository(CannedStore {
            rows: vec![doc! { "_id": 1 }],
            ..CannedStore::default()
        });

        let query = PageQuery::new(FilterNode::new().with_field("age", Operator::Lt, "30"));
        let rows = repo.query(&query).unwrap();

        assert_eq!(rows.len(), 1);
        let finds = repo.store().finds.lock().unwrap();
        assert_eq!(finds[0].filter, doc! { "age": { "$lt": 30 } });
    }

    #[test]
    fn test_compile_error_skips_store() {
        let repo = repository(CannedStore::default());
        let query = PageQuery::new(FilterNode::new().with_field("age", Operator::In, 3));

        let err = repo.query(&query).unwrap_err();
        assert_eq!(err.code(), "QUERY_INVALID_VALUE");
        assert!(repo.store().finds.lock().unwrap().is_empty());
    }

    #[test]
    fn test_store_error() {
        let repo = repository(CannedStore {
            fail: true,
            ..CannedStore::default()
        });
        let err = repo.query(&PageQuery::default()).unwrap_err();
        assert!(matches!(err, RepositoryError::Store(_)));
    }

    #[test]
    fn test_count() {
        let repo = repository(CannedStore {
            rows: vec![doc! {}, doc! {}],
            ..CannedStore::default()
        });
        assert_eq!(repo.count(&FilterNode::new()).unwrap(), 2);
    }

    #[test]
    fn test_aggregate_decodes_rows() {
        let repo = repository(CannedStore {
            rows: vec![
                doc! { "_id": { "group_by_country": "cn" }, "count_country": 3 },
                doc! { "_id": { "group_by_country": "fr" }, "count_country": 1 },
            ],
            ..CannedStore::default()
        });
        let aggregate = AggregateQuery {
            group_by: vec!["country".into()],
            count: vec!["country".into()],
            ..AggregateQuery::default()
        };

        let responses = repo.aggregate(&aggregate, &FilterNode::new()).unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(
            responses[1].to_record(),
            doc! { "country": "fr", "count_country": 1 }
        );
        assert_eq!(repo.store().pipelines.lock().unwrap()[0].len(), 3);
    }

    #[test]
    fn test_cursor_query_pages() {
        let repo = repository(CannedStore {
            rows: vec![doc! { "_id": 1 }, doc! { "_id": 2 }],
            ..CannedStore::default()
        });

        let page = repo.cursor_query(&CursorQuery::new(FilterNode::new(), 1)).unwrap();
        assert!(page.has_next);
        assert_eq!(page.rows, vec![doc! { "_id": 1 }]);

        let finds = repo.store().finds.lock().unwrap();
        assert_eq!(finds[0].window.limit, Some(2));
    }
}
