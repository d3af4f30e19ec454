//! Query assembler for docquery
//!
//! Entry point for the three request shapes:
//! 1. Offset query: filter, sort, projection, `{skip, limit}` window
//! 2. Aggregate query: match filter, `$group` body, group-key sort
//! 3. Cursor query: filter AND keyset boundary, identifier-completed sort,
//!    `limit + 1` window
//!
//! Every entry point is fail-fast: the first error aborts the compilation
//! and no partial descriptor is returned. Successful compilations are
//! logged at TRACE, rejections at WARN with the error code.

use std::sync::Arc;

use bson::{doc, Bson, Document};

use crate::config::CompilerConfig;
use crate::observability::{trace_event_with_fields, Event, MetricsRegistry};
use crate::schema::FieldTypeCatalog;

use super::aggregate::AggregateCompiler;
use super::ast::{CursorDirection, FilterNode, PageWindow, SortField};
use super::comparison::{ComparisonCompiler, OperatorTable};
use super::compiled::{CompiledAggregateQuery, CompiledCursorQuery, CompiledQuery};
use super::cursor::{CursorCodec, KeysetFilterBuilder};
use super::errors::{QueryError, QueryResult};
use super::request::{AggregateQuery, CursorQuery, PageQuery};
use super::where_clause::WhereCompiler;

/// Compiles requests into executor descriptors.
///
/// Holds only immutable configuration and is safe to share across threads.
#[derive(Debug, Clone)]
pub struct QueryAssembler {
    catalog: Arc<FieldTypeCatalog>,
    config: CompilerConfig,
    operators: OperatorTable,
    aggregates: AggregateCompiler,
    codec: CursorCodec,
    metrics: Arc<MetricsRegistry>,
}

impl QueryAssembler {
    /// Creates an assembler over a catalog and configuration
    pub fn new(catalog: Arc<FieldTypeCatalog>, config: CompilerConfig) -> Self {
        let operators = config.operator_table();
        let codec = CursorCodec::from_config(&config);
        Self {
            catalog,
            config,
            operators,
            aggregates: AggregateCompiler::new(),
            codec,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Shares an existing metrics registry
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn catalog(&self) -> &FieldTypeCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn codec(&self) -> &CursorCodec {
        &self.codec
    }

    fn comparisons(&self) -> ComparisonCompiler<'_> {
        ComparisonCompiler::new(&self.catalog, &self.operators, &self.config)
    }

    fn keyset(&self) -> KeysetFilterBuilder<'_> {
        KeysetFilterBuilder::new(&self.catalog, &self.config)
    }

    /// Compile a filter tree into a native predicate
    pub fn compile_filter(&self, filter: &FilterNode) -> QueryResult<Document> {
        WhereCompiler::new(self.comparisons()).compile(filter)
    }

    /// Compile an offset-paged query
    pub fn compile_query(&self, query: &PageQuery) -> QueryResult<CompiledQuery> {
        let result = self.build_query(query);
        self.record(Event::QueryCompiled, "query", &result);
        if result.is_ok() {
            self.metrics.increment_queries_compiled();
        }
        result
    }

    /// Compile an aggregate query over the rows matching `filter`
    pub fn compile_aggregate(
        &self,
        aggregate: &AggregateQuery,
        filter: &FilterNode,
    ) -> QueryResult<CompiledAggregateQuery> {
        let result = self.build_aggregate(aggregate, filter);
        self.record(Event::AggregateCompiled, "aggregate", &result);
        if result.is_ok() {
            self.metrics.increment_aggregates_compiled();
        }
        result
    }

    /// Compile a cursor-paged query
    pub fn compile_cursor(&self, query: &CursorQuery) -> QueryResult<CompiledCursorQuery> {
        let result = self.build_cursor(query);
        self.record(Event::CursorQueryCompiled, "cursor", &result);
        if result.is_ok() {
            self.metrics.increment_cursor_queries_compiled();
        }
        result
    }

    fn record<T>(&self, event: Event, kind: &str, result: &QueryResult<T>) {
        match result {
            Ok(_) => trace_event_with_fields(event, &[("kind", kind)]),
            Err(err) => {
                self.metrics.increment_compilations_rejected();
                trace_event_with_fields(
                    Event::CompileRejected,
                    &[
                        ("kind", kind),
                        ("code", err.code()),
                        ("error", &err.to_string()),
                    ],
                );
            }
        }
    }

    fn build_query(&self, query: &PageQuery) -> QueryResult<CompiledQuery> {
        let filter = self.compile_filter(&query.filter)?;
        let sort = self.compile_sort(&query.sort)?;
        let projection = self.compile_projection(&query.fields)?;

        Ok(CompiledQuery {
            filter,
            sort,
            projection,
            window: query.window.window(),
        })
    }

    fn build_aggregate(
        &self,
        aggregate: &AggregateQuery,
        filter: &FilterNode,
    ) -> QueryResult<CompiledAggregateQuery> {
        let filter = self.compile_filter(filter)?;
        let grouping = self.aggregates.compile(aggregate)?;
        let sort = grouping.sort();

        Ok(CompiledAggregateQuery {
            query: CompiledQuery {
                filter,
                sort,
                projection: None,
                window: PageWindow::default(),
            },
            grouping,
        })
    }

    fn build_cursor(&self, query: &CursorQuery) -> QueryResult<CompiledCursorQuery> {
        let filter = self.compile_filter(&query.filter)?;

        let keyset = self.keyset();
        let sort_fields = keyset.normalize_sort(&query.sort);
        for field in &sort_fields {
            self.check_field(&field.field)?;
        }

        let values = match query.cursor.as_deref() {
            Some(token) if !token.trim().is_empty() => {
                let values = self.codec.decode(token)?;
                trace_event_with_fields(
                    Event::CursorDecoded,
                    &[("values", &values.len().to_string())],
                );
                values
            }
            _ => Vec::new(),
        };

        let boundary = keyset.build(&sort_fields, &values, query.direction)?;
        let bounded = boundary.is_some();
        let filter = match boundary {
            None => filter,
            Some(boundary) if filter.is_empty() => boundary,
            Some(boundary) => doc! { "$and": [boundary, filter] },
        };

        let reverse = query.direction == CursorDirection::Before;
        let mut sort = Document::new();
        for field in &sort_fields {
            let direction = if reverse {
                field.direction.reversed()
            } else {
                field.direction
            };
            sort.insert(field.field.clone(), direction.as_i32());
        }

        let projection = self.compile_projection(&query.fields)?;

        Ok(CompiledCursorQuery {
            query: CompiledQuery {
                filter,
                sort: Some(sort),
                projection,
                window: PageWindow {
                    skip: None,
                    limit: Some(query.limit.saturating_add(1)),
                },
            },
            sort_fields,
            limit: query.limit,
            direction: query.direction,
            reverse,
            bounded,
        })
    }

    /// Compile a textual sort into an ordered sort document
    pub fn compile_sort(&self, sort: &[String]) -> QueryResult<Option<Document>> {
        if sort.is_empty() {
            return Ok(None);
        }

        let mut compiled = Document::new();
        for token in sort {
            let parsed = SortField::parse(token);
            let field = self.config.resolve_field(&parsed.field);
            self.check_field(field)?;
            compiled.insert(field, parsed.direction.as_i32());
        }
        Ok(Some(compiled))
    }

    /// Compile a projection list: `-field` excludes, `+field` and `field`
    /// include
    pub fn compile_projection(&self, fields: &[String]) -> QueryResult<Option<Document>> {
        if fields.is_empty() {
            return Ok(None);
        }

        let mut projection = Document::new();
        for token in fields {
            let (name, included) = match token.strip_prefix('-') {
                Some(rest) => (rest, 0),
                None => (token.strip_prefix('+').unwrap_or(token), 1),
            };
            let field = self.config.resolve_field(name);
            self.check_field(field)?;
            projection.insert(field, Bson::Int32(included));
        }
        Ok(Some(projection))
    }

    /// Strict mode rejects fields outside the catalog; the identifier is
    /// always known
    fn check_field(&self, field: &str) -> QueryResult<()> {
        if self.config.strict_validation
            && !self.config.is_id_field(field)
            && !self.catalog.contains(field)
        {
            return Err(QueryError::UnknownField(field.to_string()));
        }
        Ok(())
    }
}
