//! # Compiled Descriptors
//!
//! What the assembler hands to the executor. Everything here is an owned
//! value built per request; nothing refers back to the compiler.

use bson::{doc, Bson, Document};

use super::aggregate::{AggregateGrouping, AggregateResponse};
use super::ast::{CursorDirection, PageWindow, SortField};
use super::errors::QueryResult;

/// Predicate, sort, projection and window of one find call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledQuery {
    pub filter: Document,
    /// Ordered field → `1` / `-1`
    pub sort: Option<Document>,
    /// Field → `0` / `1`
    pub projection: Option<Document>,
    pub window: PageWindow,
}

impl CompiledQuery {
    /// Single document form, as rendered by the CLI
    pub fn to_document(&self) -> Document {
        let mut rendered = doc! { "filter": self.filter.clone() };
        if let Some(sort) = &self.sort {
            rendered.insert("sort", sort.clone());
        }
        if let Some(projection) = &self.projection {
            rendered.insert("projection", projection.clone());
        }
        if let Some(skip) = self.window.skip {
            rendered.insert("skip", window_value(skip));
        }
        if let Some(limit) = self.window.limit {
            rendered.insert("limit", window_value(limit));
        }
        rendered
    }
}

fn window_value(value: u64) -> Bson {
    i64::try_from(value)
        .map(Bson::Int64)
        .unwrap_or(Bson::Int64(i64::MAX))
}

/// Compiled aggregate: match filter plus grouping
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledAggregateQuery {
    pub query: CompiledQuery,
    pub grouping: AggregateGrouping,
}

impl CompiledAggregateQuery {
    /// `[$match, $group, $sort?]` stages
    pub fn pipeline(&self) -> Vec<Document> {
        let mut stages = vec![
            doc! { "$match": self.query.filter.clone() },
            doc! { "$group": self.grouping.group.clone() },
        ];
        if let Some(sort) = &self.query.sort {
            stages.push(doc! { "$sort": sort.clone() });
        }
        stages
    }

    /// Decode grouped result rows
    pub fn decode(&self, rows: &[Document]) -> QueryResult<Vec<AggregateResponse>> {
        self.grouping.decode(rows)
    }

    pub fn to_document(&self) -> Document {
        let columns: Vec<String> = self
            .grouping
            .columns
            .iter()
            .map(|column| column.alias())
            .collect();

        doc! { "pipeline": self.pipeline(), "columns": columns }
    }
}

/// Compiled cursor page request
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCursorQuery {
    /// Window limit is `limit + 1`; the extra row signals another page
    pub query: CompiledQuery,
    /// Effective sort, identifier included, in requested order
    pub sort_fields: Vec<SortField>,
    /// Rows the caller asked for
    pub limit: u64,
    pub direction: CursorDirection,
    /// Store sort is inverted; rows must be reversed after fetching
    pub reverse: bool,
    /// A cursor boundary was applied, so rows exist on its far side
    pub bounded: bool,
}

impl CompiledCursorQuery {
    pub fn to_document(&self) -> Document {
        let mut rendered = self.query.to_document();
        rendered.insert("reverse", self.reverse);
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::aggregate::AggregateCompiler;
    use crate::query::request::AggregateQuery;

    #[test]
    fn test_query_document() {
        let query = CompiledQuery {
            filter: doc! { "age": { "$gt": 1 } },
            sort: Some(doc! { "age": -1 }),
            projection: None,
            window: PageWindow {
                skip: Some(20),
                limit: Some(10),
            },
        };

        assert_eq!(
            query.to_document(),
            doc! {
                "filter": { "age": { "$gt": 1 } },
                "sort": { "age": -1 },
                "skip": 20_i64,
                "limit": 10_i64,
            }
        );
    }

    #[test]
    fn test_pipeline_stages() {
        let grouping = AggregateCompiler::new()
            .compile(&AggregateQuery {
                sum: vec!["amount".into()],
                ..AggregateQuery::default()
            })
            .unwrap();

        let compiled = CompiledAggregateQuery {
            query: CompiledQuery::default(),
            grouping,
        };

        let pipeline = compiled.pipeline();
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline[0], doc! { "$match": {} });
        assert!(pipeline[1].get_document("$group").unwrap().contains_key("sum_amount"));
    }
}
