//! # Request Model
//!
//! Serde shapes of the three request kinds. Filters are parsed into the
//! typed AST while deserializing, so a malformed filter is rejected before
//! any compiler runs.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::ast::{CursorDirection, FilterNode, PageWindow};
use super::parser::parse_filter;

/// Default number of rows per cursor page
pub const DEFAULT_CURSOR_LIMIT: u64 = 10;

fn deserialize_filter<'de, D>(deserializer: D) -> Result<FilterNode, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    parse_filter(&raw).map_err(serde::de::Error::custom)
}

/// Pagination request: `{limit, offset|skip}` or `{page, size}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub skip: Option<u64>,
    /// 1-based page number
    pub page: Option<u64>,
    pub size: Option<u64>,
}

impl PageRequest {
    pub fn limit(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn page(page: u64, size: u64) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
            ..Self::default()
        }
    }

    /// Normalizes the request into a single `{skip, limit}` window.
    ///
    /// `offset`/`skip` only apply once `limit` is set, `skip` winning over
    /// `offset`. `size` then overrides the limit, and `page` sets
    /// `skip = (page - 1) * size`; page 0 is treated as page 1.
    pub fn window(&self) -> PageWindow {
        let mut window = PageWindow::default();

        if let Some(limit) = self.limit {
            window.limit = Some(limit);
            window.skip = self.skip.or(self.offset);
        }

        if let Some(size) = self.size {
            window.limit = Some(size);
            if let Some(page) = self.page {
                window.skip = Some(page.saturating_sub(1).saturating_mul(size));
            }
        }

        window
    }
}

/// Offset-paged query request
///
/// ```json
/// { "filter": {"age": {"gte": 18}}, "sort": ["-age"], "fields": ["-secret"], "page": 2, "size": 20 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    #[serde(deserialize_with = "deserialize_filter")]
    pub filter: FilterNode,
    pub sort: Vec<String>,
    pub fields: Vec<String>,
    #[serde(flatten)]
    pub window: PageRequest,
}

impl PageQuery {
    pub fn new(filter: FilterNode) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn with_sort<I, S>(mut self, sort: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort = sort.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_window(mut self, window: PageRequest) -> Self {
        self.window = window;
        self
    }
}

/// Aggregate request: group-by fields plus per-function field lists
///
/// ```json
/// { "groupBy": ["country"], "count": ["country"], "avg": ["age"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AggregateQuery {
    pub group_by: Vec<String>,
    pub count: Vec<String>,
    pub sum: Vec<String>,
    pub avg: Vec<String>,
    pub max: Vec<String>,
    pub min: Vec<String>,
}

impl AggregateQuery {
    /// Returns true if no function field is requested
    pub fn has_no_functions(&self) -> bool {
        self.count.is_empty()
            && self.sum.is_empty()
            && self.avg.is_empty()
            && self.max.is_empty()
            && self.min.is_empty()
    }
}

/// Aggregate request together with its match filter, as read by the CLI
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AggregateRequest {
    #[serde(deserialize_with = "deserialize_filter")]
    pub filter: FilterNode,
    #[serde(flatten)]
    pub aggregate: AggregateQuery,
}

fn default_cursor_limit() -> u64 {
    DEFAULT_CURSOR_LIMIT
}

/// Cursor-paged query request
///
/// ```json
/// { "filter": {}, "sort": ["-age"], "cursor": "<token>", "direction": "after", "limit": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CursorQuery {
    #[serde(deserialize_with = "deserialize_filter")]
    pub filter: FilterNode,
    pub sort: Vec<String>,
    pub fields: Vec<String>,
    /// Boundary token; absent or empty means first page
    pub cursor: Option<String>,
    pub direction: CursorDirection,
    #[serde(default = "default_cursor_limit")]
    pub limit: u64,
}

impl Default for CursorQuery {
    fn default() -> Self {
        Self {
            filter: FilterNode::new(),
            sort: Vec::new(),
            fields: Vec::new(),
            cursor: None,
            direction: CursorDirection::After,
            limit: DEFAULT_CURSOR_LIMIT,
        }
    }
}

impl CursorQuery {
    pub fn new(filter: FilterNode, limit: u64) -> Self {
        Self {
            filter,
            limit,
            ..Self::default()
        }
    }

    pub fn with_sort<I, S>(mut self, sort: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort = sort.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self.direction = CursorDirection::After;
        self
    }

    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self.direction = CursorDirection::Before;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_window_limit_offset() {
        let request = PageRequest {
            limit: Some(10),
            offset: Some(30),
            ..PageRequest::default()
        };
        assert_eq!(
            request.window(),
            PageWindow {
                skip: Some(30),
                limit: Some(10)
            }
        );
    }

    #[test]
    fn test_window_skip_wins_over_offset() {
        let request = PageRequest {
            limit: Some(10),
            offset: Some(30),
            skip: Some(5),
            ..PageRequest::default()
        };
        assert_eq!(request.window().skip, Some(5));
    }

    #[test]
    fn test_window_offset_ignored_without_limit() {
        let request = PageRequest {
            offset: Some(30),
            ..PageRequest::default()
        };
        assert_eq!(request.window(), PageWindow::default());
    }

    #[test]
    fn test_window_page_is_one_based() {
        assert_eq!(
            PageRequest::page(1, 20).window(),
            PageWindow {
                skip: Some(0),
                limit: Some(20)
            }
        );
        assert_eq!(PageRequest::page(3, 20).window().skip, Some(40));
        assert_eq!(PageRequest::page(0, 20).window().skip, Some(0));
    }

    #[test]
    fn test_page_query_deserialize() {
        let query: PageQuery = serde_json::from_value(json!({
            "filter": {"age": {"gt": 18}},
            "sort": ["-age"],
            "page": 2,
            "size": 5
        }))
        .unwrap();

        assert_eq!(query.sort, vec!["-age"]);
        assert_eq!(query.filter.fields().count(), 1);
        assert_eq!(query.window.window().skip, Some(5));
    }

    #[test]
    fn test_page_query_rejects_bad_filter() {
        let result: Result<PageQuery, _> =
            serde_json::from_value(json!({"filter": {"and": "nope"}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_aggregate_query_deserialize() {
        let query: AggregateQuery =
            serde_json::from_value(json!({"groupBy": ["country"], "count": ["country"]}))
                .unwrap();
        assert_eq!(query.group_by, vec!["country"]);
        assert!(!query.has_no_functions());
        assert!(AggregateQuery::default().has_no_functions());
    }

    #[test]
    fn test_cursor_query_defaults() {
        let query: CursorQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(query.limit, DEFAULT_CURSOR_LIMIT);
        assert_eq!(query.direction, CursorDirection::After);
        assert!(query.cursor.is_none());

        let query: CursorQuery =
            serde_json::from_value(json!({"direction": "before", "limit": 3})).unwrap();
        assert_eq!(query.direction, CursorDirection::Before);
        assert_eq!(query.limit, 3);
    }
}
