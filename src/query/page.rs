//! # Cursor Pages
//!
//! Post-processing of rows fetched for a [`CompiledCursorQuery`]: the extra
//! sentinel row is dropped, `before` pages are put back in requested order,
//! and boundary cursors are encoded from the first and last rows.

use bson::{Bson, Document};

use super::ast::{CursorDirection, SortField};
use super::compiled::CompiledCursorQuery;
use super::cursor::CursorCodec;
use super::errors::QueryResult;

/// One page of a cursor-paged query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CursorPage {
    pub rows: Vec<Document>,
    pub has_next: bool,
    pub has_previous: bool,
    /// Cursor of the first row, for paging backwards
    pub start_cursor: Option<String>,
    /// Cursor of the last row, for paging forwards
    pub end_cursor: Option<String>,
}

impl CursorPage {
    /// Build a page from the rows the store returned
    pub fn from_rows(
        compiled: &CompiledCursorQuery,
        mut rows: Vec<Document>,
        codec: &CursorCodec,
    ) -> QueryResult<Self> {
        let limit = usize::try_from(compiled.limit).unwrap_or(usize::MAX);
        let has_more = rows.len() > limit;
        rows.truncate(limit);

        if compiled.reverse {
            rows.reverse();
        }

        let start_cursor = match rows.first() {
            Some(row) => Some(codec.encode(&sort_key(row, &compiled.sort_fields))?),
            None => None,
        };
        let end_cursor = match rows.last() {
            Some(row) => Some(codec.encode(&sort_key(row, &compiled.sort_fields))?),
            None => None,
        };

        // The sentinel row reports the side being paged toward; the side
        // the cursor came from exists whenever a boundary was applied.
        let (has_next, has_previous) = match compiled.direction {
            CursorDirection::After => (has_more, compiled.bounded),
            CursorDirection::Before => (compiled.bounded, has_more),
        };

        Ok(Self {
            rows,
            has_next,
            has_previous,
            start_cursor,
            end_cursor,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sort-key values of a row; missing fields are null
pub fn sort_key(row: &Document, sort: &[SortField]) -> Vec<Bson> {
    sort.iter()
        .map(|field| lookup_path(row, &field.field).cloned().unwrap_or(Bson::Null))
        .collect()
}

/// Dotted path lookup through nested documents
pub fn lookup_path<'d>(row: &'d Document, path: &str) -> Option<&'d Bson> {
    let mut segments = path.split('.');
    let mut current = row.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            _ => return None,
        };
    }

    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::compiled::CompiledQuery;
    use bson::doc;

    fn compiled(limit: u64, direction: CursorDirection) -> CompiledCursorQuery {
        CompiledCursorQuery {
            query: CompiledQuery::default(),
            sort_fields: vec![SortField::asc("_id"), SortField::desc("profile.age")],
            limit,
            direction,
            reverse: direction == CursorDirection::Before,
            bounded: false,
        }
    }

    fn bounded(limit: u64, direction: CursorDirection) -> CompiledCursorQuery {
        CompiledCursorQuery {
            bounded: true,
            ..compiled(limit, direction)
        }
    }

    fn rows(ids: &[i32]) -> Vec<Document> {
        ids.iter()
            .map(|id| doc! { "_id": *id, "profile": { "age": 20 + *id } })
            .collect()
    }

    #[test]
    fn test_trims_sentinel_row() {
        let codec = CursorCodec::new(1024);
        let page = CursorPage::from_rows(&compiled(1, CursorDirection::After), rows(&[1, 2]), &codec)
            .unwrap();

        assert!(page.has_next);
        assert!(!page.has_previous);
        assert_eq!(page.len(), 1);
        assert_eq!(page.rows[0].get_i32("_id").unwrap(), 1);
    }

    #[test]
    fn test_last_page() {
        let codec = CursorCodec::new(1024);
        let page = CursorPage::from_rows(&compiled(5, CursorDirection::After), rows(&[1, 2]), &codec)
            .unwrap();
        assert!(!page.has_next);
        assert_eq!(page.len(), 2);
    }

    #[test]
    fn test_before_page_is_reversed() {
        let codec = CursorCodec::new(1024);
        let page = CursorPage::from_rows(&compiled(2, CursorDirection::Before), rows(&[9, 8, 7]), &codec)
            .unwrap();

        assert!(page.has_previous);
        assert!(!page.has_next);
        let ids: Vec<i32> = page.rows.iter().map(|r| r.get_i32("_id").unwrap()).collect();
        assert_eq!(ids, vec![8, 9]);
    }

    #[test]
    fn test_bounded_before_page_has_next() {
        let codec = CursorCodec::new(1024);
        let page = CursorPage::from_rows(&bounded(2, CursorDirection::Before), rows(&[6, 5]), &codec)
            .unwrap();

        assert!(page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn test_bounded_after_page_has_previous() {
        let codec = CursorCodec::new(1024);
        let page = CursorPage::from_rows(&bounded(2, CursorDirection::After), rows(&[3, 4]), &codec)
            .unwrap();

        assert!(page.has_previous);
        assert!(!page.has_next);
    }

    #[test]
    fn test_boundary_cursors() {
        let codec = CursorCodec::new(1024);
        let page = CursorPage::from_rows(&compiled(3, CursorDirection::After), rows(&[1, 2]), &codec)
            .unwrap();

        let start = codec.decode(page.start_cursor.as_deref().unwrap()).unwrap();
        let end = codec.decode(page.end_cursor.as_deref().unwrap()).unwrap();
        assert_eq!(start, vec![Bson::Int32(1), Bson::Int32(21)]);
        assert_eq!(end, vec![Bson::Int32(2), Bson::Int32(22)]);
    }

    #[test]
    fn test_empty_page() {
        let codec = CursorCodec::new(1024);
        let page = CursorPage::from_rows(&compiled(3, CursorDirection::After), vec![], &codec).unwrap();
        assert!(page.is_empty());
        assert!(page.start_cursor.is_none());
        assert!(page.end_cursor.is_none());
    }

    #[test]
    fn test_lookup_path() {
        let row = doc! { "a": { "b": { "c": 1 } }, "x": 2 };
        assert_eq!(lookup_path(&row, "a.b.c"), Some(&Bson::Int32(1)));
        assert_eq!(lookup_path(&row, "x"), Some(&Bson::Int32(2)));
        assert_eq!(lookup_path(&row, "x.y"), None);
        assert_eq!(sort_key(&row, &[SortField::asc("missing")]), vec![Bson::Null]);
    }
}
