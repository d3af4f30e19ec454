//! # Cursor Codec and Keyset Filter
//!
//! A cursor token carries the sort-key values of a page boundary row:
//! URL-safe unpadded base64 over the BSON document `{ "v": [values...] }`.
//! BSON keeps every value's type, so dates and object ids round-trip
//! exactly.
//!
//! The keyset filter turns a decoded cursor into the range predicate that
//! selects the rows after (or before) the boundary.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bson::{doc, Bson, Document};

use crate::config::CompilerConfig;
use crate::schema::FieldTypeCatalog;

use super::ast::{CursorDirection, SortDirection, SortField};
use super::comparison::coerce_temporal;
use super::errors::{QueryError, QueryResult};

const VALUES_KEY: &str = "v";

/// Encodes and decodes cursor tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorCodec {
    max_token_len: usize,
}

impl CursorCodec {
    pub fn new(max_token_len: usize) -> Self {
        Self { max_token_len }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self::new(config.max_cursor_token_len)
    }

    /// Encode an ordered value list into a token
    pub fn encode(&self, values: &[Bson]) -> QueryResult<String> {
        let document = doc! { VALUES_KEY: values.to_vec() };

        let mut bytes = Vec::new();
        document
            .to_writer(&mut bytes)
            .map_err(|e| QueryError::InvalidCursor(format!("cannot encode values: {}", e)))?;

        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Decode a token into its value list. An empty token has no values.
    pub fn decode(&self, token: &str) -> QueryResult<Vec<Bson>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(Vec::new());
        }

        if token.len() > self.max_token_len {
            return Err(QueryError::InvalidCursor(format!(
                "token length {} exceeds maximum {}",
                token.len(),
                self.max_token_len
            )));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| QueryError::InvalidCursor(format!("invalid base64: {}", e)))?;

        let document = Document::from_reader(bytes.as_slice())
            .map_err(|e| QueryError::InvalidCursor(format!("invalid payload: {}", e)))?;

        match document.get(VALUES_KEY) {
            Some(Bson::Array(values)) => Ok(values.clone()),
            _ => Err(QueryError::InvalidCursor("missing value list".into())),
        }
    }
}

/// Builds keyset predicates for cursor pagination
#[derive(Debug, Clone, Copy)]
pub struct KeysetFilterBuilder<'a> {
    catalog: &'a FieldTypeCatalog,
    config: &'a CompilerConfig,
}

impl<'a> KeysetFilterBuilder<'a> {
    pub fn new(catalog: &'a FieldTypeCatalog, config: &'a CompilerConfig) -> Self {
        Self { catalog, config }
    }

    /// Parses the textual sort, renames the identifier alias and prepends
    /// the identifier ascending when the sort lacks it.
    pub fn normalize_sort(&self, sort: &[String]) -> Vec<SortField> {
        let mut fields: Vec<SortField> = sort
            .iter()
            .map(|token| {
                let parsed = SortField::parse(token);
                SortField {
                    field: self.config.resolve_field(&parsed.field).to_string(),
                    direction: parsed.direction,
                }
            })
            .collect();

        if !fields.iter().any(|f| f.field == self.config.id_field) {
            fields.insert(0, SortField::asc(self.config.id_field.as_str()));
        }

        fields
    }

    /// Comparison applied to every boundary field.
    ///
    /// Only the primary sort direction decides: after+asc and before+desc
    /// select `$gt`, the other two `$lt`.
    pub fn comparison(primary: SortDirection, direction: CursorDirection) -> &'static str {
        match (direction, primary) {
            (CursorDirection::After, SortDirection::Asc) => "$gt",
            (CursorDirection::After, SortDirection::Desc) => "$lt",
            (CursorDirection::Before, SortDirection::Asc) => "$lt",
            (CursorDirection::Before, SortDirection::Desc) => "$gt",
        }
    }

    /// Boundary predicate for a decoded cursor.
    ///
    /// Returns `None` when the cursor has no values (first page). The
    /// predicate is an `$or` over the cumulative prefixes of the sort, each
    /// prefix an `$and` of `field <cmp> value`.
    pub fn build(
        &self,
        sort: &[SortField],
        values: &[Bson],
        direction: CursorDirection,
    ) -> QueryResult<Option<Document>> {
        if values.is_empty() {
            return Ok(None);
        }

        if values.len() != sort.len() {
            return Err(QueryError::CursorLengthMismatch {
                cursor: values.len(),
                sort: sort.len(),
            });
        }

        for field in sort {
            self.check_known(&field.field)?;
        }

        let cmp = Self::comparison(sort[0].direction, direction);

        let mut prefix: Vec<Bson> = Vec::with_capacity(sort.len());
        let mut alternatives: Vec<Bson> = Vec::with_capacity(sort.len());

        for (field, value) in sort.iter().zip(values) {
            let mut bound = Document::new();
            bound.insert(field.field.clone(), doc! { cmp: self.coerce(&field.field, value) });
            prefix.push(Bson::Document(bound));
            alternatives.push(Bson::Document(doc! { "$and": prefix.clone() }));
        }

        Ok(Some(doc! { "$or": alternatives }))
    }

    fn check_known(&self, field: &str) -> QueryResult<()> {
        if self.config.strict_validation
            && !self.config.is_id_field(field)
            && !self.catalog.contains(field)
        {
            return Err(QueryError::UnknownField(field.to_string()));
        }
        Ok(())
    }

    fn coerce(&self, field: &str, value: &Bson) -> Bson {
        match self.catalog.get(field) {
            Some(kind) if kind.is_temporal() => coerce_temporal(value),
            _ => value.clone(),
        }
    }
}
