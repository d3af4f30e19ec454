//! # Comparison Compiler
//!
//! Compiles one `(field, operator, value)` triple into a native predicate
//! document, coercing the value by the field's catalog type first.
//!
//! Coercion never fails. Unparsable booleans become `false`, unparsable
//! numbers become zero and unparsable dates keep their original string.
//! Shape errors (`in` without a list, `between` without bounds, unknown
//! operator names) are hard errors.

use std::collections::BTreeMap;

use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use chrono::DateTime;

use crate::config::CompilerConfig;
use crate::schema::{FieldTypeCatalog, TypeKind};

use super::ast::{Comparison, Operator};
use super::errors::{QueryError, QueryResult};

const LOWER_KEY: &str = "lower";
const UPPER_KEY: &str = "upper";

/// Operator name → native comparison operator
///
/// Built once from the defaults plus configured overrides, then shared
/// read-only by every compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorTable {
    entries: BTreeMap<String, String>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        let entries = [
            ("eq", "$eq"),
            ("neq", "$ne"),
            ("gt", "$gt"),
            ("gte", "$gte"),
            ("lt", "$lt"),
            ("lte", "$lte"),
            ("in", "$in"),
            ("notin", "$nin"),
            ("is", "$eq"),
            ("isnot", "$ne"),
        ]
        .into_iter()
        .map(|(name, native)| (name.to_string(), native.to_string()))
        .collect();

        Self { entries }
    }
}

impl OperatorTable {
    /// Merge overrides over this table. Names are lower-cased.
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, native) in overrides {
            self.entries.insert(name.to_lowercase(), native.to_string());
        }
        self
    }

    /// Native operator for a lower-case operator name
    pub fn native(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }
}

/// Leaf compiler for single comparisons
#[derive(Debug, Clone, Copy)]
pub struct ComparisonCompiler<'a> {
    catalog: &'a FieldTypeCatalog,
    operators: &'a OperatorTable,
    config: &'a CompilerConfig,
}

impl<'a> ComparisonCompiler<'a> {
    pub fn new(
        catalog: &'a FieldTypeCatalog,
        operators: &'a OperatorTable,
        config: &'a CompilerConfig,
    ) -> Self {
        Self {
            catalog,
            operators,
            config,
        }
    }

    /// Compile one comparison on `field` into `{field: {$op: value}}`
    pub fn compile(&self, field: &str, comparison: &Comparison) -> QueryResult<Document> {
        let target = self.config.resolve_field(field);
        let operator = &comparison.operator;

        if operator.is_range() {
            let (lower, upper) = self.range_bounds(target, comparison)?;
            let bounds = if *operator == Operator::Between {
                doc! { "$gte": lower, "$lte": upper }
            } else {
                doc! { "$lt": lower, "$gt": upper }
            };
            return Ok(doc! { target: bounds });
        }

        let native = self
            .operators
            .native(operator.name())
            .ok_or_else(|| QueryError::unknown_operator(field, operator.name()))?;

        if operator.requires_list() && !matches!(comparison.value, Bson::Array(_)) {
            return Err(QueryError::invalid_value(
                field,
                operator.name(),
                format!("expected a list, got {:?}", comparison.value.element_type()),
            ));
        }

        let value = self.coerce(target, &comparison.value);
        Ok(doc! { target: { native: value } })
    }

    /// Coerce a value by the (already resolved) field's type
    pub fn coerce(&self, field: &str, value: &Bson) -> Bson {
        if self.config.is_id_field(field) {
            return coerce_identifier(value);
        }

        match self.catalog.get(field) {
            Some(kind) => coerce_to_kind(kind, value),
            None => value.clone(),
        }
    }

    fn range_bounds(&self, field: &str, comparison: &Comparison) -> QueryResult<(Bson, Bson)> {
        let name = comparison.operator.name();
        let bounds = comparison.value.as_document().ok_or_else(|| {
            QueryError::invalid_value(field, name, "expected an object with lower and upper")
        })?;

        let bound = |key: &str| -> QueryResult<Bson> {
            match bounds.get(key) {
                None | Some(Bson::Null) => Err(QueryError::invalid_value(
                    field,
                    name,
                    format!("missing {}", key),
                )),
                Some(value) => Ok(self.coerce(field, value)),
            }
        };

        Ok((bound(LOWER_KEY)?, bound(UPPER_KEY)?))
    }
}

/// Hex identifier strings become native object ids, lists element-wise.
/// Any other shape passes through untouched.
pub fn coerce_identifier(value: &Bson) -> Bson {
    match value {
        Bson::Array(items) => Bson::Array(items.iter().map(coerce_identifier).collect()),
        Bson::String(s) => match ObjectId::parse_str(s) {
            Ok(oid) => Bson::ObjectId(oid),
            Err(_) => value.clone(),
        },
        other => other.clone(),
    }
}

/// Coerce a value to a catalog type kind. Lists coerce element-wise.
pub fn coerce_to_kind(kind: TypeKind, value: &Bson) -> Bson {
    if let Bson::Array(items) = value {
        return Bson::Array(items.iter().map(|item| coerce_to_kind(kind, item)).collect());
    }

    match kind {
        TypeKind::Bool => match value {
            Bson::Null => Bson::Null,
            Bson::Boolean(b) => Bson::Boolean(*b),
            Bson::String(s) => Bson::Boolean(parse_bool(s)),
            _ => Bson::Boolean(false),
        },
        TypeKind::Date | TypeKind::Timestamp => coerce_temporal(value),
        TypeKind::Decimal => numeric_from_text(value, |s| {
            Bson::Double(f64::from(s.trim().parse::<f32>().unwrap_or_default()))
        }),
        TypeKind::Double => numeric_from_text(value, |s| {
            Bson::Double(s.trim().parse::<f64>().unwrap_or_default())
        }),
        TypeKind::Int => numeric_from_text(value, |s| {
            Bson::Int32(s.trim().parse::<i32>().unwrap_or_default())
        }),
        TypeKind::Long => numeric_from_text(value, |s| {
            Bson::Int64(s.trim().parse::<i64>().unwrap_or_default())
        }),
        TypeKind::String | TypeKind::Object | TypeKind::Array | TypeKind::Unknown => {
            value.clone()
        }
    }
}

/// RFC3339 strings become native dates; parse failures keep the string
pub fn coerce_temporal(value: &Bson) -> Bson {
    match value {
        Bson::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(parsed) => Bson::DateTime(bson::DateTime::from_millis(parsed.timestamp_millis())),
            Err(_) => value.clone(),
        },
        other => other.clone(),
    }
}

fn numeric_from_text(value: &Bson, parse: impl Fn(&str) -> Bson) -> Bson {
    match value {
        Bson::String(s) => parse(s),
        other => other.clone(),
    }
}

/// Accepts 1, t, T, TRUE, true, True. Everything else is false.
fn parse_bool(s: &str) -> bool {
    matches!(s, "1" | "t" | "T" | "TRUE" | "true" | "True")
}
