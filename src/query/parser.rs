//! # Filter Request Parser
//!
//! Parses a JSON filter request into a [`FilterNode`].
//!
//! ```json
//! {
//!   "age": { "gte": 18 },
//!   "or": [ { "country": { "eq": "cn" } }, { "vip": { "is": true } } ]
//! }
//! ```
//!
//! Keys `and`/`or` take a list of nested filters; every other key is a field
//! name mapped to an object of operator → value.

use bson::{Bson, Document};
use serde_json::Value;

use super::ast::{Clause, Comparison, FieldFilter, FilterNode, Operator};
use super::errors::{QueryError, QueryResult};

const AND_KEY: &str = "and";
const OR_KEY: &str = "or";

/// Parse a filter request. `null` parses to the empty filter.
pub fn parse_filter(value: &Value) -> QueryResult<FilterNode> {
    match value {
        Value::Null => Ok(FilterNode::new()),
        other => parse_node(other, "$"),
    }
}

fn parse_node(value: &Value, path: &str) -> QueryResult<FilterNode> {
    let object = value
        .as_object()
        .ok_or_else(|| QueryError::invalid_filter(path, "expected an object"))?;

    let mut node = FilterNode::new();

    for (key, entry) in object {
        let entry_path = format!("{}.{}", path, key);

        match key.as_str() {
            AND_KEY => node.clauses.push(Clause::And(parse_group(entry, &entry_path)?)),
            OR_KEY => node.clauses.push(Clause::Or(parse_group(entry, &entry_path)?)),
            field => node
                .clauses
                .push(Clause::Field(parse_field(field, entry, &entry_path)?)),
        }
    }

    Ok(node)
}

fn parse_group(value: &Value, path: &str) -> QueryResult<Vec<FilterNode>> {
    let items = value
        .as_array()
        .ok_or_else(|| QueryError::invalid_filter(path, "expected a list of filters"))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_node(item, &format!("{}[{}]", path, i)))
        .collect()
}

fn parse_field(field: &str, value: &Value, path: &str) -> QueryResult<FieldFilter> {
    let operators = value
        .as_object()
        .ok_or_else(|| QueryError::invalid_filter(path, "expected an operator object"))?;

    let comparisons = operators
        .iter()
        .map(|(name, raw)| Comparison {
            operator: Operator::parse(name),
            value: json_to_bson(raw),
        })
        .collect();

    Ok(FieldFilter::new(field, comparisons))
}

/// Converts a JSON value into its BSON counterpart.
///
/// Integers become `Int32` when they fit, else `Int64`; everything else
/// numeric becomes `Double`.
pub fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(small) => Bson::Int32(small),
                    Err(_) => Bson::Int64(i),
                }
            } else {
                Bson::Double(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(map) => {
            let mut doc = Document::new();
            for (key, item) in map {
                doc.insert(key.clone(), json_to_bson(item));
            }
            Bson::Document(doc)
        }
    }
}
