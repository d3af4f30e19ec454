//! Field type catalog
//!
//! Flattens a nested JSON-schema style document into `field path -> TypeKind`.
//! Nested object fields are dotted (`address.city`); array-of-object fields
//! are unwrapped through `items` so their members are addressable the same
//! way (`tags.label`).
//!
//! The catalog is built once and shared read-only between compilations.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult};
use super::types::TypeKind;

/// Wrapper key some stores put around the schema body
const JSON_SCHEMA_KEY: &str = "$jsonSchema";

/// Read-only mapping from field path to its type kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTypeCatalog {
    fields: BTreeMap<String, TypeKind>,
}

impl FieldTypeCatalog {
    /// Creates an empty catalog (every lookup misses)
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog from explicit `(path, kind)` pairs
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeKind)>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Builds the catalog from a schema document.
    ///
    /// The document may be wrapped in `$jsonSchema`. A document without
    /// `properties` yields an empty catalog.
    pub fn from_schema(schema: &Value) -> SchemaResult<Self> {
        let mut root = schema
            .as_object()
            .ok_or_else(|| SchemaError::malformed("<root>", "schema must be an object"))?;

        if let Some(inner) = root.get(JSON_SCHEMA_KEY) {
            root = inner.as_object().ok_or_else(|| {
                SchemaError::malformed(JSON_SCHEMA_KEY, "wrapped schema must be an object")
            })?;
        }

        let mut catalog = Self::new();

        if let Some(properties) = root.get("properties") {
            let properties = properties
                .as_object()
                .ok_or_else(|| SchemaError::malformed("properties", "expected an object"))?;
            catalog.collect_properties("", properties);
        }

        Ok(catalog)
    }

    fn collect_properties(&mut self, prefix: &str, properties: &Map<String, Value>) {
        for (field, definition) in properties {
            // Non-object definitions carry no type information
            let Some(mut definition) = definition.as_object() else {
                continue;
            };

            let path = format!("{}{}", prefix, field);

            match declared_type(definition) {
                Some(type_name) => {
                    let kind = TypeKind::from_type_name(type_name);
                    self.fields.insert(path.clone(), kind);

                    if kind == TypeKind::Array {
                        if let Some(items) = definition.get("items").and_then(Value::as_object) {
                            definition = items;
                        }
                    }

                    if let Some(nested) = definition.get("properties").and_then(Value::as_object)
                    {
                        self.collect_properties(&format!("{}.", path), nested);
                    }
                }
                None => {
                    if definition.contains_key("enum") {
                        self.fields.insert(path, TypeKind::Object);
                    }
                }
            }
        }
    }

    /// Looks up the kind of a field path
    pub fn get(&self, field: &str) -> Option<TypeKind> {
        self.fields.get(field).copied()
    }

    /// Returns true if the field path is catalogued
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of catalogued paths
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if nothing is catalogued
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates paths in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = (&str, TypeKind)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Reads `bsonType` (preferred) or `type`.
///
/// A list such as `["string", "null"]` resolves to its first non-null entry.
/// An empty type name counts as undeclared.
fn declared_type(definition: &Map<String, Value>) -> Option<&str> {
    let raw = definition
        .get("bsonType")
        .or_else(|| definition.get("type"))?;

    let name = match raw {
        Value::String(name) => Some(name.as_str()),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .find(|name| *name != "null"),
        _ => None,
    }?;

    (!name.is_empty()).then_some(name)
}
