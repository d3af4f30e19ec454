//! Schema loader for reading schema documents from disk
//!
//! One JSON document per collection. The document is flattened into a
//! [`FieldTypeCatalog`] once, at repository construction time.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::catalog::FieldTypeCatalog;
use super::errors::{SchemaError, SchemaResult};
use crate::observability::{log_event_with_fields, Event};

/// Loads schema documents and builds field type catalogs.
pub struct SchemaLoader;

impl SchemaLoader {
    /// Reads a schema file and flattens it into a catalog.
    pub fn load_file(path: &Path) -> SchemaResult<FieldTypeCatalog> {
        let location = path.display().to_string();

        let content = fs::read_to_string(path)
            .map_err(|e| SchemaError::unreadable(&location, e.to_string()))?;

        let document: Value = serde_json::from_str(&content)
            .map_err(|e| SchemaError::malformed(&location, format!("Invalid JSON: {}", e)))?;

        let catalog = Self::load_value(&document)?;

        log_event_with_fields(
            Event::CatalogLoaded,
            &[("fields", &catalog.len().to_string()), ("path", &location)],
        );

        Ok(catalog)
    }

    /// Flattens an in-memory schema document.
    pub fn load_value(document: &Value) -> SchemaResult<FieldTypeCatalog> {
        FieldTypeCatalog::from_schema(document)
    }
}
