//! Configuration and Strict Validation Tests
//!
//! - Schema and config files load from disk
//! - Operator overrides extend the default table
//! - Strict mode rejects sort, projection and keyset fields outside the
//!   catalog; lenient mode passes them through

use std::io::Write;
use std::sync::Arc;

use bson::doc;
use docquery::config::CompilerConfig;
use docquery::query::{CursorQuery, FilterNode, PageQuery, QueryAssembler, QueryError};
use docquery::schema::{SchemaLoader, TypeKind};
use serde_json::json;
use tempfile::NamedTempFile;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn schema_file() -> NamedTempFile {
    write_file(
        r#"{
            "$jsonSchema": {
                "bsonType": "object",
                "properties": {
                    "name": { "bsonType": "string" },
                    "age": { "bsonType": "int" },
                    "created": { "bsonType": "timestamp" }
                }
            }
        }"#,
    )
}

fn assembler(config: CompilerConfig) -> QueryAssembler {
    let catalog = SchemaLoader::load_file(schema_file().path()).unwrap();
    QueryAssembler::new(Arc::new(catalog), config)
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_schema_file_loads_catalog() {
    let catalog = SchemaLoader::load_file(schema_file().path()).unwrap();

    assert_eq!(catalog.get("name"), Some(TypeKind::String));
    assert_eq!(catalog.get("age"), Some(TypeKind::Int));
    assert!(catalog.get("created").unwrap().is_temporal());
    assert_eq!(catalog.get("missing"), None);
}

#[test]
fn test_config_file_loads() {
    let file = write_file(r#"{"strict_validation": true, "operators": {"like": "$regex"}}"#);
    let config = CompilerConfig::load(file.path()).unwrap();

    assert!(config.strict_validation);
    assert_eq!(config.id_field, "_id");
    assert_eq!(config.id_alias, "id");
}

#[test]
fn test_invalid_config_rejected() {
    let file = write_file(r#"{"operators": {"like": "regex"}}"#);
    let err = CompilerConfig::load(file.path()).unwrap_err();
    assert_eq!(err.code(), "CONFIG_INVALID");

    let file = write_file("{");
    let err = CompilerConfig::load(file.path()).unwrap_err();
    assert_eq!(err.code(), "CONFIG_INVALID");
}

#[test]
fn test_operator_override_compiles() {
    let file = write_file(r#"{"operators": {"like": "$regex"}}"#);
    let assembler = assembler(CompilerConfig::load(file.path()).unwrap());

    let query: PageQuery = serde_json::from_value(json!({
        "filter": { "name": { "like": "^an" } }
    }))
    .unwrap();

    assert_eq!(
        assembler.compile_query(&query).unwrap().filter,
        doc! { "name": { "$regex": "^an" } }
    );
}

#[test]
fn test_unconfigured_operator_unknown() {
    let query: PageQuery = serde_json::from_value(json!({
        "filter": { "name": { "like": "^an" } }
    }))
    .unwrap();

    let err = assembler(CompilerConfig::default())
        .compile_query(&query)
        .unwrap_err();
    assert_eq!(err.code(), "QUERY_UNKNOWN_OPERATOR");
}

// =============================================================================
// Strict Validation
// =============================================================================

#[test]
fn test_strict_rejects_unknown_sort_field() {
    let query = PageQuery::new(FilterNode::new()).with_sort(["-nickname"]);

    let err = assembler(CompilerConfig::strict())
        .compile_query(&query)
        .unwrap_err();
    assert_eq!(err, QueryError::UnknownField("nickname".into()));
}

#[test]
fn test_strict_rejects_unknown_projection_field() {
    let query = PageQuery::new(FilterNode::new()).with_fields(["name", "-nickname"]);

    let err = assembler(CompilerConfig::strict())
        .compile_query(&query)
        .unwrap_err();
    assert_eq!(err, QueryError::UnknownField("nickname".into()));
}

#[test]
fn test_strict_rejects_unknown_keyset_field() {
    let err = assembler(CompilerConfig::strict())
        .compile_cursor(&CursorQuery::new(FilterNode::new(), 5).with_sort(["nickname"]))
        .unwrap_err();
    assert_eq!(err.code(), "QUERY_UNKNOWN_FIELD");
}

#[test]
fn test_strict_accepts_identifier_alias() {
    let query = PageQuery::new(FilterNode::new())
        .with_sort(["-id", "age"])
        .with_fields(["id", "name"]);

    let compiled = assembler(CompilerConfig::strict())
        .compile_query(&query)
        .unwrap();

    assert_eq!(compiled.sort, Some(doc! { "_id": -1, "age": 1 }));
    assert_eq!(compiled.projection, Some(doc! { "_id": 1, "name": 1 }));
}

#[test]
fn test_lenient_passes_unknown_fields() {
    let query = PageQuery::new(FilterNode::new())
        .with_sort(["nickname"])
        .with_fields(["-nickname"]);

    let compiled = assembler(CompilerConfig::default())
        .compile_query(&query)
        .unwrap();

    assert_eq!(compiled.sort, Some(doc! { "nickname": 1 }));
    assert_eq!(compiled.projection, Some(doc! { "nickname": 0 }));
}
