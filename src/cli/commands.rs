//! CLI command implementations
//!
//! Each compile command:
//! 1. Loads the schema catalog and optional configuration
//! 2. Reads one JSON request from stdin
//! 3. Compiles it
//! 4. Writes the descriptor (relaxed extended JSON) or an error response
//!
//! Nothing is executed against a store.

use std::path::Path;
use std::sync::Arc;

use bson::{Bson, Document};
use serde_json::{Map, Value};

use crate::config::CompilerConfig;
use crate::query::{AggregateRequest, CursorQuery, PageQuery, QueryAssembler};
use crate::schema::{FieldTypeCatalog, SchemaLoader};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Request shape a compile command expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Query,
    Aggregate,
    Cursor,
}

/// Run a CLI command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Query { schema, config } => compile(RequestKind::Query, &schema, config.as_deref()),
        Command::Aggregate { schema, config } => {
            compile(RequestKind::Aggregate, &schema, config.as_deref())
        }
        Command::Cursor { schema, config } => {
            compile(RequestKind::Cursor, &schema, config.as_deref())
        }
        Command::Fields { schema } => fields(&schema),
    }
}

/// Compile one request read from stdin
pub fn compile(kind: RequestKind, schema: &Path, config: Option<&Path>) -> CliResult<()> {
    let assembler = load_assembler(schema, config)?;
    let request = read_request()?;

    match compile_request(kind, &assembler, request) {
        Ok(data) => write_response(data),
        Err(e) if e.is_request_error() => write_error(e.code_str(), e.message()),
        Err(e) => Err(e),
    }
}

/// Print the flattened field types of a schema
pub fn fields(schema: &Path) -> CliResult<()> {
    let catalog = SchemaLoader::load_file(schema)?;
    write_response(catalog_to_json(&catalog))
}

/// Build an assembler from a schema file and an optional config file
pub fn load_assembler(schema: &Path, config: Option<&Path>) -> CliResult<QueryAssembler> {
    let config = match config {
        Some(path) => CompilerConfig::load(path)?,
        None => CompilerConfig::default(),
    };
    let catalog = SchemaLoader::load_file(schema)?;
    Ok(QueryAssembler::new(Arc::new(catalog), config))
}

/// Compile a JSON request into its rendered descriptor
pub fn compile_request(
    kind: RequestKind,
    assembler: &QueryAssembler,
    request: Value,
) -> CliResult<Value> {
    let rendered = match kind {
        RequestKind::Query => {
            let query: PageQuery = parse(request)?;
            assembler.compile_query(&query)?.to_document()
        }
        RequestKind::Aggregate => {
            let request: AggregateRequest = parse(request)?;
            assembler
                .compile_aggregate(&request.aggregate, &request.filter)?
                .to_document()
        }
        RequestKind::Cursor => {
            let query: CursorQuery = parse(request)?;
            assembler.compile_cursor(&query)?.to_document()
        }
    };

    Ok(render(rendered))
}

fn parse<T: serde::de::DeserializeOwned>(request: Value) -> CliResult<T> {
    serde_json::from_value(request).map_err(|e| CliError::invalid_request(e.to_string()))
}

/// Native document as relaxed extended JSON
pub fn render(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

fn catalog_to_json(catalog: &FieldTypeCatalog) -> Value {
    let fields: Map<String, Value> = catalog
        .iter()
        .map(|(field, kind)| (field.to_string(), Value::String(kind.type_name().to_string())))
        .collect();
    Value::Object(fields)
}
