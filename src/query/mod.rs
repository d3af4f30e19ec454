//! Query compilation subsystem for docquery
//!
//! Turns vendor-neutral requests into native query documents:
//! - Filter trees into predicates, with type-aware value coercion
//! - Group-by and accumulator requests into `$group` stages, and grouped
//!   rows back into typed responses
//! - Opaque cursor tokens into keyset range predicates
//!
//! Compilation is synchronous and pure. Compilers hold only immutable
//! configuration and may be shared freely across threads.

mod aggregate;
mod assembler;
mod ast;
mod comparison;
mod compiled;
mod cursor;
mod errors;
mod page;
mod parser;
mod request;
mod where_clause;

pub use aggregate::{
    group_by_alias, parse_alias, AggregateColumn, AggregateCompiler, AggregateFunction,
    AggregateGrouping, AggregateResponse, ColumnKind,
};
pub use assembler::QueryAssembler;
pub use ast::{
    Clause, Comparison, CursorDirection, FieldFilter, FilterNode, Operator, PageWindow,
    SortDirection, SortField,
};
pub use comparison::{coerce_identifier, coerce_to_kind, ComparisonCompiler, OperatorTable};
pub use compiled::{CompiledAggregateQuery, CompiledCursorQuery, CompiledQuery};
pub use cursor::{CursorCodec, KeysetFilterBuilder};
pub use errors::{QueryError, QueryResult};
pub use page::{lookup_path, sort_key, CursorPage};
pub use parser::{json_to_bson, parse_filter};
pub use request::{
    AggregateQuery, AggregateRequest, CursorQuery, PageQuery, PageRequest, DEFAULT_CURSOR_LIMIT,
};
pub use where_clause::WhereCompiler;
