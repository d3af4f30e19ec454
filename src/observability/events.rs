//! Observability events for docquery
//!
//! Every observable step of catalog loading and query compilation is an
//! explicit, typed event.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Compiler configuration loaded
    ConfigLoaded,
    /// Field type catalog built from a schema document
    CatalogLoaded,

    // Compilation
    /// Offset-paged query compiled
    QueryCompiled,
    /// Aggregate query compiled
    AggregateCompiled,
    /// Cursor-paged query compiled
    CursorQueryCompiled,
    /// Compilation rejected with an error
    CompileRejected,

    // Pagination
    /// Cursor token decoded into boundary values
    CursorDecoded,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CatalogLoaded => "CATALOG_LOADED",

            Event::QueryCompiled => "QUERY_COMPILED",
            Event::AggregateCompiled => "AGGREGATE_COMPILED",
            Event::CursorQueryCompiled => "CURSOR_QUERY_COMPILED",
            Event::CompileRejected => "COMPILE_REJECTED",

            Event::CursorDecoded => "CURSOR_DECODED",
        }
    }

    /// Returns true if the event reports a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::CompileRejected)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
