//! docquery - a filter, aggregate and keyset-pagination compiler for
//! document stores
//!
//! Requests describe what rows to fetch, how to group them and where to
//! resume; the compiler turns them into native query documents for an
//! external executor to run as-is.

pub mod cli;
pub mod config;
pub mod observability;
pub mod query;
pub mod repository;
pub mod schema;
