//! Repository subsystem for docquery
//!
//! The thin layer between callers and an external document store:
//! compile, forward, post-process. The store itself is a trait; this
//! crate ships no implementation of it.

mod errors;
mod store;

pub use errors::{RepositoryError, RepositoryResult, StoreError};
pub use store::{DocumentStore, Repository};
