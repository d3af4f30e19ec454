//! Repository errors
//!
//! Error codes:
//! - REPOSITORY_STORE_FAILED
//! - plus every QUERY_* code, passed through unchanged

use thiserror::Error;

use crate::query::QueryError;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Failure reported by a document store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        StoreError(message.into())
    }
}

/// Repository errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
    /// Request failed to compile; nothing was sent to the store
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Store rejected or failed the compiled query
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),
}

impl RepositoryError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            RepositoryError::Query(err) => err.code(),
            RepositoryError::Store(_) => "REPOSITORY_STORE_FAILED",
        }
    }
}
