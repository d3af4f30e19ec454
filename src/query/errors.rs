//! Query compilation errors
//!
//! Error codes:
//! - QUERY_UNKNOWN_OPERATOR
//! - QUERY_INVALID_VALUE
//! - QUERY_UNKNOWN_FIELD
//! - QUERY_CURSOR_LENGTH_MISMATCH
//! - QUERY_UNKNOWN_AGGREGATE_COLUMN
//! - QUERY_NO_AGGREGATE_FIELDS
//! - QUERY_INVALID_FILTER
//! - QUERY_INVALID_CURSOR
//!
//! Shape violations are hard errors. Value coercion failures are not errors
//! at all: coercion degrades to a default instead.

use thiserror::Error;

/// Result type for compilation
pub type QueryResult<T> = Result<T, QueryError>;

/// Compilation errors. Every one aborts the whole compilation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Operator name is not in the comparison table and not a range operator
    #[error("unknown operator ({operator}) on field '{field}'")]
    UnknownOperator { field: String, operator: String },

    /// Operator received a value of the wrong shape
    #[error("invalid value for '{operator}' on field '{field}': {reason}")]
    InvalidValue {
        field: String,
        operator: String,
        reason: String,
    },

    /// Field absent from the catalog (strict validation only)
    #[error("field {0} does not exist in collection")]
    UnknownField(String),

    /// Cursor carries a different number of values than the active sort
    #[error("cursor format fields length: {cursor} not match orders fields length: {sort}")]
    CursorLengthMismatch { cursor: usize, sort: usize },

    /// Result column does not follow the `<function>_<field>` convention
    #[error("Unknown aggregate column encountered for {0}.")]
    UnknownAggregateColumn(String),

    /// Aggregate request names no function fields at all
    #[error("No aggregate fields found.")]
    NoAggregateFieldsSpecified,

    /// Filter request is not a well-formed filter tree
    #[error("invalid filter at '{path}': {reason}")]
    InvalidFilter { path: String, reason: String },

    /// Cursor token cannot be decoded
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}

impl QueryError {
    /// Create an unknown operator error
    pub fn unknown_operator(field: impl Into<String>, operator: impl Into<String>) -> Self {
        QueryError::UnknownOperator {
            field: field.into(),
            operator: operator.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        operator: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        QueryError::InvalidValue {
            field: field.into(),
            operator: operator.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid filter error
    pub fn invalid_filter(path: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidFilter {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::UnknownOperator { .. } => "QUERY_UNKNOWN_OPERATOR",
            QueryError::InvalidValue { .. } => "QUERY_INVALID_VALUE",
            QueryError::UnknownField(_) => "QUERY_UNKNOWN_FIELD",
            QueryError::CursorLengthMismatch { .. } => "QUERY_CURSOR_LENGTH_MISMATCH",
            QueryError::UnknownAggregateColumn(_) => "QUERY_UNKNOWN_AGGREGATE_COLUMN",
            QueryError::NoAggregateFieldsSpecified => "QUERY_NO_AGGREGATE_FIELDS",
            QueryError::InvalidFilter { .. } => "QUERY_INVALID_FILTER",
            QueryError::InvalidCursor(_) => "QUERY_INVALID_CURSOR",
        }
    }

    /// Returns the field name if applicable
    pub fn field(&self) -> Option<&str> {
        match self {
            QueryError::UnknownOperator { field, .. } | QueryError::InvalidValue { field, .. } => {
                Some(field)
            }
            QueryError::UnknownField(field) => Some(field),
            _ => None,
        }
    }
}
