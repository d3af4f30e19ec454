//! Schema error types
//!
//! Error codes:
//! - SCHEMA_MALFORMED: schema document has the wrong shape
//! - SCHEMA_UNREADABLE: schema file could not be read

use thiserror::Error;

/// Schema catalog errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Schema document does not have the expected shape
    #[error("Malformed schema at {location}: {reason}")]
    Malformed { location: String, reason: String },

    /// Schema file could not be read
    #[error("Unable to read schema {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

impl SchemaError {
    /// Create a malformed schema error
    pub fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Malformed {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create an unreadable schema error
    pub fn unreadable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Unreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::Malformed { .. } => "SCHEMA_MALFORMED",
            SchemaError::Unreadable { .. } => "SCHEMA_UNREADABLE",
        }
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SchemaError::malformed("<root>", "not an object").code(),
            "SCHEMA_MALFORMED"
        );
        assert_eq!(
            SchemaError::unreadable("/tmp/x.json", "missing").code(),
            "SCHEMA_UNREADABLE"
        );
    }

    #[test]
    fn test_error_display() {
        let err = SchemaError::malformed("users.properties", "expected object");
        let display = err.to_string();
        assert!(display.contains("users.properties"));
        assert!(display.contains("expected object"));
    }
}
