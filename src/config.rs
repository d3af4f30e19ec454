//! Compiler configuration
//!
//! Loaded once from a JSON file; every key is optional:
//!
//! ```json
//! {
//!   "strict_validation": false,
//!   "id_field": "_id",
//!   "id_alias": "id",
//!   "operators": { "like": "$regex" },
//!   "max_cursor_token_len": 8192
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event};
use crate::query::OperatorTable;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {reason}")]
    Unreadable { path: String, reason: String },

    /// Config contents are invalid
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Unreadable { .. } => "CONFIG_UNREADABLE",
            ConfigError::Invalid(_) => "CONFIG_INVALID",
        }
    }
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Immutable compiler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Reject sort, projection and keyset fields missing from the catalog
    #[serde(default)]
    pub strict_validation: bool,

    /// Identifier field as stored
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Public alias renamed to `id_field`
    #[serde(default = "default_id_alias")]
    pub id_alias: String,

    /// Operator name overrides merged over the default table
    #[serde(default)]
    pub operators: BTreeMap<String, String>,

    /// Longest cursor token accepted, in characters
    #[serde(default = "default_max_cursor_token_len")]
    pub max_cursor_token_len: usize,
}

fn default_id_field() -> String {
    "_id".to_string()
}
fn default_id_alias() -> String {
    "id".to_string()
}
fn default_max_cursor_token_len() -> usize {
    8 * 1024
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            strict_validation: false,
            id_field: default_id_field(),
            id_alias: default_id_alias(),
            operators: BTreeMap::new(),
            max_cursor_token_len: default_max_cursor_token_len(),
        }
    }
}

impl CompilerConfig {
    /// Create a strict-validation config with default naming
    pub fn strict() -> Self {
        Self {
            strict_validation: true,
            ..Self::default()
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: CompilerConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Invalid(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("strict_validation", &config.strict_validation.to_string()),
            ],
        );

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.id_field.is_empty() {
            return Err(ConfigError::Invalid("id_field must not be empty".into()));
        }

        if self.id_alias.is_empty() {
            return Err(ConfigError::Invalid("id_alias must not be empty".into()));
        }

        if self.max_cursor_token_len == 0 {
            return Err(ConfigError::Invalid(
                "max_cursor_token_len must be > 0".into(),
            ));
        }

        for (name, native) in &self.operators {
            if name.is_empty() {
                return Err(ConfigError::Invalid("operator name must not be empty".into()));
            }
            if !native.starts_with('$') {
                return Err(ConfigError::Invalid(format!(
                    "operator '{}' must map to a '$' operator, got '{}'",
                    name, native
                )));
            }
        }

        Ok(())
    }

    /// Builds the operator table: defaults plus overrides
    pub fn operator_table(&self) -> OperatorTable {
        OperatorTable::default().with_overrides(
            self.operators
                .iter()
                .map(|(name, native)| (name.as_str(), native.as_str())),
        )
    }

    /// Maps the public identifier alias onto the stored identifier field
    pub fn resolve_field<'a>(&'a self, field: &'a str) -> &'a str {
        if field == self.id_alias {
            &self.id_field
        } else {
            field
        }
    }

    /// Returns true if the (already resolved) field is the identifier
    pub fn is_id_field(&self, field: &str) -> bool {
        field == self.id_field || field == self.id_alias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert!(!config.strict_validation);
        assert_eq!(config.id_field, "_id");
        assert_eq!(config.id_alias, "id");
        assert_eq!(config.max_cursor_token_len, 8192);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_field() {
        let config = CompilerConfig::default();
        assert_eq!(config.resolve_field("id"), "_id");
        assert_eq!(config.resolve_field("_id"), "_id");
        assert_eq!(config.resolve_field("age"), "age");
        assert!(config.is_id_field("id"));
        assert!(config.is_id_field("_id"));
        assert!(!config.is_id_field("age"));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"strict_validation": true, "operators": {{"like": "$regex"}}}}"#
        )
        .unwrap();

        let config = CompilerConfig::load(file.path()).unwrap();
        assert!(config.strict_validation);
        assert_eq!(config.id_field, "_id");
        assert_eq!(config.operator_table().native("like"), Some("$regex"));
        assert_eq!(config.operator_table().native("eq"), Some("$eq"));
    }

    #[test]
    fn test_invalid_operator_override_rejected() {
        let mut config = CompilerConfig::default();
        config.operators.insert("like".into(), "regex".into());

        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), "CONFIG_INVALID");
    }

    #[test]
    fn test_empty_id_field_rejected() {
        let config = CompilerConfig {
            id_field: String::new(),
            ..CompilerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = CompilerConfig::load(Path::new("/nonexistent/docquery.json")).unwrap_err();
        assert_eq!(err.code(), "CONFIG_UNREADABLE");
    }
}
