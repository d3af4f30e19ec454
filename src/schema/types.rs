//! Field type kinds understood by the query compiler
//!
//! Supported kinds:
//! - string, object, array: passed through untouched
//! - bool: lenient boolean parsing
//! - date, timestamp: RFC3339 parsing
//! - decimal, double, int, long: numeric parsing at the matching width

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a catalogued field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// UTF-8 string
    String,
    /// Boolean
    Bool,
    /// Calendar date
    Date,
    /// Point in time
    Timestamp,
    /// 32-bit floating point
    Decimal,
    /// 64-bit floating point
    Double,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// Nested document or enumeration
    Object,
    /// Array of values
    Array,
    /// Declared with a type name the compiler does not coerce (e.g. objectId)
    Unknown,
}

impl TypeKind {
    /// Maps a schema type name onto a kind.
    ///
    /// Names are matched case-sensitively, as the store declares them.
    /// Unrecognised names map to [`TypeKind::Unknown`].
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "string" => TypeKind::String,
            "bool" => TypeKind::Bool,
            "date" => TypeKind::Date,
            "timestamp" => TypeKind::Timestamp,
            "decimal" => TypeKind::Decimal,
            "double" => TypeKind::Double,
            "int" => TypeKind::Int,
            "long" => TypeKind::Long,
            "object" => TypeKind::Object,
            "array" => TypeKind::Array,
            _ => TypeKind::Unknown,
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeKind::String => "string",
            TypeKind::Bool => "bool",
            TypeKind::Date => "date",
            TypeKind::Timestamp => "timestamp",
            TypeKind::Decimal => "decimal",
            TypeKind::Double => "double",
            TypeKind::Int => "int",
            TypeKind::Long => "long",
            TypeKind::Object => "object",
            TypeKind::Array => "array",
            TypeKind::Unknown => "unknown",
        }
    }

    /// Returns true for kinds holding a point in time
    pub fn is_temporal(&self) -> bool {
        matches!(self, TypeKind::Date | TypeKind::Timestamp)
    }

    /// Returns true for numeric kinds
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeKind::Decimal | TypeKind::Double | TypeKind::Int | TypeKind::Long
        )
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
