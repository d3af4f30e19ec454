//! Schema catalog subsystem
//!
//! The compiler never validates documents against a schema. It only needs
//! to know, for a field path, which semantic kind of value lives there so
//! request values can be coerced before they reach the store.

mod catalog;
mod errors;
mod loader;
mod types;

pub use catalog::FieldTypeCatalog;
pub use errors::{SchemaError, SchemaResult};
pub use loader::SchemaLoader;
pub use types::TypeKind;
