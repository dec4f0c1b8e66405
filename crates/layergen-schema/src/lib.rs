#![warn(missing_docs)]

//! Layergen schema system
//!
//! Provides the schema data model driving code generation (entity definitions,
//! fields, capability flags, ordered schema groups), plus YAML loading and
//! structural validation.

pub mod error;
pub mod loader;
pub mod models;
pub mod validation;

pub use error::SchemaError;
pub use loader::SchemaLoader;
pub use models::{
    CapabilityFlags, FieldDefinition, FieldType, ModelDefinition, SchemaGroup, SchemaSet,
};
pub use validation::validate;
