//! Error types for schema loading and validation

use thiserror::Error;

/// Errors that can occur while loading or validating a schema
#[derive(Debug, Error)]
pub enum SchemaError {
    /// IO error while reading a schema file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Schema document could not be parsed
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Schema document violates a structural rule
    #[error("Validation failed: {0}")]
    Validation(String),
}
