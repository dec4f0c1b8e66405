//! Error types for code generation
//!
//! Two levels: [`TemplateError`] for faults local to one template (syntax,
//! unresolved tokens, malformed regions) and [`GenerationError`] for the run as
//! a whole, which wraps template faults with the failing (layer, variant,
//! entity) context. No error here is recoverable in-process; the contract is
//! fix the input and re-run.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{LayerKind, TemplateVariant};

/// Errors local to parsing or rendering a single template
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template text is malformed
    #[error("invalid template syntax at line {line}: {message}")]
    InvalidSyntax {
        /// Line number where the fault was detected
        line: usize,
        /// Description of the fault
        message: String,
    },

    /// A marker-shaped token has no binding
    #[error("unresolved placeholder: {token}")]
    UnresolvedPlaceholder {
        /// The offending token
        token: String,
    },

    /// A repeated-block region is malformed
    #[error("invalid block {name:?} at line {line}: {message}")]
    InvalidBlock {
        /// Region name
        name: String,
        /// Line number of the begin marker (or the stray end marker)
        line: usize,
        /// Description of the fault
        message: String,
    },

    /// A repeated-block region appeared in a per-entity template
    #[error("repeated block {name:?} is only valid in aggregator templates")]
    BlockInScalarTemplate {
        /// Region name
        name: String,
    },
}

/// Errors that abort a generation run
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Entity name is empty or outside the identifier charset
    #[error("invalid entity name {name:?}: {reason}")]
    Naming {
        /// The raw name that was rejected
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// No template registered for the requested (layer, variant)
    #[error("template not found: {layer}/{variant}")]
    TemplateNotFound {
        /// Requested layer
        layer: LayerKind,
        /// Requested variant
        variant: TemplateVariant,
    },

    /// A template failed to render; carries the failing pair
    #[error("render failed for {layer}/{variant}{}: {source}", entity_context(.entity))]
    Render {
        /// Layer of the failing template
        layer: LayerKind,
        /// Variant of the failing template
        variant: TemplateVariant,
        /// Entity being rendered, if per-entity
        entity: Option<String>,
        /// Underlying template fault
        source: TemplateError,
    },

    /// Schema loading or validation failed
    #[error("schema error: {0}")]
    Schema(#[from] layergen_schema::SchemaError),

    /// Persisting an artifact failed
    #[error("write failed for {}: {source}", .path.display())]
    Write {
        /// Artifact path that could not be written
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// IO error outside artifact writing (template directory scans)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn entity_context(entity: &Option<String>) -> String {
    match entity {
        Some(name) => format!(" (entity {name})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_carries_entity_context() {
        let err = GenerationError::Render {
            layer: LayerKind::Service,
            variant: TemplateVariant::Implementation,
            entity: Some("Order".to_string()),
            source: TemplateError::UnresolvedPlaceholder {
                token: "BOGUS_TOKEN".to_string(),
            },
        };
        let message = err.to_string();
        assert!(message.contains("service/implementation"));
        assert!(message.contains("Order"));
        assert!(message.contains("BOGUS_TOKEN"));
    }

    #[test]
    fn test_aggregate_render_error_without_entity() {
        let err = GenerationError::Render {
            layer: LayerKind::Manager,
            variant: TemplateVariant::RepositoryImplementation,
            entity: None,
            source: TemplateError::InvalidBlock {
                name: "lazy_declarations".to_string(),
                line: 7,
                message: "missing end marker".to_string(),
            },
        };
        assert!(!err.to_string().contains("entity"));
    }
}
