//! Scalar placeholder resolution
//!
//! Resolves the entity tokens (`MODEL_NAME`, `SAFE_MODEL_NAME`,
//! `LOWER_START_NAME`, `SCHEMA_NAME`) against one entity's [`NameSet`], then
//! falls back to the run's shared context. A marker-shaped token that reaches
//! rendering without a binding is an error; nothing is ever passed through
//! silently.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::TemplateError;
use crate::naming::NameSet;
use crate::templates::parser::{ParsedTemplate, TemplateNode};

/// Token bound to the canonical entity name
pub const TOKEN_MODEL_NAME: &str = "MODEL_NAME";
/// Token bound to the keyword-safe entity name
pub const TOKEN_SAFE_MODEL_NAME: &str = "SAFE_MODEL_NAME";
/// Token bound to the safe name with a lower-cased first character
pub const TOKEN_LOWER_START_NAME: &str = "LOWER_START_NAME";
/// Token bound to the schema group name
pub const TOKEN_SCHEMA_NAME: &str = "SCHEMA_NAME";

/// The entity tokens every template may use
pub const ENTITY_TOKENS: [&str; 4] = [
    TOKEN_MODEL_NAME,
    TOKEN_SAFE_MODEL_NAME,
    TOKEN_LOWER_START_NAME,
    TOKEN_SCHEMA_NAME,
];

/// Marker shape: UPPER_SNAKE_CASE with at least two segments
///
/// Single all-caps words are ordinary literals, so generated constants do not
/// trip the detector.
static MARKER_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)+").expect("valid marker regex"));

/// Whether a string is exactly one marker-shaped token
pub fn is_marker_shaped(token: &str) -> bool {
    MARKER_SHAPE
        .find(token)
        .is_some_and(|m| m.start() == 0 && m.end() == token.len())
}

/// First marker-shaped token inside a literal span, if any
fn find_marker(text: &str) -> Option<&str> {
    MARKER_SHAPE.find(text).map(|m| m.as_str())
}

/// Reject literal text still carrying a marker-shaped token
pub fn ensure_no_markers(text: &str) -> Result<(), TemplateError> {
    match find_marker(text) {
        Some(token) => Err(TemplateError::UnresolvedPlaceholder {
            token: token.to_string(),
        }),
        None => Ok(()),
    }
}

/// Run-wide bindings shared by every entity (import lists, base namespaces)
#[derive(Debug, Clone, Default)]
pub struct SharedContext {
    values: BTreeMap<String, String>,
}

impl SharedContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a token; the key must be marker-shaped
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TemplateError> {
        let key = key.into();
        if !is_marker_shaped(&key) {
            return Err(TemplateError::UnresolvedPlaceholder { token: key });
        }
        self.values.insert(key, value.into());
        Ok(())
    }

    /// Look up a binding
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Token names bound in this context
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Resolves scalar placeholders for one entity
pub struct PlaceholderSubstitutor<'a> {
    names: &'a NameSet,
    context: &'a SharedContext,
}

impl<'a> PlaceholderSubstitutor<'a> {
    /// Create a substitutor for one entity's names and the run context
    pub fn new(names: &'a NameSet, context: &'a SharedContext) -> Self {
        Self { names, context }
    }

    /// Render a parsed single-entity template
    ///
    /// Deterministic: the same (template, entity, context) input always
    /// produces byte-identical output. Repeated-block regions are rejected
    /// here; they only belong in aggregator templates.
    pub fn render(&self, template: &ParsedTemplate) -> Result<String, TemplateError> {
        self.render_nodes(&template.nodes)
    }

    /// Render a slice of template nodes
    pub fn render_nodes(&self, nodes: &[TemplateNode]) -> Result<String, TemplateError> {
        let mut output = String::new();
        for node in nodes {
            match node {
                TemplateNode::Literal(text) => {
                    ensure_no_markers(text)?;
                    output.push_str(text);
                }
                TemplateNode::Placeholder(token) => {
                    output.push_str(self.resolve(token)?);
                }
                TemplateNode::Block { name, .. } => {
                    return Err(TemplateError::BlockInScalarTemplate { name: name.clone() });
                }
            }
        }
        Ok(output)
    }

    /// Resolve one token to its value
    pub fn resolve(&self, token: &str) -> Result<&str, TemplateError> {
        match token {
            TOKEN_MODEL_NAME => Ok(&self.names.canonical),
            TOKEN_SAFE_MODEL_NAME => Ok(&self.names.safe),
            TOKEN_LOWER_START_NAME => Ok(&self.names.lower_start),
            TOKEN_SCHEMA_NAME => Ok(&self.names.schema),
            other => self
                .context
                .get(other)
                .ok_or_else(|| TemplateError::UnresolvedPlaceholder {
                    token: other.to_string(),
                }),
        }
    }
}
