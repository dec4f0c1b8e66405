//! Identifier derivation for entities
//!
//! Every entity name is expanded into a [`NameSet`] once per run. The
//! resolution is a pure function of the raw name (and configured keyword set),
//! which is what makes repeated builds byte-identical.

use std::collections::BTreeSet;

use crate::error::GenerationError;

/// Reserved keywords the default resolver guards against
///
/// These are the target-language keywords and framework types the scaffolded
/// C# tree is known to collide with. The set is fully configurable.
const DEFAULT_RESERVED: &[&str] = &[
    "class", "delegate", "event", "object", "operator", "params", "range", "route", "string",
];

/// Fixed suffix appended to a keyword-colliding name
const DEFAULT_SUFFIX: &str = "Model";

/// The bundle of derived identifier variants for one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSet {
    /// Entity name exactly as declared
    pub canonical: String,
    /// Canonical name, disambiguated if it collides with a reserved keyword
    pub safe: String,
    /// Safe name with the first character lower-cased
    pub lower_start: String,
    /// Owning schema group name
    pub schema: String,
}

/// Derives consistent identifier variants from raw entity names
#[derive(Debug, Clone)]
pub struct NamingResolver {
    reserved: BTreeSet<String>,
    suffix: String,
}

impl NamingResolver {
    /// Create a resolver with the default reserved-keyword set and suffix
    pub fn new() -> Self {
        Self {
            reserved: DEFAULT_RESERVED.iter().map(|s| s.to_string()).collect(),
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }

    /// Replace the reserved-keyword set
    ///
    /// Comparison is case-insensitive; entries are stored lower-cased.
    pub fn with_reserved<I, S>(mut self, reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved = reserved
            .into_iter()
            .map(|s| s.into().to_lowercase())
            .collect();
        self
    }

    /// Replace the disambiguating suffix
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Derive the name set for one entity
    ///
    /// Fails when the raw name is empty or outside the identifier charset.
    /// Identical input always yields an identical result.
    pub fn resolve(&self, raw: &str, schema: &str) -> Result<NameSet, GenerationError> {
        if raw.is_empty() {
            return Err(GenerationError::Naming {
                name: raw.to_string(),
                reason: "name is empty".to_string(),
            });
        }
        if !layergen_schema::validation::is_identifier(raw) {
            return Err(GenerationError::Naming {
                name: raw.to_string(),
                reason: "name contains characters outside the identifier charset".to_string(),
            });
        }

        let canonical = raw.to_string();
        let safe = if self.reserved.contains(&canonical.to_lowercase()) {
            format!("{}{}", canonical, self.suffix)
        } else {
            canonical.clone()
        };
        let lower_start = lower_first(&safe);

        Ok(NameSet {
            canonical,
            safe,
            lower_start,
            schema: schema.to_string(),
        })
    }
}

impl Default for NamingResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
