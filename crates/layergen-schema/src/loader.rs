//! Schema loading from YAML files
//!
//! The schema source format behind this loader (database metadata, hand-written
//! config) is out of scope; whatever produces it, the document handed to the
//! generator is the YAML form of [`SchemaSet`].

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::SchemaError;
use crate::models::SchemaSet;
use crate::validation;

/// Loads and validates schema documents
pub struct SchemaLoader;

impl SchemaLoader {
    /// Load a schema set from a YAML string
    ///
    /// The document is validated after parsing; a schema that parses but
    /// violates a structural rule is rejected.
    pub fn load_from_str(content: &str) -> Result<SchemaSet, SchemaError> {
        let set: SchemaSet = serde_yaml::from_str(content)?;
        validation::validate(&set)?;
        debug!(
            groups = set.groups.len(),
            entities = set.entity_count(),
            "schema loaded"
        );
        Ok(set)
    }

    /// Load a schema set from a YAML file
    pub fn load_from_file(path: &Path) -> Result<SchemaSet, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::load_from_str(&content)
    }
}
