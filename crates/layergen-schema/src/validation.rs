//! Structural validation for schema documents
//!
//! Rules enforced here are the ones the generator relies on later: identifier
//! shapes, uniqueness within a group, and coherent capability flags. Anything
//! else (types, relationships) is the schema producer's business.

use std::collections::HashSet;

use crate::error::SchemaError;
use crate::models::{ModelDefinition, SchemaSet};

/// Validate a schema set against the structural rules
///
/// Rules:
/// - group names are unique and identifier-shaped
/// - entity names are unique within their group and identifier-shaped
/// - at most one field per entity carries the key flag
/// - `entity_only` and `has_dto` are mutually exclusive
pub fn validate(set: &SchemaSet) -> Result<(), SchemaError> {
    let mut group_names = HashSet::new();
    for group in &set.groups {
        if !is_identifier(&group.name) {
            return Err(SchemaError::Validation(format!(
                "group name {:?} is not a valid identifier",
                group.name
            )));
        }
        if !group_names.insert(group.name.as_str()) {
            return Err(SchemaError::Validation(format!(
                "duplicate group name {:?}",
                group.name
            )));
        }

        let mut entity_names = HashSet::new();
        for entity in &group.entities {
            validate_entity(&group.name, entity)?;
            if !entity_names.insert(entity.name.as_str()) {
                return Err(SchemaError::Validation(format!(
                    "duplicate entity {:?} in group {:?}",
                    entity.name, group.name
                )));
            }
        }
    }
    Ok(())
}

fn validate_entity(group: &str, entity: &ModelDefinition) -> Result<(), SchemaError> {
    if !is_identifier(&entity.name) {
        return Err(SchemaError::Validation(format!(
            "entity name {:?} in group {:?} is not a valid identifier",
            entity.name, group
        )));
    }

    let key_count = entity.fields.iter().filter(|f| f.key).count();
    if key_count > 1 {
        return Err(SchemaError::Validation(format!(
            "entity {:?} declares {} key fields, at most one is allowed",
            entity.name, key_count
        )));
    }

    if entity.flags.entity_only && entity.flags.has_dto {
        return Err(SchemaError::Validation(format!(
            "entity {:?} sets both entity_only and has_dto",
            entity.name
        )));
    }

    Ok(())
}

/// Identifier charset: ASCII letter first, then letters, digits, underscores
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
