//! Core schema data model
//!
//! A [`SchemaSet`] is the root document: an ordered list of [`SchemaGroup`]s,
//! each holding an ordered list of [`ModelDefinition`]s. Declaration order is
//! authoritative for all repeated-block expansion downstream, so every
//! collection here is a `Vec`, never a map.

use serde::{Deserialize, Serialize};

/// Type tag for an entity field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    /// Text / string
    Text,
    /// Boolean
    Bool,
    /// Fixed-point decimal
    Decimal,
    /// Date or timestamp
    Date,
    /// UUID
    Uuid,
    /// Raw binary
    Binary,
    /// Any other type, carried verbatim
    Other(String),
}

/// A single field of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name as declared in the schema source
    pub name: String,
    /// Type tag
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field accepts null
    #[serde(default)]
    pub nullable: bool,
    /// Whether the field is (part of) the primary key
    #[serde(default)]
    pub key: bool,
}

/// Capability flags controlling which template variants apply to an entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    /// Entity has a DTO layer (DTO file and DTO-backed controller)
    #[serde(default)]
    pub has_dto: bool,
    /// Entity is a database view; gets the read-only controller
    #[serde(default)]
    pub has_view: bool,
    /// Entity is exposed directly, without a DTO
    #[serde(default)]
    pub entity_only: bool,
}

/// Canonical description of one entity driving generation
///
/// Immutable for the duration of a run; created by schema load and discarded
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Raw entity name as found in the schema source
    pub name: String,
    /// Ordered fields
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    /// Capability flags
    #[serde(default)]
    pub flags: CapabilityFlags,
}

/// Ordered set of entities sharing a generation namespace and output location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaGroup {
    /// Group name (e.g. "Inventory"); becomes the SCHEMA_NAME binding
    pub name: String,
    /// Entities in declared order
    pub entities: Vec<ModelDefinition>,
}

/// Root schema document: ordered schema groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSet {
    /// Groups in declared order
    pub groups: Vec<SchemaGroup>,
}

impl SchemaSet {
    /// Total number of entities across all groups
    pub fn entity_count(&self) -> usize {
        self.groups.iter().map(|g| g.entities.len()).sum()
    }

    /// Look up a group by name
    pub fn group(&self, name: &str) -> Option<&SchemaGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str) -> ModelDefinition {
        ModelDefinition {
            name: name.to_string(),
            fields: Vec::new(),
            flags: CapabilityFlags::default(),
        }
    }

    #[test]
    fn test_entity_count() {
        let set = SchemaSet {
            groups: vec![
                SchemaGroup {
                    name: "Inventory".to_string(),
                    entities: vec![entity("Item"), entity("Order")],
                },
                SchemaGroup {
                    name: "Common".to_string(),
                    entities: vec![entity("Range")],
                },
            ],
        };
        assert_eq!(set.entity_count(), 3);
    }

    #[test]
    fn test_group_lookup() {
        let set = SchemaSet {
            groups: vec![SchemaGroup {
                name: "Inventory".to_string(),
                entities: vec![entity("Item")],
            }],
        };
        assert!(set.group("Inventory").is_some());
        assert!(set.group("Missing").is_none());
    }

    #[test]
    fn test_flags_default_to_false() {
        let flags = CapabilityFlags::default();
        assert!(!flags.has_dto);
        assert!(!flags.has_view);
        assert!(!flags.entity_only);
    }
}
