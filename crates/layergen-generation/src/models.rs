//! Core data models for code generation

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::templates::parser::{ParsedTemplate, TemplateParser};

/// Generated application layer a template belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// HTTP controller
    Controller,
    /// Data-access repository
    Repository,
    /// Business service
    Service,
    /// Schema-wide aggregate exposing one member per entity
    Manager,
    /// Data transfer object
    Dto,
    /// Object-mapping profile
    Mapping,
}

impl LayerKind {
    /// Stable lowercase name, used in template file stems and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Controller => "controller",
            LayerKind::Repository => "repository",
            LayerKind::Service => "service",
            LayerKind::Manager => "manager",
            LayerKind::Dto => "dto",
            LayerKind::Mapping => "mapping",
        }
    }

    /// Parse the stable name back into a layer kind
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "controller" => Some(LayerKind::Controller),
            "repository" => Some(LayerKind::Repository),
            "service" => Some(LayerKind::Service),
            "manager" => Some(LayerKind::Manager),
            "dto" => Some(LayerKind::Dto),
            "mapping" => Some(LayerKind::Mapping),
            _ => None,
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template variant within a layer
///
/// Which variant applies to an entity is decided by the pipeline from the
/// entity's capability flags, never by the template store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateVariant {
    /// Interface / contract
    Contract,
    /// Concrete implementation
    Implementation,
    /// Controller backed by a DTO
    DtoBacked,
    /// Controller exposing the entity directly
    EntityOnly,
    /// Read-only controller for view entities
    ReadOnly,
    /// Repository manager contract
    RepositoryContract,
    /// Repository manager implementation
    RepositoryImplementation,
    /// Service manager contract
    ServiceContract,
    /// Service manager implementation
    ServiceImplementation,
}

impl TemplateVariant {
    /// Stable lowercase name, used in template file stems and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateVariant::Contract => "contract",
            TemplateVariant::Implementation => "implementation",
            TemplateVariant::DtoBacked => "dto_backed",
            TemplateVariant::EntityOnly => "entity_only",
            TemplateVariant::ReadOnly => "read_only",
            TemplateVariant::RepositoryContract => "repository_contract",
            TemplateVariant::RepositoryImplementation => "repository_implementation",
            TemplateVariant::ServiceContract => "service_contract",
            TemplateVariant::ServiceImplementation => "service_implementation",
        }
    }

    /// Parse the stable name back into a variant
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "contract" => Some(TemplateVariant::Contract),
            "implementation" => Some(TemplateVariant::Implementation),
            "dto_backed" => Some(TemplateVariant::DtoBacked),
            "entity_only" => Some(TemplateVariant::EntityOnly),
            "read_only" => Some(TemplateVariant::ReadOnly),
            "repository_contract" => Some(TemplateVariant::RepositoryContract),
            "repository_implementation" => Some(TemplateVariant::RepositoryImplementation),
            "service_contract" => Some(TemplateVariant::ServiceContract),
            "service_implementation" => Some(TemplateVariant::ServiceImplementation),
            _ => None,
        }
    }
}

impl fmt::Display for TemplateVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a template: (layer, variant)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateKey {
    /// Layer the template generates
    pub layer: LayerKind,
    /// Variant within the layer
    pub variant: TemplateVariant,
}

impl TemplateKey {
    /// Create a key from its parts
    pub fn new(layer: LayerKind, variant: TemplateVariant) -> Self {
        Self { layer, variant }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.layer, self.variant)
    }
}

/// A template: raw source plus its parsed node structure
///
/// Parsed once at construction; immutable afterwards.
#[derive(Debug, Clone)]
pub struct Template {
    /// Template identity
    pub key: TemplateKey,
    /// Raw template text
    pub source: String,
    /// Parsed structure (literal spans, placeholders, regions)
    pub parsed: ParsedTemplate,
}

impl Template {
    /// Parse template text into an immutable template
    pub fn parse(key: TemplateKey, source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        let parsed = TemplateParser::parse(&source)?;
        Ok(Self {
            key,
            source,
            parsed,
        })
    }

    /// Whether the template contains repeated-block regions (aggregator shape)
    pub fn has_blocks(&self) -> bool {
        !self.parsed.block_names.is_empty()
    }
}

/// Case style applied to generated file stems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStyle {
    /// PascalCase (e.g. ItemController)
    Pascal,
    /// snake_case (e.g. item_controller)
    Snake,
    /// kebab-case (e.g. item-controller)
    Kebab,
}

impl CaseStyle {
    /// Apply the case style to a string
    pub fn apply(&self, input: &str) -> String {
        use heck::{ToKebabCase, ToPascalCase, ToSnakeCase};

        match self {
            CaseStyle::Pascal => input.to_pascal_case(),
            CaseStyle::Snake => input.to_snake_case(),
            CaseStyle::Kebab => input.to_kebab_case(),
        }
    }
}

/// One rendered output file, tagged with its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// Output path relative to the output root
    pub path: PathBuf,
    /// Final rendered text
    pub content: String,
    /// Layer of the originating template
    pub layer: LayerKind,
    /// Variant of the originating template
    pub variant: TemplateVariant,
    /// Originating entity, for per-entity artifacts
    pub entity: Option<String>,
    /// Owning schema group
    pub group: String,
}
