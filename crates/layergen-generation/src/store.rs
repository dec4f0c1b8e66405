//! Immutable template store
//!
//! Holds one parsed [`Template`] per (layer, variant) key. Templates are
//! loaded once, up front; lookups never touch the filesystem. Variant
//! selection is always the caller's decision, the store only answers exact
//! keys.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{GenerationError, TemplateError};
use crate::models::{LayerKind, Template, TemplateKey, TemplateVariant};
use crate::templates::parser::{TemplateParser, TokenVocabulary};

/// File extension for template files
const TEMPLATE_EXTENSION: &str = "tmpl";

/// Immutable mapping (layer, variant) -> template
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: BTreeMap<TemplateKey, Template>,
}

impl TemplateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register a template under a key
    ///
    /// Later inserts for the same key replace earlier ones.
    pub fn insert(
        &mut self,
        key: TemplateKey,
        source: impl Into<String>,
        vocabulary: &TokenVocabulary,
    ) -> Result<(), GenerationError> {
        let source = source.into();
        let parsed = TemplateParser::parse_with_vocabulary(&source, vocabulary).map_err(
            |source: TemplateError| GenerationError::Render {
                layer: key.layer,
                variant: key.variant,
                entity: None,
                source,
            },
        )?;
        self.templates.insert(
            key,
            Template {
                key,
                source,
                parsed,
            },
        );
        Ok(())
    }

    /// Look up the template for a (layer, variant)
    pub fn lookup(
        &self,
        layer: LayerKind,
        variant: TemplateVariant,
    ) -> Result<&Template, GenerationError> {
        self.templates
            .get(&TemplateKey::new(layer, variant))
            .ok_or(GenerationError::TemplateNotFound { layer, variant })
    }

    /// Whether a (layer, variant) is registered
    pub fn contains(&self, layer: LayerKind, variant: TemplateVariant) -> bool {
        self.templates
            .contains_key(&TemplateKey::new(layer, variant))
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Registered keys in stable order
    pub fn keys(&self) -> impl Iterator<Item = &TemplateKey> {
        self.templates.keys()
    }

    /// Load every `*.tmpl` file from a directory
    ///
    /// Files are keyed by their stem, `<layer>.<variant>.tmpl`
    /// (e.g. `controller.dto_backed.tmpl`, `manager.repository_contract.tmpl`).
    /// Files whose stem does not name a known key are skipped with a warning;
    /// a missing template only becomes an error when the pipeline asks for it.
    pub fn load_from_dir(
        dir: &Path,
        vocabulary: &TokenVocabulary,
    ) -> Result<Self, GenerationError> {
        let mut store = Self::new();

        let mut entries: Vec<_> = fs::read_dir(dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some(TEMPLATE_EXTENSION))
            .collect();
        entries.sort();

        for path in entries {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            match parse_stem(stem) {
                Some(key) => {
                    let source = fs::read_to_string(&path)?;
                    store.insert(key, source, vocabulary)?;
                    debug!(template = %key, path = %path.display(), "template loaded");
                }
                None => {
                    warn!(path = %path.display(), "skipping template with unrecognized name");
                }
            }
        }

        Ok(store)
    }
}

/// Parse `<layer>.<variant>` into a template key
fn parse_stem(stem: &str) -> Option<TemplateKey> {
    let (layer, variant) = stem.split_once('.')?;
    Some(TemplateKey::new(
        LayerKind::parse(layer)?,
        TemplateVariant::parse(variant)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary() -> TokenVocabulary {
        TokenVocabulary::builtin()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut store = TemplateStore::new();
        let key = TemplateKey::new(LayerKind::Dto, TemplateVariant::Implementation);
        store
            .insert(key, "class MODEL_NAMEDto {}", &vocabulary())
            .unwrap();

        let template = store
            .lookup(LayerKind::Dto, TemplateVariant::Implementation)
            .unwrap();
        assert_eq!(template.key, key);
    }

    #[test]
    fn test_lookup_missing_template() {
        let store = TemplateStore::new();
        let result = store.lookup(LayerKind::Controller, TemplateVariant::ReadOnly);
        assert!(matches!(
            result,
            Err(GenerationError::TemplateNotFound {
                layer: LayerKind::Controller,
                variant: TemplateVariant::ReadOnly,
            })
        ));
    }

    #[test]
    fn test_insert_rejects_malformed_template() {
        let mut store = TemplateStore::new();
        let key = TemplateKey::new(
            LayerKind::Manager,
            TemplateVariant::RepositoryImplementation,
        );
        let result = store.insert(key, "BLOCK_BEGIN:declarations\nno end\n", &vocabulary());
        assert!(matches!(result, Err(GenerationError::Render { .. })));
    }

    #[test]
    fn test_parse_stem() {
        assert_eq!(
            parse_stem("controller.dto_backed"),
            Some(TemplateKey::new(
                LayerKind::Controller,
                TemplateVariant::DtoBacked
            ))
        );
        assert_eq!(
            parse_stem("manager.repository_contract"),
            Some(TemplateKey::new(
                LayerKind::Manager,
                TemplateVariant::RepositoryContract
            ))
        );
        assert_eq!(parse_stem("controller"), None);
        assert_eq!(parse_stem("widget.crud"), None);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("dto.implementation.tmpl"),
            "class MODEL_NAMEDto {}",
        )
        .unwrap();
        fs::write(
            dir.path().join("service.contract.tmpl"),
            "interface IMODEL_NAMEService {}",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a template").unwrap();
        fs::write(dir.path().join("widget.crud.tmpl"), "ignored").unwrap();

        let store = TemplateStore::load_from_dir(dir.path(), &vocabulary()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains(LayerKind::Dto, TemplateVariant::Implementation));
        assert!(store.contains(LayerKind::Service, TemplateVariant::Contract));
    }
}
