//! Generation pipeline orchestration
//!
//! Drives a run through its states: resolve names, render per-entity
//! artifacts, render schema-wide aggregates, write outputs. Rendering is pure
//! and in-memory; the write step only runs once every artifact of the run has
//! rendered, so a tree where an interface and its implementation disagree can
//! never reach disk.

use std::fmt;
use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, error, info};

use layergen_schema::{CapabilityFlags, ModelDefinition, SchemaGroup, SchemaSet};

use crate::error::GenerationError;
use crate::models::{CaseStyle, LayerKind, RenderedArtifact, TemplateKey, TemplateVariant};
use crate::naming::{NameSet, NamingResolver};
use crate::output_writer::{ArtifactSink, WriteReport};
use crate::store::TemplateStore;
use crate::templates::expander::BlockExpander;
use crate::templates::substitutor::{PlaceholderSubstitutor, SharedContext};

/// States of a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Schema is being loaded
    LoadSchema,
    /// Name sets are being derived
    ResolveNames,
    /// Per-entity templates are being rendered
    RenderPerEntity,
    /// Aggregator templates are being rendered
    RenderAggregates,
    /// Artifacts are being persisted
    WriteOutputs,
    /// Run completed
    Done,
    /// Run aborted; no outputs were written
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::LoadSchema => "load_schema",
            RunState::ResolveNames => "resolve_names",
            RunState::RenderPerEntity => "render_per_entity",
            RunState::RenderAggregates => "render_aggregates",
            RunState::WriteOutputs => "write_outputs",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Configuration for a generation run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// File extension for generated sources
    pub extension: String,
    /// Case style applied to generated file stems
    pub file_case: CaseStyle,
    /// Shared bindings available to every template
    pub context: SharedContext,
    /// Aggregate templates rendered once per schema group
    pub aggregates: Vec<TemplateKey>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extension: "cs".to_string(),
            file_case: CaseStyle::Pascal,
            context: SharedContext::new(),
            aggregates: vec![
                TemplateKey::new(LayerKind::Manager, TemplateVariant::RepositoryContract),
                TemplateKey::new(LayerKind::Manager, TemplateVariant::RepositoryImplementation),
                TemplateKey::new(LayerKind::Manager, TemplateVariant::ServiceContract),
                TemplateKey::new(LayerKind::Manager, TemplateVariant::ServiceImplementation),
                TemplateKey::new(LayerKind::Mapping, TemplateVariant::Implementation),
            ],
        }
    }
}

/// Summary of a completed run
#[derive(Debug)]
pub struct RunReport {
    /// Schema groups processed
    pub groups: usize,
    /// Entities processed
    pub entities: usize,
    /// Artifacts rendered
    pub artifacts: usize,
    /// Write outcomes
    pub write: WriteReport,
}

/// One per-entity rendering job, fixed before the parallel fan-out
struct EntityJob<'a> {
    group: &'a SchemaGroup,
    entity: &'a ModelDefinition,
    names: &'a NameSet,
    key: TemplateKey,
}

/// Orchestrates schema traversal, rendering, and the failure policy
pub struct GenerationPipeline<'a> {
    store: &'a TemplateStore,
    naming: NamingResolver,
    config: PipelineConfig,
}

impl<'a> GenerationPipeline<'a> {
    /// Create a pipeline over a template store
    pub fn new(store: &'a TemplateStore, naming: NamingResolver, config: PipelineConfig) -> Self {
        Self {
            store,
            naming,
            config,
        }
    }

    /// Render every artifact for a schema, in memory
    ///
    /// Output order is fixed by schema declaration order: all per-entity
    /// artifacts (grouped by schema group, then entity, then layer), followed
    /// by the aggregates per group. Per-entity rendering fans out across
    /// worker threads, but job order, not completion order, determines the
    /// result. Any single failure aborts the whole render.
    pub fn render(&self, schema: &SchemaSet) -> Result<Vec<RenderedArtifact>, GenerationError> {
        debug!(state = %RunState::ResolveNames, "pipeline state");
        let resolved = self.resolve_names(schema)?;

        debug!(state = %RunState::RenderPerEntity, "pipeline state");
        let jobs = self.entity_jobs(schema, &resolved);
        let mut artifacts: Vec<RenderedArtifact> = jobs
            .par_iter()
            .map(|job| self.render_entity_job(job))
            .collect::<Result<Vec<_>, _>>()?;

        // Aggregates wait for every per-entity render of the run (barrier),
        // then follow schema declaration order.
        debug!(state = %RunState::RenderAggregates, "pipeline state");
        for (group, names) in schema.groups.iter().zip(&resolved) {
            for key in &self.config.aggregates {
                artifacts.push(self.render_aggregate(group, names, *key)?);
            }
        }

        info!(artifacts = artifacts.len(), "render complete");
        Ok(artifacts)
    }

    /// Render a schema and persist the batch through a sink
    ///
    /// All-or-nothing: if any artifact fails to render, the sink is never
    /// invoked and nothing is written.
    pub fn run(
        &self,
        schema: &SchemaSet,
        sink: &mut dyn ArtifactSink,
    ) -> Result<RunReport, GenerationError> {
        let artifacts = self.render(schema).map_err(|e| {
            error!(state = %RunState::Failed, error = %e, "run aborted, nothing written");
            e
        })?;

        debug!(state = %RunState::WriteOutputs, "pipeline state");
        let write = sink.write_all(&artifacts).map_err(|e| {
            error!(state = %RunState::Failed, error = %e, "write failed");
            e
        })?;

        debug!(state = %RunState::Done, "pipeline state");
        Ok(RunReport {
            groups: schema.groups.len(),
            entities: schema.entity_count(),
            artifacts: artifacts.len(),
            write,
        })
    }

    /// Template variants applicable to an entity under its flags
    ///
    /// Repository and service layers always apply. The DTO layer requires the
    /// DTO flag. The controller variant is read-only for view entities,
    /// DTO-backed when a DTO exists, and entity-only otherwise.
    pub fn applicable_templates(flags: &CapabilityFlags) -> Vec<TemplateKey> {
        let mut keys = vec![
            TemplateKey::new(LayerKind::Repository, TemplateVariant::Contract),
            TemplateKey::new(LayerKind::Repository, TemplateVariant::Implementation),
            TemplateKey::new(LayerKind::Service, TemplateVariant::Contract),
            TemplateKey::new(LayerKind::Service, TemplateVariant::Implementation),
        ];
        if flags.has_dto {
            keys.push(TemplateKey::new(
                LayerKind::Dto,
                TemplateVariant::Implementation,
            ));
        }
        let controller = if flags.has_view {
            TemplateVariant::ReadOnly
        } else if flags.has_dto {
            TemplateVariant::DtoBacked
        } else {
            TemplateVariant::EntityOnly
        };
        keys.push(TemplateKey::new(LayerKind::Controller, controller));
        keys
    }

    /// Derive name sets for every entity, per group, in declared order
    fn resolve_names(&self, schema: &SchemaSet) -> Result<Vec<Vec<NameSet>>, GenerationError> {
        schema
            .groups
            .iter()
            .map(|group| {
                group
                    .entities
                    .iter()
                    .map(|entity| self.naming.resolve(&entity.name, &group.name))
                    .collect()
            })
            .collect()
    }

    /// Flatten the per-entity work into an ordered job list
    fn entity_jobs<'s>(
        &self,
        schema: &'s SchemaSet,
        resolved: &'s [Vec<NameSet>],
    ) -> Vec<EntityJob<'s>> {
        let mut jobs = Vec::new();
        for (group, group_names) in schema.groups.iter().zip(resolved) {
            for (entity, names) in group.entities.iter().zip(group_names) {
                for key in Self::applicable_templates(&entity.flags) {
                    jobs.push(EntityJob {
                        group,
                        entity,
                        names,
                        key,
                    });
                }
            }
        }
        jobs
    }

    fn render_entity_job(&self, job: &EntityJob<'_>) -> Result<RenderedArtifact, GenerationError> {
        let template = self.store.lookup(job.key.layer, job.key.variant)?;
        let substitutor = PlaceholderSubstitutor::new(job.names, &self.config.context);
        let content =
            substitutor
                .render(&template.parsed)
                .map_err(|source| GenerationError::Render {
                    layer: job.key.layer,
                    variant: job.key.variant,
                    entity: Some(job.entity.name.clone()),
                    source,
                })?;

        Ok(RenderedArtifact {
            path: self.entity_path(job.key, &job.group.name, job.names),
            content,
            layer: job.key.layer,
            variant: job.key.variant,
            entity: Some(job.entity.name.clone()),
            group: job.group.name.clone(),
        })
    }

    fn render_aggregate(
        &self,
        group: &SchemaGroup,
        names: &[NameSet],
        key: TemplateKey,
    ) -> Result<RenderedArtifact, GenerationError> {
        let template = self.store.lookup(key.layer, key.variant)?;
        let expander = BlockExpander::new(names, &group.name, &self.config.context);
        let content = expander
            .expand(&template.parsed)
            .map_err(|source| GenerationError::Render {
                layer: key.layer,
                variant: key.variant,
                entity: None,
                source,
            })?;

        Ok(RenderedArtifact {
            path: self.aggregate_path(key, &group.name),
            content,
            layer: key.layer,
            variant: key.variant,
            entity: None,
            group: group.name.clone(),
        })
    }

    /// Output path for a per-entity artifact
    fn entity_path(&self, key: TemplateKey, group: &str, names: &NameSet) -> PathBuf {
        let stem = match (key.layer, key.variant) {
            (LayerKind::Repository, TemplateVariant::Contract) => {
                format!("I{}Repository", names.canonical)
            }
            (LayerKind::Repository, _) => format!("{}Repository", names.canonical),
            (LayerKind::Service, TemplateVariant::Contract) => {
                format!("I{}Service", names.canonical)
            }
            (LayerKind::Service, _) => format!("{}Service", names.canonical),
            (LayerKind::Dto, _) => format!("{}Dto", names.canonical),
            (LayerKind::Controller, _) => format!("{}Controller", names.canonical),
            (LayerKind::Manager, _) | (LayerKind::Mapping, _) => names.canonical.clone(),
        };
        self.build_path(key, group, &stem)
    }

    /// Output path for an aggregate artifact
    fn aggregate_path(&self, key: TemplateKey, group: &str) -> PathBuf {
        let stem = match (key.layer, key.variant) {
            (LayerKind::Manager, TemplateVariant::RepositoryContract) => "IRepositoryManager",
            (LayerKind::Manager, TemplateVariant::RepositoryImplementation) => "RepositoryManager",
            (LayerKind::Manager, TemplateVariant::ServiceContract) => "IServiceManager",
            (LayerKind::Manager, TemplateVariant::ServiceImplementation) => "ServiceManager",
            (LayerKind::Mapping, _) => "MappingProfile",
            _ => "Aggregate",
        };
        self.build_path(key, group, stem)
    }

    fn build_path(&self, key: TemplateKey, group: &str, stem: &str) -> PathBuf {
        let dir = match (key.layer, key.variant) {
            (LayerKind::Controller, _) => "Controllers",
            (LayerKind::Repository, TemplateVariant::Contract)
            | (LayerKind::Manager, TemplateVariant::RepositoryContract) => "Repository/Contracts",
            (LayerKind::Repository, _)
            | (LayerKind::Manager, TemplateVariant::RepositoryImplementation) => {
                "Repository/Implementation"
            }
            (LayerKind::Service, TemplateVariant::Contract)
            | (LayerKind::Manager, TemplateVariant::ServiceContract) => "Service/Contracts",
            (LayerKind::Service, _) | (LayerKind::Manager, _) => "Service/Implementation",
            (LayerKind::Dto, _) => "Domain",
            (LayerKind::Mapping, _) => "Mapping",
        };

        let mut path = PathBuf::from(dir);
        path.push(format!("{group}Schema"));
        path.push(format!(
            "{}.{}",
            self.config.file_case.apply(stem),
            self.config.extension
        ));
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::parser::TokenVocabulary;
    use layergen_schema::SchemaLoader;

    fn schema() -> SchemaSet {
        SchemaLoader::load_from_str(
            r#"
groups:
  - name: Inventory
    entities:
      - name: Item
        flags:
          has_dto: true
      - name: Order
        flags:
          has_dto: true
"#,
        )
        .unwrap()
    }

    fn store() -> TemplateStore {
        let vocabulary = TokenVocabulary::builtin();
        let mut store = TemplateStore::new();
        let scalar_templates = [
            (
                TemplateKey::new(LayerKind::Repository, TemplateVariant::Contract),
                "interface IMODEL_NAMERepository : IRepository<SAFE_MODEL_NAME> {}\n",
            ),
            (
                TemplateKey::new(LayerKind::Repository, TemplateVariant::Implementation),
                "class MODEL_NAMERepository : Repository<SAFE_MODEL_NAME>, IMODEL_NAMERepository {}\n",
            ),
            (
                TemplateKey::new(LayerKind::Service, TemplateVariant::Contract),
                "interface IMODEL_NAMEService {}\n",
            ),
            (
                TemplateKey::new(LayerKind::Service, TemplateVariant::Implementation),
                "class MODEL_NAMEService : IMODEL_NAMEService {}\n",
            ),
            (
                TemplateKey::new(LayerKind::Dto, TemplateVariant::Implementation),
                "class MODEL_NAMEDto {}\n",
            ),
            (
                TemplateKey::new(LayerKind::Controller, TemplateVariant::DtoBacked),
                "class MODEL_NAMEController { IService<SAFE_MODEL_NAME, MODEL_NAMEDto> _service; }\n",
            ),
        ];
        for (key, source) in scalar_templates {
            store.insert(key, source, &vocabulary).unwrap();
        }

        let aggregates = [
            (
                TemplateKey::new(LayerKind::Manager, TemplateVariant::RepositoryContract),
                "interface IRepositoryManager {\nBLOCK_BEGIN:declarations\n    IMODEL_NAMERepository LOWER_START_NAME { get; }\nBLOCK_END:declarations\n}\n",
            ),
            (
                TemplateKey::new(LayerKind::Manager, TemplateVariant::RepositoryImplementation),
                "class RepositoryManager {\nBLOCK_BEGIN:declarations\n    private readonly Lazy<IMODEL_NAMERepository> _LOWER_START_NAME;\nBLOCK_END:declarations\nBLOCK_BEGIN:wiring\n        _LOWER_START_NAME = new Lazy<IMODEL_NAMERepository>(() => new MODEL_NAMERepository(context));\nBLOCK_END:wiring\n}\n",
            ),
            (
                TemplateKey::new(LayerKind::Manager, TemplateVariant::ServiceContract),
                "interface IServiceManager {\nBLOCK_BEGIN:declarations\n    IMODEL_NAMEService LOWER_START_NAMEService { get; }\nBLOCK_END:declarations\n}\n",
            ),
            (
                TemplateKey::new(LayerKind::Manager, TemplateVariant::ServiceImplementation),
                "class ServiceManager {\nBLOCK_BEGIN:declarations\n    private readonly Lazy<IMODEL_NAMEService> _LOWER_START_NAMEService;\nBLOCK_END:declarations\n}\n",
            ),
            (
                TemplateKey::new(LayerKind::Mapping, TemplateVariant::Implementation),
                "class MappingProfile {\nBLOCK_BEGIN:maps\n    CreateMap<SAFE_MODEL_NAME, MODEL_NAMEDto>().ReverseMap();\nBLOCK_END:maps\n}\n",
            ),
        ];
        for (key, source) in aggregates {
            store.insert(key, source, &vocabulary).unwrap();
        }
        store
    }

    #[test]
    fn test_render_produces_all_artifacts() {
        let store = store();
        let pipeline =
            GenerationPipeline::new(&store, NamingResolver::new(), PipelineConfig::default());
        let artifacts = pipeline.render(&schema()).unwrap();

        // 6 per entity x 2 entities + 5 aggregates
        assert_eq!(artifacts.len(), 17);
    }

    #[test]
    fn test_no_artifact_contains_markers() {
        let store = store();
        let pipeline =
            GenerationPipeline::new(&store, NamingResolver::new(), PipelineConfig::default());
        for artifact in pipeline.render(&schema()).unwrap() {
            assert!(
                !artifact.content.contains("MODEL_NAME")
                    && !artifact.content.contains("BLOCK_BEGIN")
                    && !artifact.content.contains("BLOCK_END"),
                "unexpanded marker in {}",
                artifact.path.display()
            );
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let store = store();
        let pipeline =
            GenerationPipeline::new(&store, NamingResolver::new(), PipelineConfig::default());
        let first = pipeline.render(&schema()).unwrap();
        let second = pipeline.render(&schema()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_aggregate_regions_follow_declared_order() {
        let store = store();
        let pipeline =
            GenerationPipeline::new(&store, NamingResolver::new(), PipelineConfig::default());
        let artifacts = pipeline.render(&schema()).unwrap();

        let manager = artifacts
            .iter()
            .find(|a| a.variant == TemplateVariant::RepositoryImplementation)
            .unwrap();
        let item_pos = manager.content.find("_item").unwrap();
        let order_pos = manager.content.find("_order").unwrap();
        assert!(item_pos < order_pos);
    }

    #[test]
    fn test_missing_template_aborts() {
        let vocabulary = TokenVocabulary::builtin();
        let mut store = TemplateStore::new();
        store
            .insert(
                TemplateKey::new(LayerKind::Repository, TemplateVariant::Contract),
                "interface IMODEL_NAMERepository {}",
                &vocabulary,
            )
            .unwrap();
        let pipeline =
            GenerationPipeline::new(&store, NamingResolver::new(), PipelineConfig::default());
        assert!(matches!(
            pipeline.render(&schema()),
            Err(GenerationError::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn test_applicable_templates_by_flags() {
        let dto = CapabilityFlags {
            has_dto: true,
            has_view: false,
            entity_only: false,
        };
        let keys = GenerationPipeline::applicable_templates(&dto);
        assert!(keys.contains(&TemplateKey::new(
            LayerKind::Controller,
            TemplateVariant::DtoBacked
        )));
        assert!(keys.contains(&TemplateKey::new(LayerKind::Dto, TemplateVariant::Implementation)));

        let view = CapabilityFlags {
            has_dto: false,
            has_view: true,
            entity_only: false,
        };
        let keys = GenerationPipeline::applicable_templates(&view);
        assert!(keys.contains(&TemplateKey::new(
            LayerKind::Controller,
            TemplateVariant::ReadOnly
        )));

        let plain = CapabilityFlags::default();
        let keys = GenerationPipeline::applicable_templates(&plain);
        assert!(keys.contains(&TemplateKey::new(
            LayerKind::Controller,
            TemplateVariant::EntityOnly
        )));
        assert!(!keys
            .iter()
            .any(|k| k.layer == LayerKind::Dto));
    }

    #[test]
    fn test_entity_paths() {
        let store = store();
        let pipeline =
            GenerationPipeline::new(&store, NamingResolver::new(), PipelineConfig::default());
        let artifacts = pipeline.render(&schema()).unwrap();

        let dto = artifacts
            .iter()
            .find(|a| a.layer == LayerKind::Dto && a.entity.as_deref() == Some("Item"))
            .unwrap();
        assert_eq!(
            dto.path,
            PathBuf::from("Domain/InventorySchema/ItemDto.cs")
        );

        let contract = artifacts
            .iter()
            .find(|a| {
                a.layer == LayerKind::Repository
                    && a.variant == TemplateVariant::Contract
                    && a.entity.as_deref() == Some("Order")
            })
            .unwrap();
        assert_eq!(
            contract.path,
            PathBuf::from("Repository/Contracts/InventorySchema/IOrderRepository.cs")
        );
    }

    #[test]
    fn test_reserved_name_flows_through_safe_token() {
        let store = store();
        let schema = SchemaLoader::load_from_str(
            r#"
groups:
  - name: Common
    entities:
      - name: Range
        flags:
          has_dto: true
"#,
        )
        .unwrap();
        let pipeline =
            GenerationPipeline::new(&store, NamingResolver::new(), PipelineConfig::default());
        let artifacts = pipeline.render(&schema).unwrap();

        let contract = artifacts
            .iter()
            .find(|a| a.layer == LayerKind::Repository && a.variant == TemplateVariant::Contract)
            .unwrap();
        assert!(contract.content.contains("IRangeRepository"));
        assert!(contract.content.contains("IRepository<RangeModel>"));
    }
}
