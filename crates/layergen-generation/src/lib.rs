#![warn(missing_docs)]

//! Layergen code generation engine
//!
//! Renders a layered CRUD source tree (controllers, repositories, services,
//! DTOs, and per-schema manager aggregates) from an ordered entity schema and a
//! set of parametrized templates. Rendering is a pure, deterministic
//! transformation; the only side-effecting step is the final output write.

pub mod error;
pub mod models;
pub mod naming;
pub mod output_writer;
pub mod pipeline;
pub mod store;
pub mod templates;

// Re-export public API
pub use error::{GenerationError, TemplateError};
pub use models::{
    CaseStyle, LayerKind, RenderedArtifact, Template, TemplateKey, TemplateVariant,
};
pub use naming::{NameSet, NamingResolver};
pub use output_writer::{ArtifactSink, DryRunWriter, FsOutputWriter, WriteOutcome, WriteReport};
pub use pipeline::{GenerationPipeline, PipelineConfig, RunReport, RunState};
pub use store::TemplateStore;
pub use templates::{
    expander::BlockExpander,
    parser::{ParsedTemplate, TemplateNode, TemplateParser},
    substitutor::{PlaceholderSubstitutor, SharedContext},
};
