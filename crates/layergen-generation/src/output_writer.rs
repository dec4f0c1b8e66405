//! Output writing for rendered artifacts
//!
//! The pipeline renders entirely in memory and hands the complete batch to an
//! [`ArtifactSink`] in one call, so rendering stays testable without a
//! filesystem and nothing is persisted unless every artifact rendered.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::GenerationError;
use crate::models::RenderedArtifact;

/// Result of writing a single artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Path the artifact was written to
    pub path: PathBuf,
    /// Whether an existing file was overwritten
    pub overwrote: bool,
}

/// Result of writing a batch
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    /// Per-artifact outcomes, in batch order
    pub outcomes: Vec<WriteOutcome>,
}

impl WriteReport {
    /// Number of artifacts written
    pub fn written(&self) -> usize {
        self.outcomes.len()
    }
}

/// External seam for persisting rendered artifacts
///
/// Implementations must be idempotent: writing the same batch twice leaves
/// the same files behind.
pub trait ArtifactSink {
    /// Persist a batch of artifacts
    ///
    /// Called exactly once per successful run, after every artifact has
    /// rendered. A failure aborts the run with no retry.
    fn write_all(&mut self, artifacts: &[RenderedArtifact]) -> Result<WriteReport, GenerationError>;
}

/// Writes artifacts under an output root with overwrite semantics
pub struct FsOutputWriter {
    root: PathBuf,
}

impl FsOutputWriter {
    /// Create a writer rooted at `root`; the directory is created on write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output root
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSink for FsOutputWriter {
    fn write_all(&mut self, artifacts: &[RenderedArtifact]) -> Result<WriteReport, GenerationError> {
        let mut report = WriteReport::default();

        for artifact in artifacts {
            let path = self.root.join(&artifact.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| GenerationError::Write {
                    path: path.clone(),
                    source,
                })?;
            }

            let overwrote = path.exists();
            fs::write(&path, &artifact.content).map_err(|source| GenerationError::Write {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), overwrote, "artifact written");

            report.outcomes.push(WriteOutcome { path, overwrote });
        }

        info!(written = report.written(), root = %self.root.display(), "output batch written");
        Ok(report)
    }
}

/// Records what would be written without touching the filesystem
#[derive(Debug, Default)]
pub struct DryRunWriter {
    /// Paths of the artifacts that would have been written
    pub paths: Vec<PathBuf>,
}

impl DryRunWriter {
    /// Create a dry-run writer
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactSink for DryRunWriter {
    fn write_all(&mut self, artifacts: &[RenderedArtifact]) -> Result<WriteReport, GenerationError> {
        let mut report = WriteReport::default();
        for artifact in artifacts {
            self.paths.push(artifact.path.clone());
            report.outcomes.push(WriteOutcome {
                path: artifact.path.clone(),
                overwrote: false,
            });
        }
        info!(artifacts = report.written(), "dry run, nothing written");
        Ok(report)
    }
}
