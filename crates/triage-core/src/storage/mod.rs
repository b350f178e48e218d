//! Artifact persistence keyed by (run, variant, stage).
//!
//! The trait is storage-agnostic; the shipping backend is a plain file
//! hierarchy (`fs::FsStore`). Writes are atomic replacements: a reader
//! either sees the previous complete artifact or the new one, never a
//! partial file.

pub mod fs;

pub use fs::FsStore;

use crate::errors::PipelineError;
use crate::model::{Artifact, RunMeta, StageKind, StageRecords};
use uuid::Uuid;

pub trait ArtifactStore: Send + Sync {
    /// Persists run identity + date filter. Fails if the run already exists.
    fn create_run(&self, meta: &RunMeta) -> Result<(), PipelineError>;

    fn read_run(&self, run_id: Uuid) -> Result<RunMeta, PipelineError>;

    fn list_runs(&self) -> Result<Vec<Uuid>, PipelineError>;

    /// Catalog variants that have at least one stage artifact for this run.
    fn list_variants_with_data(&self, run_id: Uuid) -> Result<Vec<String>, PipelineError>;

    /// Atomically replaces the artifact for (run, variant, stage of
    /// `records`). Creates the storage location lazily; never touches a
    /// different stage's artifact. Returns the stored artifact with its
    /// write timestamp.
    fn write(
        &self,
        run_id: Uuid,
        variant: &str,
        records: StageRecords,
    ) -> Result<Artifact, PipelineError>;

    /// Most recent complete artifact for the triple, or `ArtifactNotFound`
    /// if the stage never completed here.
    fn read(&self, run_id: Uuid, variant: &str, stage: StageKind)
        -> Result<Artifact, PipelineError>;
}
