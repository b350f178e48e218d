//! Run lifecycle: creation, resumption, and ordered stage advancement.

pub mod orchestrator;

pub use orchestrator::Orchestrator;

use crate::model::{RunMeta, StageKind};
use serde::Serialize;
use uuid::Uuid;

/// How far a (run, variant) pair has progressed. Computed from artifact
/// presence, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageProgress {
    NotStarted,
    Pulled,
    Described,
    Judged,
}

/// Snapshot of one (run, variant) state machine. `stale` lists stages whose
/// artifact predates its upstream artifact, the known inconsistency left
/// behind when an upstream stage is re-run. The data is kept, only flagged.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    pub run_id: Uuid,
    pub variant: String,
    pub progress: StageProgress,
    pub stale: Vec<StageKind>,
}

/// Run-level view for resumption: the run's identity plus the state of
/// every variant that has data.
#[derive(Debug, Clone, Serialize)]
pub struct RunOverview {
    pub meta: RunMeta,
    pub variants: Vec<RunState>,
}
