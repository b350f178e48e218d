use crate::model::StageKind;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Typed failure taxonomy for the pipeline core.
///
/// `ArtifactNotFound` and `RunNotFound` are recoverable lookups; callers
/// decide whether to surface them as empty state. `OutOfOrder` and
/// `UpstreamMissing` are ordering violations and are never retried
/// automatically. `SourceUnavailable` / `InferenceUnavailable` are
/// transient; re-running the stage is safe.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("run not found: {0}")]
    RunNotFound(Uuid),

    #[error("unknown model variant: {0}")]
    VariantNotFound(String),

    #[error("no {stage} artifact for run {run_id}, variant {variant}")]
    ArtifactNotFound {
        run_id: Uuid,
        variant: String,
        stage: StageKind,
    },

    #[error("cannot run {requested} before {missing} has completed")]
    OutOfOrder {
        requested: StageKind,
        missing: StageKind,
    },

    #[error("{stage} requires a completed {missing} artifact for this run and variant")]
    UpstreamMissing {
        stage: StageKind,
        missing: StageKind,
    },

    #[error("video source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("inference backend unavailable: {0}")]
    InferenceUnavailable(String),

    #[error("item {video_id} not found in {stage} artifact")]
    ItemNotFound {
        video_id: String,
        stage: StageKind,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

impl PipelineError {
    /// True for absent-state errors the boundary maps to a 404-equivalent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PipelineError::RunNotFound(_)
                | PipelineError::VariantNotFound(_)
                | PipelineError::ArtifactNotFound { .. }
                | PipelineError::ItemNotFound { .. }
        )
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Storage(format!("artifact encoding: {}", e))
    }
}

#[derive(Debug)]
pub struct ConfigError(pub String);

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfigError: {}", self.0)
    }
}
impl std::error::Error for ConfigError {}
