use crate::errors::PipelineError;
use crate::model::{Artifact, StageRecords};
use crate::providers::source::{PullWindow, VideoSource};
use crate::registry::ModelVariant;
use crate::storage::ArtifactStore;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Selects raw video items from the source within the run's date window and
/// persists them as the pull artifact. An empty selection is still a valid
/// artifact; only an unreachable source fails the stage.
pub struct PullStage {
    pub source: Arc<dyn VideoSource>,
}

impl PullStage {
    pub async fn run(
        &self,
        store: &dyn ArtifactStore,
        run_id: Uuid,
        variant: &ModelVariant,
    ) -> Result<Artifact, PipelineError> {
        let meta = store.read_run(run_id)?;
        let window = meta
            .date_filter
            .map(|filter| PullWindow::days_back(filter.days_back));

        let items = self
            .source
            .fetch(window.as_ref())
            .await
            .map_err(|e| PipelineError::SourceUnavailable(e.to_string()))?;

        if items.is_empty() {
            warn!(%run_id, variant = variant.name, "pull matched no items; persisting empty artifact");
        } else {
            info!(%run_id, variant = variant.name, items = items.len(), "pull complete");
        }

        store.write(run_id, variant.name, StageRecords::Pull(items))
    }
}
