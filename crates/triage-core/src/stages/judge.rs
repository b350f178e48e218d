use super::{fan_out, prompt};
use crate::errors::PipelineError;
use crate::model::{Artifact, DescribeRecord, JudgeRecord, StageKind, StageRecords};
use crate::providers::llm::{ClientRouter, LlmClient};
use crate::registry::ModelVariant;
use crate::storage::ArtifactStore;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Produces a Yes / N/A / No verdict with justification per described item.
/// Items whose describe step already failed are carried through unjudged
/// with an error marker, so the judge artifact stays 1:1 with describe.
pub struct JudgeStage {
    pub clients: ClientRouter,
    pub parallel: usize,
}

impl JudgeStage {
    pub async fn run(
        &self,
        store: &dyn ArtifactStore,
        run_id: Uuid,
        variant: &ModelVariant,
    ) -> Result<Artifact, PipelineError> {
        let upstream = match store.read(run_id, variant.name, StageKind::Describe) {
            Err(PipelineError::ArtifactNotFound { .. }) => {
                return Err(PipelineError::UpstreamMissing {
                    stage: StageKind::Judge,
                    missing: StageKind::Describe,
                })
            }
            other => other?,
        };
        let items = upstream
            .records
            .as_describe()
            .ok_or_else(|| PipelineError::Storage("describe artifact has wrong row type".into()))?
            .to_vec();

        let client = self.clients.for_family(variant.family);
        let variant = *variant;
        let records = fan_out(items, self.parallel, |_, item| {
            judge_item(client.clone(), variant, item)
        })
        .await
        .map_err(|e| PipelineError::Storage(format!("judge task failed: {}", e)))?;

        let unjudged = records.iter().filter(|r| r.error.is_some()).count();
        if unjudged > 0 {
            warn!(%run_id, variant = variant.name, unjudged, total = records.len(),
                "judge finished with unjudged items");
        } else {
            info!(%run_id, variant = variant.name, items = records.len(), "judge complete");
        }

        store.write(run_id, variant.name, StageRecords::Judge(records))
    }
}

async fn judge_item(
    client: Arc<dyn LlmClient>,
    variant: ModelVariant,
    item: DescribeRecord,
) -> JudgeRecord {
    if let Some(upstream_error) = &item.error {
        return unjudged_item(
            item.video_id.clone(),
            format!("describe failed upstream: {}", upstream_error),
        );
    }

    let (system, user) = prompt::judge_prompt(&variant, &item);
    match client.complete(&user, Some(&system)).await {
        Ok(resp) => match prompt::parse_judge_output(&resp.text) {
            Ok((verdict, justification)) => JudgeRecord {
                video_id: item.video_id,
                verdict: Some(verdict),
                justification,
                error: None,
            },
            Err(e) => unjudged_item(item.video_id, format!("unparseable model output: {}", e)),
        },
        Err(e) => unjudged_item(item.video_id, format!("inference call failed: {}", e)),
    }
}

fn unjudged_item(video_id: String, error: String) -> JudgeRecord {
    JudgeRecord {
        video_id,
        verdict: None,
        justification: String::new(),
        error: Some(error),
    }
}
