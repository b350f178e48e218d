use super::{fan_out, prompt};
use crate::errors::PipelineError;
use crate::model::{Artifact, DescribeRecord, PullRecord, StageKind, StageRecords};
use crate::providers::llm::{ClientRouter, LlmClient};
use crate::registry::ModelVariant;
use crate::storage::ArtifactStore;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Turns each pulled item into a generated description + product-info block
/// using the variant's client. Items run independently under the bounded
/// fan-out; a failed item keeps its row with an error marker so the output
/// stays 1:1 with the pull artifact.
pub struct DescribeStage {
    pub clients: ClientRouter,
    pub parallel: usize,
}

impl DescribeStage {
    pub async fn run(
        &self,
        store: &dyn ArtifactStore,
        run_id: Uuid,
        variant: &ModelVariant,
    ) -> Result<Artifact, PipelineError> {
        let upstream = match store.read(run_id, variant.name, StageKind::Pull) {
            Err(PipelineError::ArtifactNotFound { .. }) => {
                return Err(PipelineError::UpstreamMissing {
                    stage: StageKind::Describe,
                    missing: StageKind::Pull,
                })
            }
            other => other?,
        };
        let items = upstream
            .records
            .as_pull()
            .ok_or_else(|| PipelineError::Storage("pull artifact has wrong row type".into()))?
            .to_vec();

        let client = self.clients.for_family(variant.family);
        let variant = *variant;
        let records = fan_out(items, self.parallel, |_, item| {
            describe_item(client.clone(), variant, item)
        })
        .await
        .map_err(|e| PipelineError::Storage(format!("describe task failed: {}", e)))?;

        let failed = records.iter().filter(|r| r.error.is_some()).count();
        if failed > 0 {
            warn!(%run_id, variant = variant.name, failed, total = records.len(),
                "describe finished with per-item failures");
        } else {
            info!(%run_id, variant = variant.name, items = records.len(), "describe complete");
        }

        store.write(run_id, variant.name, StageRecords::Describe(records))
    }
}

async fn describe_item(
    client: Arc<dyn LlmClient>,
    variant: ModelVariant,
    item: PullRecord,
) -> DescribeRecord {
    let (system, user) = prompt::describe_prompt(&variant, &item);
    match client.complete(&user, Some(&system)).await {
        Ok(resp) => match prompt::parse_describe_output(&resp.text) {
            Ok((description, product_info)) => DescribeRecord {
                video_id: item.video_id,
                description,
                product_info,
                error: None,
            },
            Err(e) => failed_item(item.video_id, format!("unparseable model output: {}", e)),
        },
        Err(e) => failed_item(item.video_id, format!("inference call failed: {}", e)),
    }
}

fn failed_item(video_id: String, error: String) -> DescribeRecord {
    DescribeRecord {
        video_id,
        description: String::new(),
        product_info: None,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunMeta;
    use crate::providers::llm::FakeClient;
    use crate::registry;
    use crate::storage::FsStore;
    use chrono::Utc;
    use tempfile::tempdir;

    fn seeded_store(dir: &std::path::Path, items: usize) -> (FsStore, Uuid) {
        let store = FsStore::new(dir);
        let meta = RunMeta::new(None);
        store.create_run(&meta).unwrap();
        let records: Vec<PullRecord> = (0..items)
            .map(|i| PullRecord {
                video_id: format!("v{:03}", i),
                title: format!("clip {}", i),
                video_url: format!("http://cdn.example/v{}.mp4", i),
                thumbnail_url: format!("http://cdn.example/v{}.jpg", i),
                product_id: format!("P{:04}", i),
                published_at: Utc::now(),
            })
            .collect();
        store
            .write(
                meta.run_id,
                "qwen-cot-video-image-info",
                StageRecords::Pull(records),
            )
            .unwrap();
        (store, meta.run_id)
    }

    const GOOD_REPLY: &str = r#"{"description": "a kettle", "product_info": {"brand": "BrandA", "price": "$30", "spec": "1.7L", "category": "Home"}}"#;

    #[tokio::test]
    async fn describe_keeps_one_to_one_correspondence() {
        let dir = tempdir().unwrap();
        let (store, run_id) = seeded_store(dir.path(), 5);
        let stage = DescribeStage {
            clients: ClientRouter::single(Arc::new(
                FakeClient::new("mock").with_response(GOOD_REPLY),
            )),
            parallel: 3,
        };
        let variant = registry::get("qwen-cot-video-image-info").unwrap();
        let artifact = stage.run(&store, run_id, variant).await.unwrap();
        let rows = artifact.records.as_describe().unwrap();
        assert_eq!(rows.len(), 5);
        // Order matches the pull artifact.
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.video_id, format!("v{:03}", i));
            assert!(row.error.is_none());
            assert_eq!(row.product_info.as_ref().unwrap().brand, "BrandA");
        }
    }

    #[tokio::test]
    async fn failed_item_is_marked_not_dropped() {
        let dir = tempdir().unwrap();
        let (store, run_id) = seeded_store(dir.path(), 3);
        let client = FakeClient::new("mock");
        client.push_text(GOOD_REPLY);
        client.push_error("backend exploded");
        client.push_text(GOOD_REPLY);
        let stage = DescribeStage {
            clients: ClientRouter::single(Arc::new(client)),
            // Serial so the scripted replies line up with items.
            parallel: 1,
        };
        let variant = registry::get("qwen-cot-video-image-info").unwrap();
        let artifact = stage.run(&store, run_id, variant).await.unwrap();
        let rows = artifact.records.as_describe().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().filter(|r| r.error.is_some()).count(), 1);
        assert!(rows[1].error.as_ref().unwrap().contains("backend exploded"));
    }

    #[tokio::test]
    async fn unparseable_output_is_marked() {
        let dir = tempdir().unwrap();
        let (store, run_id) = seeded_store(dir.path(), 1);
        let stage = DescribeStage {
            clients: ClientRouter::single(Arc::new(
                FakeClient::new("mock").with_response("sorry, I cannot help with that"),
            )),
            parallel: 1,
        };
        let variant = registry::get("qwen-cot-video-image-info").unwrap();
        let artifact = stage.run(&store, run_id, variant).await.unwrap();
        let rows = artifact.records.as_describe().unwrap();
        assert!(rows[0].error.as_ref().unwrap().contains("unparseable"));
    }

    #[tokio::test]
    async fn missing_pull_is_upstream_missing() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let meta = RunMeta::new(None);
        store.create_run(&meta).unwrap();
        let stage = DescribeStage {
            clients: ClientRouter::single(Arc::new(FakeClient::new("mock"))),
            parallel: 1,
        };
        let variant = registry::get("smol-video-image-info").unwrap();
        let err = stage.run(&store, meta.run_id, variant).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UpstreamMissing {
                stage: StageKind::Describe,
                missing: StageKind::Pull,
            }
        ));
    }
}
