//! Transport-agnostic boundary surface. An HTTP layer (or the CLI) maps
//! these calls 1:1 to its routes; nothing here knows about transports.

use crate::config::Settings;
use crate::engine::{Orchestrator, RunOverview, RunState};
use crate::errors::{ConfigError, PipelineError};
use crate::model::{Artifact, DateFilter, StageKind, StageRecords, Verdict};
use crate::providers::llm::{ClientRouter, FakeClient, LlmClient, OpenAiCompatClient};
use crate::providers::source::{FakeSource, HttpVideoSource, VideoSource};
use crate::registry::{self, InputMode, ModelFamily, ModelVariant, ReasoningMode};
use crate::storage::{ArtifactStore, FsStore};
use crate::summary::{self, CategorySummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Boundary listing entry for one catalog variant.
#[derive(Debug, Clone, Serialize)]
pub struct VariantInfo {
    pub name: &'static str,
    pub family: ModelFamily,
    pub reasoning_mode: ReasoningMode,
    pub input_mode: InputMode,
}

impl From<&ModelVariant> for VariantInfo {
    fn from(v: &ModelVariant) -> Self {
        Self {
            name: v.name,
            family: v.family,
            reasoning_mode: v.reasoning,
            input_mode: v.input_mode,
        }
    }
}

/// What a completed `run_stage` call reports back.
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub status: &'static str,
    pub stage: StageKind,
    pub records: usize,
    pub failed_items: usize,
    pub written_at: DateTime<Utc>,
}

impl StageOutcome {
    fn from_artifact(artifact: &Artifact) -> Self {
        Self {
            status: "complete",
            stage: artifact.stage(),
            records: artifact.records.len(),
            failed_items: artifact.records.failed_items(),
            written_at: artifact.written_at,
        }
    }
}

pub struct ReviewService {
    orchestrator: Orchestrator,
    store: Arc<dyn ArtifactStore>,
}

impl std::fmt::Debug for ReviewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewService").finish_non_exhaustive()
    }
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        source: Arc<dyn VideoSource>,
        clients: ClientRouter,
        parallel: usize,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(store.clone(), source, clients, parallel),
            store,
        }
    }

    /// Wires the file store and the configured providers together.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let store = Arc::new(FsStore::new(settings.data_dir.clone()));
        let timeout = Duration::from_secs(settings.request_timeout_secs);

        let source: Arc<dyn VideoSource> = match settings.source.provider.as_str() {
            "fake" => Arc::new(FakeSource::empty()),
            "http" => {
                let base_url = settings.source.base_url.clone().ok_or_else(|| {
                    ConfigError("source.base_url is required for the http source".into())
                })?;
                Arc::new(HttpVideoSource::new(base_url))
            }
            other => return Err(ConfigError(format!("unknown source provider: {}", other))),
        };

        let clients = match settings.inference.provider.as_str() {
            "fake" => ClientRouter::single(Arc::new(FakeClient::new("fake"))),
            "openai-compat" => {
                let base_url = settings.inference.base_url.clone().ok_or_else(|| {
                    ConfigError("inference.base_url is required for openai-compat".into())
                })?;
                let api_key = match &settings.inference.api_key_env {
                    Some(var) => Some(std::env::var(var).map_err(|_| {
                        ConfigError(format!("api key environment variable {} is not set", var))
                    })?),
                    None => None,
                };
                let make = |model: &str| -> Arc<dyn LlmClient> {
                    Arc::new(
                        OpenAiCompatClient::new(
                            base_url.clone(),
                            model.to_string(),
                            api_key.clone(),
                        )
                        .with_timeout(timeout),
                    )
                };
                ClientRouter::new(
                    make(&settings.inference.qwen_model),
                    make(&settings.inference.smol_model),
                )
            }
            other => {
                return Err(ConfigError(format!(
                    "unknown inference provider: {}",
                    other
                )))
            }
        };

        Ok(Self::new(store, source, clients, settings.parallel))
    }

    pub fn create_run(&self, date_filter: Option<DateFilter>) -> Result<Uuid, PipelineError> {
        Ok(self.orchestrator.create_run(date_filter)?.run_id)
    }

    pub async fn run_stage(
        &self,
        run_id: Uuid,
        variant_name: &str,
        stage: StageKind,
    ) -> Result<StageOutcome, PipelineError> {
        let variant = registry::get(variant_name)?;
        let artifact = self.orchestrator.advance(run_id, variant, stage).await?;
        Ok(StageOutcome::from_artifact(&artifact))
    }

    pub fn list_variants(&self) -> Vec<VariantInfo> {
        registry::variants().iter().map(VariantInfo::from).collect()
    }

    pub fn list_runs(&self) -> Result<Vec<Uuid>, PipelineError> {
        self.store.list_runs()
    }

    /// Strict artifact lookup: a stage that never ran is `ArtifactNotFound`,
    /// never an empty record list.
    pub fn get_artifact(
        &self,
        run_id: Uuid,
        variant_name: &str,
        stage: StageKind,
    ) -> Result<Artifact, PipelineError> {
        let variant = registry::get(variant_name)?;
        self.store.read_run(run_id)?;
        self.store.read(run_id, variant.name, stage)
    }

    /// Verdict counts for the judge artifact. A missing judge artifact is
    /// the recoverable empty state: all-zero counts.
    pub fn get_summary(
        &self,
        run_id: Uuid,
        variant_name: &str,
    ) -> Result<CategorySummary, PipelineError> {
        let variant = registry::get(variant_name)?;
        self.store.read_run(run_id)?;
        match self.store.read(run_id, variant.name, StageKind::Judge) {
            Ok(artifact) => {
                let records = artifact.records.as_judge().ok_or_else(|| {
                    PipelineError::Storage("judge artifact has wrong row type".into())
                })?;
                Ok(summary::summarize(records))
            }
            Err(PipelineError::ArtifactNotFound { .. }) => Ok(CategorySummary::default()),
            Err(e) => Err(e),
        }
    }

    pub fn run_state(&self, run_id: Uuid, variant_name: &str) -> Result<RunState, PipelineError> {
        let variant = registry::get(variant_name)?;
        self.orchestrator.run_state(run_id, variant)
    }

    pub fn resume_run(&self, run_id: Uuid) -> Result<RunOverview, PipelineError> {
        self.orchestrator.resume_run(run_id)
    }

    /// Manual correction from the review UI: rewrites one judge record's
    /// verdict (clearing any error marker) and atomically replaces the
    /// judge artifact.
    pub fn override_verdict(
        &self,
        run_id: Uuid,
        variant_name: &str,
        video_id: &str,
        new_verdict: Verdict,
    ) -> Result<StageOutcome, PipelineError> {
        let variant = registry::get(variant_name)?;
        self.store.read_run(run_id)?;
        let artifact = self.store.read(run_id, variant.name, StageKind::Judge)?;
        let mut records = artifact
            .records
            .as_judge()
            .ok_or_else(|| PipelineError::Storage("judge artifact has wrong row type".into()))?
            .to_vec();

        let record = records
            .iter_mut()
            .find(|r| r.video_id == video_id)
            .ok_or_else(|| PipelineError::ItemNotFound {
                video_id: video_id.to_string(),
                stage: StageKind::Judge,
            })?;
        record.verdict = Some(new_verdict);
        record.error = None;

        info!(%run_id, variant = variant.name, video_id, ?new_verdict, "verdict overridden");
        let updated = self
            .store
            .write(run_id, variant.name, StageRecords::Judge(records))?;
        Ok(StageOutcome::from_artifact(&updated))
    }
}
