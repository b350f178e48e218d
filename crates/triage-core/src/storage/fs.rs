use super::ArtifactStore;
use crate::errors::PipelineError;
use crate::model::{
    Artifact, DescribeRecord, JudgeRecord, PullRecord, RunMeta, StageKind, StageRecords,
};
use crate::registry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

const RUN_META_FILE: &str = "run.json";

/// On-disk envelope around the record rows. The stage kind travels with the
/// file so reads deserialize the rows with the right type.
#[derive(Serialize, Deserialize)]
struct ArtifactFile {
    run_id: Uuid,
    variant: String,
    stage: StageKind,
    written_at: DateTime<Utc>,
    records: serde_json::Value,
}

/// File-hierarchy artifact store:
/// `<root>/<run_uuid>/run.json` and `<root>/<run_uuid>/<variant>/<stage>.json`.
///
/// Triples map to distinct files, so writers for different triples cannot
/// interfere. Per-triple exclusivity relies on the single-active-stage
/// assumption plus the rename-style atomic replace.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run_dir(&self, run_id: Uuid) -> PathBuf {
        self.root.join(run_id.to_string())
    }

    fn artifact_path(&self, run_id: Uuid, variant: &str, stage: StageKind) -> PathBuf {
        self.run_dir(run_id)
            .join(variant)
            .join(format!("{}.json", stage.as_str()))
    }

    /// Write `bytes` to a sibling temp file, then rename over `path`.
    /// Readers only ever observe complete files.
    fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
        let parent = path
            .parent()
            .ok_or_else(|| PipelineError::Storage(format!("no parent for {}", path.display())))?;
        fs::create_dir_all(parent)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn decode_records(
        stage: StageKind,
        value: serde_json::Value,
    ) -> Result<StageRecords, PipelineError> {
        Ok(match stage {
            StageKind::Pull => StageRecords::Pull(serde_json::from_value::<Vec<PullRecord>>(value)?),
            StageKind::Describe => {
                StageRecords::Describe(serde_json::from_value::<Vec<DescribeRecord>>(value)?)
            }
            StageKind::Judge => {
                StageRecords::Judge(serde_json::from_value::<Vec<JudgeRecord>>(value)?)
            }
        })
    }

    fn encode_records(records: &StageRecords) -> Result<serde_json::Value, PipelineError> {
        Ok(match records {
            StageRecords::Pull(r) => serde_json::to_value(r)?,
            StageRecords::Describe(r) => serde_json::to_value(r)?,
            StageRecords::Judge(r) => serde_json::to_value(r)?,
        })
    }
}

impl ArtifactStore for FsStore {
    fn create_run(&self, meta: &RunMeta) -> Result<(), PipelineError> {
        let path = self.run_dir(meta.run_id).join(RUN_META_FILE);
        if path.exists() {
            return Err(PipelineError::Storage(format!(
                "run {} already exists",
                meta.run_id
            )));
        }
        let bytes = serde_json::to_vec_pretty(meta)?;
        Self::atomic_write(&path, &bytes)?;
        debug!(run_id = %meta.run_id, "created run");
        Ok(())
    }

    fn read_run(&self, run_id: Uuid) -> Result<RunMeta, PipelineError> {
        let path = self.run_dir(run_id).join(RUN_META_FILE);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::RunNotFound(run_id))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&raw)?)
    }

    fn list_runs(&self) -> Result<Vec<Uuid>, PipelineError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut runs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            // Non-UUID directories are not ours; skip them.
            if let Ok(id) = entry.file_name().to_string_lossy().parse::<Uuid>() {
                if entry.path().join(RUN_META_FILE).is_file() {
                    runs.push(id);
                }
            }
        }
        runs.sort_unstable();
        Ok(runs)
    }

    fn list_variants_with_data(&self, run_id: Uuid) -> Result<Vec<String>, PipelineError> {
        // Existence check first so a missing run is not an empty listing.
        self.read_run(run_id)?;
        let mut variants = Vec::new();
        for entry in fs::read_dir(self.run_dir(run_id))? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !registry::is_known(&name) {
                continue;
            }
            let has_artifact = StageKind::ALL
                .iter()
                .any(|s| entry.path().join(format!("{}.json", s.as_str())).is_file());
            if has_artifact {
                variants.push(name);
            }
        }
        // Catalog order, not directory order.
        variants
            .sort_by_key(|name| registry::variants().iter().position(|v| v.name == name.as_str()));
        Ok(variants)
    }

    fn write(
        &self,
        run_id: Uuid,
        variant: &str,
        records: StageRecords,
    ) -> Result<Artifact, PipelineError> {
        let stage = records.stage();
        let written_at = Utc::now();
        let file = ArtifactFile {
            run_id,
            variant: variant.to_string(),
            stage,
            written_at,
            records: Self::encode_records(&records)?,
        };
        let path = self.artifact_path(run_id, variant, stage);
        Self::atomic_write(&path, &serde_json::to_vec_pretty(&file)?)?;
        debug!(%run_id, variant, %stage, rows = records.len(), "artifact written");
        Ok(Artifact {
            run_id,
            variant: variant.to_string(),
            written_at,
            records,
        })
    }

    fn read(
        &self,
        run_id: Uuid,
        variant: &str,
        stage: StageKind,
    ) -> Result<Artifact, PipelineError> {
        let path = self.artifact_path(run_id, variant, stage);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::ArtifactNotFound {
                    run_id,
                    variant: variant.to_string(),
                    stage,
                })
            }
            Err(e) => return Err(e.into()),
        };
        let file: ArtifactFile = serde_json::from_slice(&raw)?;
        Ok(Artifact {
            run_id: file.run_id,
            variant: file.variant,
            written_at: file.written_at,
            records: Self::decode_records(file.stage, file.records)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DateFilter;
    use tempfile::tempdir;

    fn pull_records(n: usize) -> Vec<PullRecord> {
        (0..n)
            .map(|i| PullRecord {
                video_id: format!("v{:03}", i),
                title: format!("clip {}", i),
                video_url: format!("http://cdn.example/v{}.mp4", i),
                thumbnail_url: format!("http://cdn.example/v{}.jpg", i),
                product_id: format!("P{:04}", i),
                published_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn read_before_write_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let run_id = Uuid::new_v4();
        let err = store
            .read(run_id, "qwen-cot-video-image-info", StageKind::Judge)
            .unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactNotFound { .. }));
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let run_id = Uuid::new_v4();
        store
            .write(
                run_id,
                "qwen-video-image-raw",
                StageRecords::Pull(pull_records(3)),
            )
            .unwrap();
        let artifact = store
            .read(run_id, "qwen-video-image-raw", StageKind::Pull)
            .unwrap();
        assert_eq!(artifact.records.len(), 3);
        assert_eq!(artifact.records.as_pull().unwrap()[2].video_id, "v002");
    }

    #[test]
    fn double_write_replaces_instead_of_appending() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let run_id = Uuid::new_v4();
        let variant = "smol-description-info";
        store
            .write(run_id, variant, StageRecords::Pull(pull_records(5)))
            .unwrap();
        store
            .write(run_id, variant, StageRecords::Pull(pull_records(5)))
            .unwrap();
        let artifact = store.read(run_id, variant, StageKind::Pull).unwrap();
        assert_eq!(artifact.records.len(), 5);
    }

    #[test]
    fn writes_to_one_stage_leave_others_alone() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let run_id = Uuid::new_v4();
        let variant = "qwen-description-info";
        store
            .write(run_id, variant, StageRecords::Pull(pull_records(2)))
            .unwrap();
        store
            .write(
                run_id,
                variant,
                StageRecords::Describe(vec![
                    DescribeRecord {
                        video_id: "v000".into(),
                        description: "a".into(),
                        product_info: None,
                        error: None,
                    },
                    DescribeRecord {
                        video_id: "v001".into(),
                        description: "b".into(),
                        product_info: None,
                        error: None,
                    },
                ]),
            )
            .unwrap();
        let pull = store.read(run_id, variant, StageKind::Pull).unwrap();
        assert_eq!(pull.records.len(), 2);
        let describe = store.read(run_id, variant, StageKind::Describe).unwrap();
        assert_eq!(describe.records.len(), 2);
    }

    #[test]
    fn empty_artifact_is_distinct_from_missing() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let run_id = Uuid::new_v4();
        let variant = "smol-video-image-info";
        store
            .write(run_id, variant, StageRecords::Pull(Vec::new()))
            .unwrap();
        let artifact = store.read(run_id, variant, StageKind::Pull).unwrap();
        assert!(artifact.records.is_empty());
        // Describe remains missing, not empty.
        assert!(store.read(run_id, variant, StageKind::Describe).is_err());
    }

    #[test]
    fn run_meta_and_discovery() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        assert!(store.list_runs().unwrap().is_empty());

        let meta = RunMeta::new(Some(DateFilter { days_back: 7 }));
        store.create_run(&meta).unwrap();
        assert_eq!(store.list_runs().unwrap(), vec![meta.run_id]);

        let loaded = store.read_run(meta.run_id).unwrap();
        assert_eq!(loaded.date_filter, Some(DateFilter { days_back: 7 }));

        // Duplicate creation is refused.
        assert!(store.create_run(&meta).is_err());

        assert!(store
            .list_variants_with_data(meta.run_id)
            .unwrap()
            .is_empty());
        store
            .write(
                meta.run_id,
                "smol-cot-video-image-raw",
                StageRecords::Pull(pull_records(1)),
            )
            .unwrap();
        assert_eq!(
            store.list_variants_with_data(meta.run_id).unwrap(),
            vec!["smol-cot-video-image-raw".to_string()]
        );
    }

    #[test]
    fn unknown_run_listing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let err = store.list_variants_with_data(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, PipelineError::RunNotFound(_)));
    }
}
