use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Run identity and the pull-stage date filter. Written once as `run.json`
/// when the run is created; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_filter: Option<DateFilter>,
}

impl RunMeta {
    pub fn new(date_filter: Option<DateFilter>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            date_filter,
        }
    }
}

/// Days-back window for the pull stage, evaluated against the fixed
/// Asia/Seoul calendar (see `config::seoul_offset`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFilter {
    pub days_back: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Pull,
    Describe,
    Judge,
}

impl StageKind {
    pub const ALL: [StageKind; 3] = [StageKind::Pull, StageKind::Describe, StageKind::Judge];

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Pull => "pull",
            StageKind::Describe => "describe",
            StageKind::Judge => "judge",
        }
    }

    /// The stage whose artifact must exist before this one may run.
    pub fn upstream(self) -> Option<StageKind> {
        match self {
            StageKind::Pull => None,
            StageKind::Describe => Some(StageKind::Pull),
            StageKind::Judge => Some(StageKind::Describe),
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pull" => Ok(StageKind::Pull),
            "describe" => Ok(StageKind::Describe),
            "judge" => Ok(StageKind::Judge),
            other => Err(format!("unknown stage: {}", other)),
        }
    }
}

/// Three-way judgement outcome. Serialized with the exact labels the
/// presentation layer displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Yes")]
    Yes,
    #[serde(rename = "N/A")]
    NotApplicable,
    #[serde(rename = "No")]
    No,
}

impl std::str::FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Yes" | "yes" => Ok(Verdict::Yes),
            "N/A" | "n/a" | "na" => Ok(Verdict::NotApplicable),
            "No" | "no" => Ok(Verdict::No),
            other => Err(format!("unknown verdict: {}", other)),
        }
    }
}

/// One raw item selected by the pull stage. `video_id` is the stable join
/// key carried through describe and judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRecord {
    pub video_id: String,
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub product_id: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInfo {
    pub brand: String,
    pub price: String,
    pub spec: String,
    pub category: String,
}

/// Describe-stage row. A failed item keeps its slot with `error` set so the
/// artifact stays 1:1 with the pull artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeRecord {
    pub video_id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_info: Option<ProductInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Judge-stage row. `verdict` is absent exactly when `error` is set; the
/// categorizer counts such rows as unjudged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeRecord {
    pub video_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    pub justification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Stage-typed record vectors. The store serializes the rows and remembers
/// the stage kind in the artifact envelope, so reads come back typed.
#[derive(Debug, Clone)]
pub enum StageRecords {
    Pull(Vec<PullRecord>),
    Describe(Vec<DescribeRecord>),
    Judge(Vec<JudgeRecord>),
}

impl StageRecords {
    pub fn stage(&self) -> StageKind {
        match self {
            StageRecords::Pull(_) => StageKind::Pull,
            StageRecords::Describe(_) => StageKind::Describe,
            StageRecords::Judge(_) => StageKind::Judge,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StageRecords::Pull(r) => r.len(),
            StageRecords::Describe(r) => r.len(),
            StageRecords::Judge(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows that completed with an inline error marker instead of output.
    pub fn failed_items(&self) -> usize {
        match self {
            StageRecords::Pull(_) => 0,
            StageRecords::Describe(r) => r.iter().filter(|r| r.error.is_some()).count(),
            StageRecords::Judge(r) => r.iter().filter(|r| r.error.is_some()).count(),
        }
    }

    pub fn as_pull(&self) -> Option<&[PullRecord]> {
        match self {
            StageRecords::Pull(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_describe(&self) -> Option<&[DescribeRecord]> {
        match self {
            StageRecords::Describe(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_judge(&self) -> Option<&[JudgeRecord]> {
        match self {
            StageRecords::Judge(r) => Some(r),
            _ => None,
        }
    }
}

/// A completed stage output for one (run, variant, stage) triple.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub run_id: Uuid,
    pub variant: String,
    pub written_at: DateTime<Utc>,
    pub records: StageRecords,
}

impl Artifact {
    pub fn stage(&self) -> StageKind {
        self.records.stage()
    }

    /// Boundary JSON view: envelope fields plus the typed rows.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        let records = match &self.records {
            StageRecords::Pull(r) => serde_json::to_value(r)?,
            StageRecords::Describe(r) => serde_json::to_value(r)?,
            StageRecords::Judge(r) => serde_json::to_value(r)?,
        };
        Ok(serde_json::json!({
            "run_id": self.run_id,
            "variant": self.variant,
            "stage": self.stage(),
            "written_at": self.written_at,
            "records": records,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_serializes_with_display_labels() {
        assert_eq!(serde_json::to_string(&Verdict::Yes).unwrap(), "\"Yes\"");
        assert_eq!(
            serde_json::to_string(&Verdict::NotApplicable).unwrap(),
            "\"N/A\""
        );
        assert_eq!(serde_json::to_string(&Verdict::No).unwrap(), "\"No\"");
    }

    #[test]
    fn stage_upstream_chain() {
        assert_eq!(StageKind::Pull.upstream(), None);
        assert_eq!(StageKind::Describe.upstream(), Some(StageKind::Pull));
        assert_eq!(StageKind::Judge.upstream(), Some(StageKind::Describe));
    }

    #[test]
    fn stage_parses_round_trip() {
        for stage in StageKind::ALL {
            assert_eq!(stage.as_str().parse::<StageKind>().unwrap(), stage);
        }
        assert!("pulled".parse::<StageKind>().is_err());
    }
}
