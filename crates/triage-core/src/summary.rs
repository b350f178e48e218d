//! Reduces judge records into the three-way outcome counts the presentation
//! layer renders. Error-marked rows count as unjudged, never dropped.

use crate::model::{JudgeRecord, Verdict};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    #[serde(rename = "Yes")]
    pub yes: usize,
    #[serde(rename = "N/A")]
    pub not_applicable: usize,
    #[serde(rename = "No")]
    pub no: usize,
    #[serde(rename = "Unjudged")]
    pub unjudged: usize,
}

impl CategorySummary {
    pub fn total(&self) -> usize {
        self.yes + self.not_applicable + self.no + self.unjudged
    }
}

pub fn summarize(records: &[JudgeRecord]) -> CategorySummary {
    let mut summary = CategorySummary::default();
    for record in records {
        match record.verdict {
            Some(Verdict::Yes) => summary.yes += 1,
            Some(Verdict::NotApplicable) => summary.not_applicable += 1,
            Some(Verdict::No) => summary.no += 1,
            None => summary.unjudged += 1,
        }
    }
    summary
}
