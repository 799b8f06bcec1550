//! Non-fatal problems collected during a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    /// One field failed to extract; the record was still produced.
    Mapping,
    /// Malformed ECLI or date; the record carries a sentinel value.
    Parse,
    /// The document could not be read or transformed at all.
    Extraction,
    /// Stage-2 validation could not reach the classification service.
    ValidationUnavailable,
    /// Duplicate candidates were indistinguishable under the selection order.
    DedupAmbiguous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub file_name: Option<String>,
    pub kind: IssueKind,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}

impl Issue {
    pub fn new(file_name: Option<&str>, kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            file_name: file_name.map(str::to_string),
            kind,
            detail: detail.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn for_file(file_name: &str, kind: IssueKind, detail: impl Into<String>) -> Self {
        Self::new(Some(file_name), kind, detail)
    }
}
