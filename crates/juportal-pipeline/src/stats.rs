use chrono::{DateTime, Utc};
use juportal_ai::Stage2Report;
use juportal_core::{Issue, IssueKind, TransformedRecord, ValidationMethod};
use serde::{Deserialize, Serialize};

/// Counters and problems of one run. Built fresh per run and passed through
/// every stage explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Documents that produced a record.
    pub processed: usize,
    /// Records removed as aliases of a canonical record.
    pub deduplicated_out: usize,
    /// Skipped by decision type.
    pub skipped: usize,
    /// Documents that could not be read or parsed.
    pub failed: usize,
    pub validated_by_rule: usize,
    pub validated_by_llm: usize,
    /// Records still uncertain at the end of the run.
    pub unresolved: usize,
    pub stage2: Stage2Report,
    pub issues: Vec<Issue>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            processed: 0,
            deduplicated_out: 0,
            skipped: 0,
            failed: 0,
            validated_by_rule: 0,
            validated_by_llm: 0,
            unresolved: 0,
            stage2: Stage2Report::default(),
            issues: Vec::new(),
        }
    }

    pub fn record_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn issue_count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    /// Recount the validation counters from the final record set.
    pub fn tally_validation(&mut self, records: &[TransformedRecord]) {
        let count = |m: ValidationMethod| records.iter().filter(|r| r.validation_method == m).count();
        self.validated_by_rule = count(ValidationMethod::Rule);
        self.validated_by_llm = count(ValidationMethod::Llm);
        self.unresolved = count(ValidationMethod::Unresolved);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn stage2_degraded(&self) -> bool {
        self.stage2.is_degraded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use juportal_core::ValidationStatus;

    #[test]
    fn tally_counts_each_record_once() {
        let mut records = vec![TransformedRecord::default(); 4];
        records[0].set_validation(ValidationStatus::Valid, ValidationMethod::Rule, 0.9);
        records[1].set_validation(ValidationStatus::Invalid, ValidationMethod::Rule, 0.9);
        records[2].set_validation(ValidationStatus::Valid, ValidationMethod::Llm, 0.85);

        let mut stats = RunStats::new();
        stats.tally_validation(&records);
        assert_eq!(stats.validated_by_rule, 2);
        assert_eq!(stats.validated_by_llm, 1);
        assert_eq!(stats.unresolved, 1);
    }

    #[test]
    fn serializes_camel_case_without_stage2_issues() {
        let mut stats = RunStats::new();
        stats.record_issue(Issue::for_file("a.json", IssueKind::Parse, "bad date"));
        stats.finish();
        let v = serde_json::to_value(&stats).unwrap();
        assert!(v.get("deduplicatedOut").is_some());
        assert!(v.get("finishedAt").is_some());
        assert!(v["stage2"].get("issues").is_none());
        assert_eq!(v["issues"][0]["kind"], "parse");
        assert_eq!(stats.issue_count(IssueKind::Parse), 1);
    }
}
