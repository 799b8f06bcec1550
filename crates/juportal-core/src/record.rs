//! The flattened output record.

use serde::{Deserialize, Serialize};

use crate::ecli::INVALID_URL;
use crate::mapping::TargetField;
use crate::notice::Notice;

pub const SOURCE: &str = "juportal.be";

/// Related-publication references, each an ordered list (never absent).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelatedPublications {
    pub citing: Vec<String>,
    pub precedent: Vec<String>,
    pub cited_in: Vec<String>,
    pub justel: Vec<String>,
    pub see_more_recently: Vec<String>,
    pub preceded_by: Vec<String>,
    pub followed_by: Vec<String>,
    pub rectification: Vec<String>,
    pub related_case: Vec<String>,
}

impl RelatedPublications {
    pub const FIELDS: [TargetField; 9] = [
        TargetField::Citing,
        TargetField::Precedent,
        TargetField::CitedIn,
        TargetField::Justel,
        TargetField::SeeMoreRecently,
        TargetField::PrecededBy,
        TargetField::FollowedBy,
        TargetField::Rectification,
        TargetField::RelatedCase,
    ];

    pub fn get(&self, field: TargetField) -> &[String] {
        match field {
            TargetField::Citing => &self.citing,
            TargetField::Precedent => &self.precedent,
            TargetField::CitedIn => &self.cited_in,
            TargetField::Justel => &self.justel,
            TargetField::SeeMoreRecently => &self.see_more_recently,
            TargetField::PrecededBy => &self.preceded_by,
            TargetField::FollowedBy => &self.followed_by,
            TargetField::Rectification => &self.rectification,
            TargetField::RelatedCase => &self.related_case,
            _ => &[],
        }
    }

    pub fn get_mut(&mut self, field: TargetField) -> Option<&mut Vec<String>> {
        match field {
            TargetField::Citing => Some(&mut self.citing),
            TargetField::Precedent => Some(&mut self.precedent),
            TargetField::CitedIn => Some(&mut self.cited_in),
            TargetField::Justel => Some(&mut self.justel),
            TargetField::SeeMoreRecently => Some(&mut self.see_more_recently),
            TargetField::PrecededBy => Some(&mut self.preceded_by),
            TargetField::FollowedBy => Some(&mut self.followed_by),
            TargetField::Rectification => Some(&mut self.rectification),
            TargetField::RelatedCase => Some(&mut self.related_case),
            _ => None,
        }
    }

    pub fn populated(&self) -> usize {
        Self::FIELDS
            .iter()
            .filter(|f| !self.get(**f).is_empty())
            .count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Invalid,
    #[default]
    Uncertain,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMethod {
    Rule,
    Llm,
    #[default]
    Unresolved,
}

/// One decision, flattened.
///
/// Built by the record transformer. Afterwards only deduplication (removal)
/// and stage-2 validation ([`TransformedRecord::set_validation`]) touch it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformedRecord {
    pub file_name: String,
    pub ecli: String,
    pub url: String,
    pub source: String,
    pub meta_language: String,
    pub jurisdiction: String,
    pub court_ecli_code: String,
    pub decision_type_ecli_code: String,
    /// `YYYY-MM-DD`, a bare `YYYY` when only the year is known, or empty.
    pub decision_date: String,
    #[serde(rename = "full_text")]
    pub full_text: String,
    #[serde(rename = "full_textHtml")]
    pub full_text_html: String,
    pub pdf_url: String,
    pub notices: Vec<Notice>,
    #[serde(flatten)]
    pub related: RelatedPublications,
    pub is_valid: bool,

    pub rol_number: String,
    pub chamber: String,
    pub field_of_law: String,
    pub case: String,
    pub versions: Vec<String>,
    pub ecli_alias: Vec<String>,
    pub opinion_public_attorney: String,

    pub validation_status: ValidationStatus,
    pub validation_confidence: f32,
    pub validation_method: ValidationMethod,
}

impl TransformedRecord {
    /// Count of non-empty content fields, used to rank duplicate candidates.
    pub fn populated_field_count(&self) -> usize {
        let scalars = [
            &self.ecli,
            &self.meta_language,
            &self.jurisdiction,
            &self.court_ecli_code,
            &self.decision_type_ecli_code,
            &self.decision_date,
            &self.full_text,
            &self.full_text_html,
            &self.pdf_url,
            &self.rol_number,
            &self.chamber,
            &self.field_of_law,
            &self.case,
            &self.opinion_public_attorney,
        ];
        let lists = [&self.versions, &self.ecli_alias];

        let url = usize::from(!self.url.is_empty() && self.url != INVALID_URL);
        scalars.iter().filter(|s| !s.is_empty()).count()
            + lists.iter().filter(|l| !l.is_empty()).count()
            + usize::from(!self.notices.is_empty())
            + self.related.populated()
            + url
    }

    /// Record a validation outcome. `isValid` follows the status.
    pub fn set_validation(&mut self, status: ValidationStatus, method: ValidationMethod, confidence: f32) {
        self.validation_status = status;
        self.validation_method = method;
        self.validation_confidence = confidence;
        self.is_valid = status == ValidationStatus::Valid;
    }

    pub fn is_uncertain(&self) -> bool {
        self.validation_status == ValidationStatus::Uncertain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_fields_keep_their_snake_case_names() {
        let record = TransformedRecord {
            file_name: "a.json".into(),
            full_text: "x".into(),
            ..Default::default()
        };
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["fileName"], "a.json");
        assert_eq!(v["full_text"], "x");
        assert!(v.get("full_textHtml").is_some());
        assert!(v.get("fullText").is_none());
        assert_eq!(v["citedIn"], serde_json::json!([]));
        assert_eq!(v["validationStatus"], "uncertain");
        assert_eq!(v["validationMethod"], "unresolved");
    }

    #[test]
    fn set_validation_keeps_is_valid_in_step() {
        let mut record = TransformedRecord::default();
        record.set_validation(ValidationStatus::Valid, ValidationMethod::Rule, 0.9);
        assert!(record.is_valid);
        record.set_validation(ValidationStatus::Uncertain, ValidationMethod::Unresolved, 0.0);
        assert!(!record.is_valid);
        assert!(record.is_uncertain());
    }

    #[test]
    fn populated_count_ignores_sentinel_url() {
        let mut record = TransformedRecord {
            url: INVALID_URL.into(),
            ..Default::default()
        };
        assert_eq!(record.populated_field_count(), 0);
        record.related.citing.push("ECLI:BE:CASS:2007:ARR.1".into());
        record.chamber = "1F".into();
        assert_eq!(record.populated_field_count(), 2);
    }
}
