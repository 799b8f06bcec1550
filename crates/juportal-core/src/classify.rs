//! Shared wire types for stage-2 language classification.

use serde::{Deserialize, Serialize};

/// One record submitted to the classification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationItem {
    pub file_name: String,
    /// Declared language code (`FR`, `NL`, `DE`).
    pub expected_language: String,
    /// Text sample the service judges.
    pub text: String,
}

/// The service's verdict for one item.
///
/// Field names follow the reply format the service is prompted for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub is_valid: bool,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_from_service_reply() {
        let json = r#"{"fileName":"a_FR.json","is_valid":true,"confidence":0.93,"explanation":"French legal text"}"#;
        let v: Verdict = serde_json::from_str(json).unwrap();
        assert_eq!(v.file_name, "a_FR.json");
        assert!(v.is_valid);
        assert!((v.confidence - 0.93).abs() < 1e-6);
        assert_eq!(v.detected_language, None);
    }

    #[test]
    fn verdict_without_confidence_defaults_to_zero() {
        let v: Verdict = serde_json::from_str(r#"{"fileName":"x","is_valid":true}"#).unwrap();
        assert_eq!(v.confidence, 0.0);
    }

    #[test]
    fn item_uses_camel_case() {
        let item = ClassificationItem {
            file_name: "x".into(),
            expected_language: "NL".into(),
            text: "t".into(),
        };
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["expectedLanguage"], "NL");
    }
}
