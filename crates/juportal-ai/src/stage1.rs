//! Stage-1 rule validation: does the full text read as the declared language?

use juportal_core::{ValidationMethod, ValidationStatus};
use tracing::debug;

use crate::detector::Detector;
use crate::languages;

/// Outcome of rule validation for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleVerdict {
    pub status: ValidationStatus,
    /// Probability mass for the declared language (valid / uncertain) or for
    /// the detected foreign language (invalid).
    pub confidence: f32,
    pub detected: Option<String>,
}

impl RuleVerdict {
    fn uncertain(confidence: f32, detected: Option<String>) -> Self {
        Self {
            status: ValidationStatus::Uncertain,
            confidence,
            detected,
        }
    }

    /// Method to record alongside the status.
    pub fn method(&self) -> ValidationMethod {
        match self.status {
            ValidationStatus::Uncertain => ValidationMethod::Unresolved,
            _ => ValidationMethod::Rule,
        }
    }
}

pub struct RuleValidator {
    detector: Detector,
    min_chars: usize,
    confident: f32,
}

impl RuleValidator {
    pub fn new(min_chars: usize, confident: f32) -> Self {
        Self {
            detector: Detector::default(),
            min_chars,
            confident,
        }
    }

    /// Classify `full_text` against `meta_language` (`FR`/`NL`/`DE`).
    ///
    /// - confident match (confusable partners included) → `Valid`
    /// - confident, non-confusable mismatch → `Invalid`
    /// - short or empty text, weak evidence, unknown declared language → `Uncertain`
    pub fn validate(&self, meta_language: &str, full_text: &str) -> RuleVerdict {
        let Some(declared) = languages::iso_code(meta_language) else {
            debug!(meta_language, "undeclared or unsupported language");
            return RuleVerdict::uncertain(0.0, None);
        };
        if full_text.trim().chars().count() < self.min_chars {
            return RuleVerdict::uncertain(0.0, None);
        }

        let detections = self.detector.detect(full_text);
        let Some((top, top_prob)) = detections.first().cloned() else {
            return RuleVerdict::uncertain(0.0, None);
        };

        let matched: f32 = detections
            .iter()
            .filter(|(code, _)| languages::counts_as(declared, code))
            .map(|(_, p)| p)
            .sum();

        if matched >= self.confident {
            return RuleVerdict {
                status: ValidationStatus::Valid,
                confidence: matched,
                detected: Some(top),
            };
        }
        if !languages::counts_as(declared, &top) && top_prob >= self.confident {
            debug!(declared, detected = %top, prob = top_prob, "language mismatch");
            return RuleVerdict {
                status: ValidationStatus::Invalid,
                confidence: top_prob,
                detected: Some(top),
            };
        }
        RuleVerdict::uncertain(matched, Some(top))
    }
}

impl Default for RuleValidator {
    fn default() -> Self {
        Self::new(30, 0.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{DUTCH, FRENCH, GERMAN, ITALIAN, SPANISH};

    #[test]
    fn confident_french_is_valid_by_rule() {
        let v = RuleValidator::default().validate("FR", FRENCH);
        assert_eq!(v.status, ValidationStatus::Valid);
        assert_eq!(v.method(), ValidationMethod::Rule);
        assert!(v.confidence >= 0.7);
    }

    #[test]
    fn dutch_counts_afrikaans_evidence() {
        let v = RuleValidator::default().validate("NL", DUTCH);
        assert_eq!(v.status, ValidationStatus::Valid);
    }

    #[test]
    fn german_text_declared_french_is_invalid() {
        let v = RuleValidator::default().validate("FR", GERMAN);
        assert_eq!(v.status, ValidationStatus::Invalid);
        assert_eq!(v.detected.as_deref(), Some("de"));
    }

    #[test]
    fn empty_or_short_text_is_uncertain_never_invalid() {
        let r = RuleValidator::default();
        for text in ["", "   ", "Arrêt 12."] {
            let v = r.validate("FR", text);
            assert_eq!(v.status, ValidationStatus::Uncertain);
            assert_eq!(v.method(), ValidationMethod::Unresolved);
        }
    }

    #[test]
    fn unknown_declared_language_is_uncertain() {
        let v = RuleValidator::default().validate("", FRENCH);
        assert_eq!(v.status, ValidationStatus::Uncertain);
    }

    #[test]
    fn undeclared_neighbour_languages_never_pass_as_french() {
        let r = RuleValidator::default();
        for (text, code) in [(SPANISH, "es"), (ITALIAN, "it")] {
            let v = r.validate("FR", text);
            assert_ne!(v.status, ValidationStatus::Valid, "{code}");
            assert_eq!(v.detected.as_deref(), Some(code));
        }
    }
}
