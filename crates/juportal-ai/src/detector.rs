//! Statistical language detection.
//!
//! Wraps a lingua n-gram detector restricted to the candidate languages.
//! Confidence values are relative over the candidates, so they sum to 1
//! whenever anything is detected.

use lingua::{LanguageDetector, LanguageDetectorBuilder};

use crate::languages::{self, CANDIDATES};

/// Only the head of long texts is scanned.
const MAX_CHARS: usize = 2000;

pub struct Detector {
    inner: LanguageDetector,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector {
    pub fn new() -> Self {
        let candidates: Vec<_> = CANDIDATES.iter().map(|&(language, _)| language).collect();
        Self {
            inner: LanguageDetectorBuilder::from_languages(&candidates).build(),
        }
    }

    /// Detected languages with probabilities, best first.
    ///
    /// Empty when the text carries no letters to judge.
    pub fn detect(&self, text: &str) -> Vec<(String, f32)> {
        let head: String = text.chars().take(MAX_CHARS).collect::<String>().to_lowercase();
        let mut results: Vec<(String, f32)> = self
            .inner
            .compute_language_confidence_values(head)
            .into_iter()
            .filter(|&(_, confidence)| confidence > 0.0)
            .filter_map(|(language, confidence)| {
                languages::code_of(language).map(|code| (code.to_string(), confidence as f32))
            })
            .collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        results
    }

    /// Single best language, if any.
    pub fn best_match(&self, text: &str) -> Option<(String, f32)> {
        self.detect(text).into_iter().next()
    }
}
