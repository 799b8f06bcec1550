//! Candidate languages for detection and the confusable-language table.
//!
//! Detection runs over the three Juportal languages plus the European
//! languages they are most often mistaken for, so a text in a language
//! Juportal never publishes in is reported as that language and not folded
//! into the nearest declared one. Codes are ISO 639-1, lowercase.

use lingua::Language;

pub const CANDIDATES: &[(Language, &str)] = &[
    (Language::French, "fr"),
    (Language::Dutch, "nl"),
    (Language::German, "de"),
    (Language::English, "en"),
    (Language::Afrikaans, "af"),
    (Language::Spanish, "es"),
    (Language::Italian, "it"),
    (Language::Portuguese, "pt"),
    (Language::Catalan, "ca"),
    (Language::Romanian, "ro"),
    (Language::Latin, "la"),
    (Language::Danish, "da"),
    (Language::Swedish, "sv"),
    (Language::Bokmal, "nb"),
    (Language::Polish, "pl"),
];

/// Pairs that cannot reliably be told apart on short legal text.
/// A detection of either member counts as the other.
pub const CONFUSABLE: &[(&str, &str)] = &[("nl", "af"), ("de", "lb")];

/// ISO 639-1 code of a candidate language.
pub fn code_of(language: Language) -> Option<&'static str> {
    CANDIDATES
        .iter()
        .find(|(candidate, _)| *candidate == language)
        .map(|&(_, code)| code)
}

/// Juportal language code (`FR`/`NL`/`DE`) to ISO 639-1.
pub fn iso_code(meta_language: &str) -> Option<&'static str> {
    match meta_language.trim().to_ascii_uppercase().as_str() {
        "FR" => Some("fr"),
        "NL" => Some("nl"),
        "DE" => Some("de"),
        _ => None,
    }
}

/// Human-readable name used in classification prompts.
pub fn language_name(meta_language: &str) -> &'static str {
    match iso_code(meta_language) {
        Some("fr") => "French",
        Some("nl") => "Dutch",
        Some("de") => "German",
        _ => "Unknown",
    }
}

/// Whether a detected code counts as the declared one.
pub fn counts_as(declared: &str, detected: &str) -> bool {
    declared == detected
        || CONFUSABLE
            .iter()
            .any(|&(a, b)| (a == declared && b == detected) || (b == declared && a == detected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusable_pairs_are_symmetric() {
        assert!(counts_as("nl", "af"));
        assert!(counts_as("af", "nl"));
        assert!(counts_as("de", "lb"));
        assert!(!counts_as("nl", "de"));
        assert!(!counts_as("fr", "en"));
        assert!(!counts_as("fr", "es"));
    }

    #[test]
    fn juportal_codes() {
        assert_eq!(iso_code(" nl "), Some("nl"));
        assert_eq!(iso_code("EN"), None);
        assert_eq!(language_name("DE"), "German");
    }

    #[test]
    fn candidates_cover_declared_languages_once() {
        for code in ["fr", "nl", "de", "af"] {
            assert_eq!(CANDIDATES.iter().filter(|(_, c)| *c == code).count(), 1, "{code}");
        }
        assert_eq!(code_of(Language::Spanish), Some("es"));
        assert_eq!(code_of(Language::Japanese), None);
    }
}
