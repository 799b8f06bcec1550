//! Output record schema.
//!
//! The field list downstream consumers rely on. [`missing_fields`] checks a
//! JSON object against it, e.g. before reloading a previous run's output.

/// Stable output field set, in emission order.
pub const OUTPUT_FIELDS: &[&str] = &[
    "fileName",
    "ecli",
    "url",
    "source",
    "metaLanguage",
    "jurisdiction",
    "courtEcliCode",
    "decisionTypeEcliCode",
    "decisionDate",
    "full_text",
    "full_textHtml",
    "pdfUrl",
    "notices",
    "citing",
    "precedent",
    "citedIn",
    "justel",
    "seeMoreRecently",
    "precededBy",
    "followedBy",
    "rectification",
    "relatedCase",
    "isValid",
];

/// Additional decision-card and validation fields emitted after the stable set.
pub const EXTENSION_FIELDS: &[&str] = &[
    "rolNumber",
    "chamber",
    "fieldOfLaw",
    "case",
    "versions",
    "ecliAlias",
    "opinionPublicAttorney",
    "validationStatus",
    "validationConfidence",
    "validationMethod",
];

/// Stable fields absent from a JSON object. Non-objects miss everything.
pub fn missing_fields(value: &serde_json::Value) -> Vec<&'static str> {
    match value.as_object() {
        Some(obj) => OUTPUT_FIELDS
            .iter()
            .copied()
            .filter(|f| !obj.contains_key(*f))
            .collect(),
        None => OUTPUT_FIELDS.to_vec(),
    }
}
