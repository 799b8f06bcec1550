//! Plain-text and HTML helpers shared by the mapper and the transformer.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static PDF_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(document\s+pdf|pdf\s+document)\s+ECLI:[A-Z]{2}:[A-Z0-9]+:\d{4}:[\w.\-]+\s*$")
        .expect("valid regex")
});
static ECLI_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bECLI[:\-_][A-Z]{2}[:\-_][A-Z0-9]+[:\-_]\d{4}[:\-_][A-Z]+\.[A-Z0-9.]*[A-Z0-9]")
        .expect("valid regex")
});

/// Values that carry no content on Juportal ("-", en dash, empty).
fn is_placeholder(s: &str) -> bool {
    matches!(s, "" | "-" | "–" | ":")
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Remove markup and decode the handful of entities Juportal emits.
pub fn strip_tags(html: &str) -> String {
    let text = TAG.replace_all(html, "");
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    normalize_whitespace(&decoded)
}

/// Split an HTML fragment on `<br>` markup into plain-text lines.
///
/// Falls back to the paragraph's plain text when the HTML has no line breaks.
pub fn split_lines(html: &str, text: &str) -> Vec<String> {
    if !LINE_BREAK.is_match(html) {
        let single = normalize_whitespace(text);
        let single = if single.is_empty() { strip_tags(html) } else { single };
        return if is_placeholder(&single) { vec![] } else { vec![single] };
    }
    LINE_BREAK
        .split(html)
        .map(strip_tags)
        .filter(|line| !is_placeholder(line))
        .collect()
}

/// Split free text on `;`, `,` and newlines.
pub fn split_terms(text: &str) -> Vec<String> {
    text.split([';', ',', '\n'])
        .map(normalize_whitespace)
        .filter(|term| !is_placeholder(term))
        .collect()
}

/// All ECLI-looking tokens in a string, in order of appearance.
pub fn find_eclis(text: &str) -> Vec<String> {
    ECLI_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Remove a trailing "Document PDF ECLI:..." download caption.
pub fn remove_pdf_suffix(text: &str) -> String {
    PDF_SUFFIX.replace(text, "").trim().to_string()
}

/// Deduplicate case-insensitively, keeping first-seen casing and order.
pub fn dedup_case_insensitive<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

/// Deduplicate exact duplicates, keeping order.
pub fn dedup_exact<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_collapsed() {
        assert_eq!(normalize_whitespace("  a \n\t b  c "), "a b c");
    }

    #[test]
    fn tags_stripped_and_entities_decoded() {
        assert_eq!(strip_tags("<p>Code&nbsp;civil &amp; <b>Art.</b> 111</p>"), "Code civil & Art. 111");
    }

    #[test]
    fn lines_split_on_br() {
        let html = "<p>SIGNIFICATIONS ET NOTIFICATIONS - GENERALITES<br/>DOMICILE<br>-</p>";
        assert_eq!(
            split_lines(html, "ignored"),
            vec!["SIGNIFICATIONS ET NOTIFICATIONS - GENERALITES", "DOMICILE"]
        );
    }

    #[test]
    fn lines_fall_back_to_text() {
        assert_eq!(split_lines("<p>Code Civil</p>", " Code  Civil "), vec!["Code Civil"]);
        assert!(split_lines("<p>-</p>", "-").is_empty());
    }

    #[test]
    fn terms_split_on_punctuation() {
        assert_eq!(split_terms("bail; loyer, indexation\n -"), vec!["bail", "loyer", "indexation"]);
    }

    #[test]
    fn eclis_found_in_prose() {
        let found = find_eclis("Voir ECLI:BE:CASS:2007:ARR.20070622.5 et ecli:be:ghcc:1985:arr.003.");
        assert_eq!(found, vec!["ECLI:BE:CASS:2007:ARR.20070622.5", "ecli:be:ghcc:1985:arr.003"]);
    }

    #[test]
    fn pdf_suffix_removed() {
        assert_eq!(
            remove_pdf_suffix("La Cour rejette. Document PDF ECLI:BE:CASS:2007:ARR.20070622.5"),
            "La Cour rejette."
        );
    }

    #[test]
    fn keyword_dedup_is_case_insensitive_and_ordered() {
        let items = ["Contract", "contract", "Tort"].map(String::from);
        assert_eq!(dedup_case_insensitive(items), vec!["Contract", "Tort"]);
    }
}
