//! Batch prompt construction and reply parsing for chat-model classifiers.

use juportal_core::{ClassificationItem, TransformedRecord, Verdict};

use crate::languages;
use crate::service::ClassifyError;

pub const SYSTEM_PROMPT: &str =
    "You are a precise language detection expert. Respond only with a valid JSON array.";

/// Characters of text sent per item.
pub const SAMPLE_CHARS: usize = 300;

const NO_TEXT: &str = "NO_TEXT_CONTENT";

fn head(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Text sample for one record: full text head, notice summaries, free keywords.
pub fn sample_text(record: &TransformedRecord) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !record.full_text.trim().is_empty() {
        parts.push(head(record.full_text.trim(), SAMPLE_CHARS));
    }
    for notice in &record.notices {
        if !notice.summary.is_empty() {
            parts.push(head(&notice.summary, 200));
        }
        if !notice.keywords_free.is_empty() {
            parts.push(head(&notice.keywords_free, 100));
        }
    }
    if parts.is_empty() {
        return NO_TEXT.to_string();
    }
    head(&parts.join("\n"), SAMPLE_CHARS).to_string()
}

pub fn item_for(record: &TransformedRecord) -> ClassificationItem {
    ClassificationItem {
        file_name: record.file_name.clone(),
        expected_language: record.meta_language.clone(),
        text: sample_text(record),
    }
}

/// User prompt listing every item of a batch.
pub fn build_batch_prompt(items: &[ClassificationItem]) -> String {
    let mut prompt = String::from(
        "Analyze the following documents and determine whether each text is written in its expected language.\n\n\
         For each document, return a JSON object with:\n\
         - \"fileName\": the file name\n\
         - \"is_valid\": true or false\n\
         - \"confidence\": a number between 0 and 1\n\
         - \"explanation\": a short explanation\n\n\
         Documents:",
    );
    for item in items {
        prompt.push_str(&format!(
            "\n\nFile: {}\nExpected Language: {}\nText: {}",
            item.file_name,
            languages::language_name(&item.expected_language),
            item.text
        ));
    }
    prompt.push_str("\n\nReturn a JSON array with one object per document.");
    prompt
}

/// Strip a surrounding Markdown code fence, if any.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[start + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    match after.find("```") {
        Some(end) => after[..end].trim(),
        None => after.trim(),
    }
}

/// Parse the model's reply into verdicts.
pub fn parse_reply(content: &str) -> Result<Vec<Verdict>, ClassifyError> {
    let body = strip_fences(content);
    serde_json::from_str(body).map_err(|e| ClassifyError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use juportal_core::Notice;

    #[test]
    fn sample_combines_sources_and_is_bounded() {
        let record = TransformedRecord {
            full_text: "é".repeat(500),
            notices: vec![Notice {
                summary: "Résumé".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let sample = sample_text(&record);
        assert_eq!(sample.chars().count(), SAMPLE_CHARS);

        let short = TransformedRecord {
            full_text: "Texte court.".into(),
            notices: vec![Notice {
                summary: "Résumé".into(),
                keywords_free: "bail loyer".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(sample_text(&short), "Texte court.\nRésumé\nbail loyer");
        assert_eq!(sample_text(&TransformedRecord::default()), NO_TEXT);
    }

    #[test]
    fn prompt_lists_items_with_language_names() {
        let items = vec![ClassificationItem {
            file_name: "a_NL.json".into(),
            expected_language: "NL".into(),
            text: "Het Hof".into(),
        }];
        let prompt = build_batch_prompt(&items);
        assert!(prompt.contains("File: a_NL.json\nExpected Language: Dutch\nText: Het Hof"));
    }

    #[test]
    fn reply_with_and_without_fences() {
        let bare = r#"[{"fileName":"a","is_valid":true,"confidence":0.9,"explanation":"ok"}]"#;
        assert_eq!(parse_reply(bare).unwrap().len(), 1);

        let fenced = format!("Here you go:\n```json\n{bare}\n```");
        assert_eq!(parse_reply(&fenced).unwrap()[0].file_name, "a");

        let plain_fence = format!("```\n{bare}\n```");
        assert!(parse_reply(&plain_fence).unwrap()[0].is_valid);
    }

    #[test]
    fn garbage_reply_is_parse_error() {
        assert!(matches!(parse_reply("I cannot help"), Err(ClassifyError::Parse(_))));
    }
}
