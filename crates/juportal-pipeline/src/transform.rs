//! Record transformer: one raw document in, one flattened record out.
//!
//! Composes section classification, the field mapper, notice consolidation,
//! ECLI parsing and date resolution, then runs stage-1 language validation
//! on the resulting full text. Every problem met on the way becomes an
//! [`Issue`]; only an unreadable document fails to produce a record, and
//! that is handled by the orchestrator.

use juportal_ai::RuleValidator;
use juportal_core::ecli::{self, JUPORTAL_BASE};
use juportal_core::mapping::{self, FieldMap};
use juportal_core::notice;
use juportal_core::record::SOURCE;
use juportal_core::section::{self, Section};
use juportal_core::{
    Issue, IssueKind, LabelTable, ParsedEcli, RawDocument, RelatedPublications, TargetField,
    TransformedRecord, date, text,
};
use tracing::debug;

const DEFAULT_LANGUAGE: &str = "FR";
const PDF_LINK_MARKER: &str = "/JUPORTAwork/";

/// Result of transforming one document.
#[derive(Debug)]
pub enum Transformed {
    Record {
        record: Box<TransformedRecord>,
        issues: Vec<Issue>,
    },
    /// Decision type excluded from output.
    Skipped {
        file_name: String,
        decision_type: String,
    },
}

pub struct RecordTransformer {
    table: LabelTable,
    validator: RuleValidator,
    skip_types: Vec<String>,
}

impl RecordTransformer {
    pub fn new(table: LabelTable, validator: RuleValidator, skip_types: &[String]) -> Self {
        Self {
            table,
            validator,
            skip_types: skip_types.iter().map(|t| t.trim().to_ascii_uppercase()).collect(),
        }
    }

    pub fn transform(&self, file_name: &str, doc: &RawDocument) -> Transformed {
        let mut issues = Vec::new();
        let sections = section::sections(doc);

        let card = sections
            .iter()
            .find(|s| matches!(s, Section::DecisionCard { .. }));
        let card_map = card
            .map(|s| self.map(file_name, s, &mut issues))
            .unwrap_or_default();

        let parsed = resolve_ecli(file_name, doc, &card_map, &mut issues);
        let language = ecli::language_from_file_name(file_name).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let valid = parsed.as_valid();

        if let Some(e) = valid
            && self.skip_types.contains(&e.decision_type)
        {
            debug!(file = file_name, decision_type = %e.decision_type, "skipping decision type");
            return Transformed::Skipped {
                file_name: file_name.to_string(),
                decision_type: e.decision_type.clone(),
            };
        }

        let (decision_date, date_problem) = date::resolve(valid, card.map(Section::legend));
        if let Some(problem) = date_problem {
            issues.push(Issue::for_file(file_name, IssueKind::Parse, format!("decision date: {problem}")));
        }

        let mut related = RelatedPublications::default();
        for s in sections
            .iter()
            .filter(|s| matches!(s, Section::DecisionCard { .. } | Section::RelatedPublications { .. }))
        {
            let map = match s {
                Section::DecisionCard { .. } => None,
                _ => Some(self.map(file_name, s, &mut issues)),
            };
            let map = map.as_ref().unwrap_or(&card_map);
            for field in RelatedPublications::FIELDS {
                if let Some(list) = related.get_mut(field) {
                    list.extend_from_slice(map.list(field));
                }
            }
        }
        for field in RelatedPublications::FIELDS {
            if let Some(list) = related.get_mut(field) {
                *list = text::dedup_exact(std::mem::take(list));
            }
        }

        let consolidated = notice::consolidate(&sections, &self.table);
        for e in &consolidated.errors {
            issues.push(Issue::for_file(file_name, IssueKind::Mapping, format!("fiche: {e}")));
        }

        let body = self.full_text(&sections);

        let scalar = |field: TargetField| card_map.scalar(field).unwrap_or_default().to_string();
        let mut record = TransformedRecord {
            file_name: file_name.to_string(),
            ecli: parsed.display_form(),
            url: ecli::build_url(&parsed, &language),
            source: SOURCE.to_string(),
            meta_language: language,
            jurisdiction: valid.map_or_else(|| "BE".to_string(), |e| e.jurisdiction.clone()),
            court_ecli_code: valid.map(|e| e.court_code.clone()).unwrap_or_default(),
            decision_type_ecli_code: valid.map(|e| e.decision_type.clone()).unwrap_or_default(),
            decision_date,
            full_text: body.text,
            full_text_html: body.html,
            pdf_url: body.pdf_url,
            notices: consolidated.notices,
            related,
            rol_number: scalar(TargetField::RolNumber),
            chamber: scalar(TargetField::Chamber),
            field_of_law: scalar(TargetField::FieldOfLaw),
            case: scalar(TargetField::Case),
            versions: card_map.list(TargetField::Versions).to_vec(),
            ecli_alias: card_map.list(TargetField::EcliAlias).to_vec(),
            opinion_public_attorney: scalar(TargetField::OpinionPublicAttorney),
            ..Default::default()
        };

        let verdict = self.validator.validate(&record.meta_language, &record.full_text);
        record.set_validation(verdict.status, verdict.method(), verdict.confidence);
        debug!(
            file = file_name,
            status = ?record.validation_status,
            confidence = record.validation_confidence,
            notices = record.notices.len(),
            "transformed"
        );

        Transformed::Record {
            record: Box::new(record),
            issues,
        }
    }

    fn map(&self, file_name: &str, section: &Section<'_>, issues: &mut Vec<Issue>) -> FieldMap {
        let map = mapping::map_section(section, &self.table);
        for e in &map.errors {
            issues.push(Issue::for_file(
                file_name,
                IssueKind::Mapping,
                format!("{}: {e}", section.kind()),
            ));
        }
        map
    }

    fn full_text(&self, sections: &[Section<'_>]) -> Body {
        let mut texts = Vec::new();
        let mut htmls = Vec::new();
        let mut pdf_url = String::new();

        for s in sections.iter().filter(|s| matches!(s, Section::FullText { .. })) {
            for p in s.paragraphs() {
                if pdf_url.is_empty()
                    && let Some(link) = p.links.iter().find(|l| l.href.contains(PDF_LINK_MARKER))
                {
                    pdf_url = absolute(&link.href);
                }
                let t = text::normalize_whitespace(&p.text);
                if t.is_empty() || is_pdf_caption(&t) {
                    continue;
                }
                texts.push(t);
                let html = p.html.trim();
                if !html.is_empty() {
                    htmls.push(html.to_string());
                }
            }
        }

        let joined = text::remove_pdf_suffix(&text::normalize_whitespace(&texts.join(" ")));
        if joined == "<>" {
            return Body {
                pdf_url,
                ..Default::default()
            };
        }
        Body {
            text: joined,
            html: htmls.join("\n"),
            pdf_url,
        }
    }
}

#[derive(Default)]
struct Body {
    text: String,
    html: String,
    pdf_url: String,
}

fn is_pdf_caption(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.starts_with("document pdf") || lower.starts_with("pdf document")
}

fn absolute(href: &str) -> String {
    if href.starts_with('/') {
        format!("{JUPORTAL_BASE}{href}")
    } else {
        href.to_string()
    }
}

/// Decision-card value first, then the document title, then the file name.
/// The first candidate that parses wins; otherwise the first non-empty one is
/// kept as unparsed and reported.
fn resolve_ecli(file_name: &str, doc: &RawDocument, card: &FieldMap, issues: &mut Vec<Issue>) -> ParsedEcli {
    let candidates = [
        card.scalar(TargetField::Ecli).map(ecli::parse),
        doc.title
            .as_deref()
            .filter(|t| t.trim_start().to_ascii_uppercase().starts_with("ECLI"))
            .map(ecli::parse),
        Some(ecli::from_file_name(file_name)),
    ];

    let mut fallback: Option<ParsedEcli> = None;
    for candidate in candidates.into_iter().flatten() {
        if candidate.is_valid() {
            return candidate;
        }
        if fallback.is_none() && candidate.key().is_some() {
            fallback = Some(candidate);
        }
    }
    let unparsed = fallback.unwrap_or_else(|| ParsedEcli::Unparsed(String::new()));
    issues.push(Issue::for_file(
        file_name,
        IssueKind::Parse,
        format!("no valid ECLI (kept {:?})", unparsed.display_form()),
    ));
    unparsed
}
