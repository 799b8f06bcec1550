//! Notice consolidation: fiche sections → ordered notices.

use serde::{Deserialize, Serialize};

use crate::mapping::{self, LabelTable, MappingError, TargetField};
use crate::section::Section;
use crate::text;

/// Consolidated content of one fiche (or a fiche and its continuations).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Notice {
    /// 1-based, in consolidation order.
    pub notice_id: u32,
    pub summary: String,
    pub keywords_cassation: Vec<String>,
    pub keywords_utu: Vec<String>,
    /// Free keywords joined by single spaces.
    pub keywords_free: String,
    pub legal_basis: Vec<String>,
}

impl Notice {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.keywords_cassation.is_empty()
            && self.keywords_utu.is_empty()
            && self.keywords_free.is_empty()
            && self.legal_basis.is_empty()
    }
}

#[derive(Debug, Default)]
struct Pending {
    summary: String,
    keywords_cassation: Vec<String>,
    keywords_utu: Vec<String>,
    keywords_free: Vec<String>,
    legal_basis: Vec<String>,
}

impl Pending {
    fn absorb(&mut self, map: &mapping::FieldMap) {
        if self.summary.is_empty()
            && let Some(summary) = map.scalar(TargetField::Summary)
        {
            self.summary = summary.to_string();
        }
        self.keywords_cassation
            .extend_from_slice(map.list(TargetField::KeywordsCassation));
        self.keywords_utu
            .extend_from_slice(map.list(TargetField::KeywordsUtu));
        self.keywords_free
            .extend_from_slice(map.list(TargetField::KeywordsFree));
        self.legal_basis
            .extend_from_slice(map.list(TargetField::LegalBasis));
    }

    fn into_notice(self) -> Notice {
        Notice {
            notice_id: 0,
            summary: self.summary,
            keywords_cassation: text::dedup_case_insensitive(self.keywords_cassation),
            keywords_utu: text::dedup_case_insensitive(self.keywords_utu),
            keywords_free: text::dedup_case_insensitive(self.keywords_free).join(" "),
            legal_basis: text::dedup_case_insensitive(self.legal_basis),
        }
    }
}

/// Notices plus the mapping problems met while building them.
#[derive(Debug, Default)]
pub struct Consolidated {
    pub notices: Vec<Notice>,
    pub errors: Vec<MappingError>,
}

/// Merge the fiche sections of a document into notices.
///
/// Non-fiche sections are ignored. A continuation fiche is folded into the
/// notice before it; a continuation with nothing before it starts a notice.
/// Empty notices are dropped before ids are assigned.
pub fn consolidate(sections: &[Section<'_>], table: &LabelTable) -> Consolidated {
    let mut pending: Vec<Pending> = Vec::new();
    let mut errors = Vec::new();

    for section in sections {
        let Section::Fiche { range, .. } = section else {
            continue;
        };
        let map = mapping::map_section(section, table);
        errors.extend(map.errors.iter().cloned());

        match pending.last_mut() {
            Some(current) if range.continuation => current.absorb(&map),
            _ => {
                let mut next = Pending::default();
                next.absorb(&map);
                pending.push(next);
            }
        }
    }

    let notices = pending
        .into_iter()
        .map(Pending::into_notice)
        .filter(|n| !n.is_empty())
        .zip(1u32..)
        .map(|(mut notice, id)| {
            notice.notice_id = id;
            notice
        })
        .collect();

    Consolidated { notices, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Paragraph, RawDocument, RawSection};
    use crate::section::sections;

    fn p(text: &str) -> Paragraph {
        Paragraph {
            text: text.into(),
            html: format!("<p>{text}</p>"),
            links: vec![],
        }
    }

    fn fiche(legend: &str, paragraphs: Vec<Paragraph>) -> RawSection {
        RawSection {
            legend: legend.into(),
            paragraphs,
        }
    }

    fn run(doc: &RawDocument) -> Consolidated {
        consolidate(&sections(doc), &LabelTable::builtin())
    }

    #[test]
    fn one_notice_per_fiche_with_sequential_ids() {
        let doc = RawDocument {
            sections: vec![
                fiche("Fiche 1", vec![p("Premier résumé."), p("Mots libres:"), p("bail; loyer")]),
                fiche("Fiche 2", vec![p("Second résumé.")]),
            ],
            ..Default::default()
        };
        let out = run(&doc);
        assert_eq!(out.notices.len(), 2);
        assert_eq!(out.notices[0].notice_id, 1);
        assert_eq!(out.notices[0].keywords_free, "bail loyer");
        assert_eq!(out.notices[1].notice_id, 2);
        assert_eq!(out.notices[1].summary, "Second résumé.");
    }

    #[test]
    fn continuation_is_merged_and_keywords_deduplicated() {
        let doc = RawDocument {
            sections: vec![
                fiche(
                    "Fiche 1",
                    vec![p("Résumé."), p("Thésaurus UTU:"), p("Contract"), p("Tort")],
                ),
                fiche(
                    "Fiche 1 (suite)",
                    vec![p("Ignored as summary."), p("Thésaurus UTU:"), p("contract"), p("Damages")],
                ),
            ],
            ..Default::default()
        };
        let out = run(&doc);
        assert_eq!(out.notices.len(), 1);
        assert_eq!(out.notices[0].summary, "Résumé.");
        assert_eq!(out.notices[0].keywords_utu, ["Contract", "Tort", "Damages"]);
    }

    #[test]
    fn legal_basis_lines_are_plain_text() {
        let doc = RawDocument {
            sections: vec![fiche(
                "Fiche 1",
                vec![
                    p("Bases légales:"),
                    Paragraph {
                        text: "Code civil - 1382 Code civil - 1383".into(),
                        html: "<p>Code civil - 1382<br/>Code civil - 1383</p>".into(),
                        links: vec![],
                    },
                    p("Loi du 3 juillet 1978 - 32"),
                ],
            )],
            ..Default::default()
        };
        let out = run(&doc);
        assert_eq!(
            out.notices[0].legal_basis,
            ["Code civil - 1382", "Code civil - 1383", "Loi du 3 juillet 1978 - 32"]
        );
    }

    #[test]
    fn empty_fiche_dropped_before_numbering() {
        let doc = RawDocument {
            sections: vec![
                fiche("Fiche 1", vec![p("-")]),
                fiche("Fiche 2", vec![p("Résumé.")]),
            ],
            ..Default::default()
        };
        let out = run(&doc);
        assert_eq!(out.notices.len(), 1);
        assert_eq!(out.notices[0].notice_id, 1);
    }

    #[test]
    fn stable_across_reruns() {
        let doc = RawDocument {
            sections: vec![fiche("Fiche 1", vec![p("A.")]), fiche("Fiche 2", vec![p("B.")])],
            ..Default::default()
        };
        assert_eq!(run(&doc).notices, run(&doc).notices);
    }
}
