//! Section recognition.
//!
//! A raw section only tells its role through its legend ("Fiche 2",
//! "Texte de la décision", ...). [`classify`] turns it into a [`Section`]
//! variant that the field mapper dispatches on.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{Paragraph, RawDocument, RawSection};

static DECISION_CARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(jugement/arr[êe]t\s+du|vonnis/arrest\s+van|urteil\s+vom|conclusions?\s+du|conclusie\s+van|schlussantr[äa]ge\s+vom)\s",
    )
    .expect("valid regex")
});
static FICHE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*fiches?\s+(\d+)\s*[-–]\s*(\d+)").expect("valid regex")
});
static FICHE_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*fiches?\s+(\d+)").expect("valid regex"));
static FICHE_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*fiches?\s*(\(|$)").expect("valid regex"));
static CONTINUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(\s*(suite|vervolg|fortsetzung)\s*\)\s*$").expect("valid regex")
});

const FULL_TEXT_LEGENDS: &[&str] = &[
    "texte de la décision",
    "texte des conclusions",
    "tekst van de beslissing",
    "tekst van de conclusie",
    "text der entscheidung",
    "text der schlussanträge",
];

const RELATED_LEGENDS: &[&str] = &[
    "publication(s) liée(s)",
    "gerelateerde publicatie(s)",
    "verwandte veröffentlichung(en)",
];

/// Fiche numbers announced by a fiche legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FicheRange {
    pub first: u32,
    pub last: u32,
    /// Content extends the previous fiche instead of starting a new notice.
    pub continuation: bool,
}

/// A raw section tagged with its role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Section<'a> {
    DecisionCard {
        legend: &'a str,
        paragraphs: &'a [Paragraph],
    },
    Fiche {
        range: FicheRange,
        legend: &'a str,
        paragraphs: &'a [Paragraph],
    },
    FullText {
        legend: &'a str,
        paragraphs: &'a [Paragraph],
    },
    RelatedPublications {
        legend: &'a str,
        paragraphs: &'a [Paragraph],
    },
    Other {
        legend: &'a str,
        paragraphs: &'a [Paragraph],
    },
}

impl<'a> Section<'a> {
    pub fn legend(&self) -> &'a str {
        match self {
            Self::DecisionCard { legend, .. }
            | Self::Fiche { legend, .. }
            | Self::FullText { legend, .. }
            | Self::RelatedPublications { legend, .. }
            | Self::Other { legend, .. } => legend,
        }
    }

    pub fn paragraphs(&self) -> &'a [Paragraph] {
        match self {
            Self::DecisionCard { paragraphs, .. }
            | Self::Fiche { paragraphs, .. }
            | Self::FullText { paragraphs, .. }
            | Self::RelatedPublications { paragraphs, .. }
            | Self::Other { paragraphs, .. } => paragraphs,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::DecisionCard { .. } => "decision_card",
            Self::Fiche { .. } => "fiche",
            Self::FullText { .. } => "full_text",
            Self::RelatedPublications { .. } => "related_publications",
            Self::Other { .. } => "other",
        }
    }
}

/// Parse the fiche numbers from a legend, if it is a fiche legend.
pub fn fiche_range(legend: &str) -> Option<FicheRange> {
    let continuation = CONTINUATION.is_match(legend);
    if let Some(caps) = FICHE_RANGE.captures(legend) {
        let a: u32 = caps[1].parse().ok()?;
        let b: u32 = caps[2].parse().ok()?;
        return Some(FicheRange {
            first: a.min(b),
            last: a.max(b),
            continuation,
        });
    }
    if let Some(caps) = FICHE_SINGLE.captures(legend) {
        let n: u32 = caps[1].parse().ok()?;
        return Some(FicheRange {
            first: n,
            last: n,
            continuation,
        });
    }
    FICHE_BARE.is_match(legend).then_some(FicheRange {
        first: 1,
        last: 1,
        continuation,
    })
}

/// Classify one raw section by its legend.
pub fn classify(raw: &RawSection) -> Section<'_> {
    let legend = raw.legend.as_str();
    let paragraphs = raw.paragraphs.as_slice();

    if DECISION_CARD.is_match(legend) {
        return Section::DecisionCard { legend, paragraphs };
    }
    if let Some(range) = fiche_range(legend) {
        return Section::Fiche {
            range,
            legend,
            paragraphs,
        };
    }
    let lower = legend.to_lowercase();
    if FULL_TEXT_LEGENDS.iter().any(|l| lower.contains(l)) {
        return Section::FullText { legend, paragraphs };
    }
    if RELATED_LEGENDS.iter().any(|l| lower.contains(l)) {
        return Section::RelatedPublications { legend, paragraphs };
    }
    Section::Other { legend, paragraphs }
}

/// All sections of a document, in document order.
///
/// Explicit `decisionCard` / `ficheCard` entries come first. A fiche whose
/// first number repeats the previous fiche's first number is marked as a
/// continuation.
pub fn sections(doc: &RawDocument) -> Vec<Section<'_>> {
    let mut out = Vec::with_capacity(doc.sections.len() + doc.fiche_card.len() + 1);

    if let Some(card) = &doc.decision_card {
        out.push(Section::DecisionCard {
            legend: &card.legend,
            paragraphs: &card.paragraphs,
        });
    }
    for (i, fiche) in doc.fiche_card.iter().enumerate() {
        let n = u32::try_from(i + 1).unwrap_or(u32::MAX);
        let range = fiche_range(&fiche.legend).unwrap_or(FicheRange {
            first: n,
            last: n,
            continuation: false,
        });
        out.push(Section::Fiche {
            range,
            legend: &fiche.legend,
            paragraphs: &fiche.paragraphs,
        });
    }
    out.extend(doc.sections.iter().map(classify));

    let mut previous_first = None;
    for section in &mut out {
        if let Section::Fiche { range, .. } = section {
            if previous_first == Some(range.first) {
                range.continuation = true;
            }
            previous_first = Some(range.first);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(legend: &str) -> RawSection {
        RawSection {
            legend: legend.into(),
            paragraphs: vec![],
        }
    }

    #[test]
    fn decision_cards_in_three_languages() {
        for legend in [
            "Jugement/arrêt du 22 juin 2007",
            "Vonnis/arrest van 17 januari 2023",
            "Urteil vom 3. März 2015",
            "Conclusion du 5 mai 2010",
        ] {
            let r = raw(legend);
            assert!(matches!(classify(&r), Section::DecisionCard { .. }), "{legend}");
        }
    }

    #[test]
    fn fiche_legends() {
        assert_eq!(
            fiche_range("Fiches 2 - 9"),
            Some(FicheRange { first: 2, last: 9, continuation: false })
        );
        assert_eq!(
            fiche_range("Fiche 3"),
            Some(FicheRange { first: 3, last: 3, continuation: false })
        );
        assert_eq!(
            fiche_range("Fiche"),
            Some(FicheRange { first: 1, last: 1, continuation: false })
        );
        assert!(fiche_range("Fiche 1 (suite)").unwrap().continuation);
        assert!(fiche_range("Fiche 4 (vervolg)").unwrap().continuation);
        assert_eq!(fiche_range("Fichier"), None);
    }

    #[test]
    fn full_text_and_related() {
        let r = raw("Texte de la décision");
        assert!(matches!(classify(&r), Section::FullText { .. }));
        let r = raw("Tekst van de conclusie");
        assert!(matches!(classify(&r), Section::FullText { .. }));
        let r = raw("Publication(s) liée(s)");
        assert!(matches!(classify(&r), Section::RelatedPublications { .. }));
        let r = raw("Verwandte Veröffentlichung(en)");
        assert!(matches!(classify(&r), Section::RelatedPublications { .. }));
        let r = raw("Something else");
        assert_eq!(classify(&r).kind(), "other");
    }

    #[test]
    fn repeated_fiche_number_is_continuation() {
        let doc = RawDocument {
            sections: vec![raw("Fiche 1"), raw("Fiche 1"), raw("Fiche 2")],
            ..Default::default()
        };
        let flags: Vec<bool> = sections(&doc)
            .iter()
            .filter_map(|s| match s {
                Section::Fiche { range, .. } => Some(range.continuation),
                _ => None,
            })
            .collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn explicit_cards_come_first() {
        let doc = RawDocument {
            decision_card: Some(raw("")),
            fiche_card: vec![raw(""), raw("")],
            sections: vec![raw("Texte de la décision")],
            ..Default::default()
        };
        let kinds: Vec<&str> = sections(&doc).iter().map(Section::kind).collect();
        assert_eq!(kinds, vec!["decision_card", "fiche", "fiche", "full_text"]);
    }
}
