//! Label table and field mapper.
//!
//! Juportal sections are sequences of paragraphs where a label paragraph
//! ("Chambre:", "Thésaurus Cassation:") is followed by its value paragraphs.
//! The [`LabelTable`] maps label text to a [`TargetField`]; [`map_section`]
//! walks a classified section and collects the values per field.
//!
//! Extraction problems never abort the section. They are attached to the
//! resulting [`FieldMap`] as [`MappingError`] annotations.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::Paragraph;
use crate::section::Section;
use crate::text;

/// Output field a label can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetField {
    Ecli,
    RolNumber,
    Chamber,
    FieldOfLaw,
    Case,
    Versions,
    EcliAlias,
    OpinionPublicAttorney,
    Summary,
    KeywordsCassation,
    KeywordsUtu,
    KeywordsFree,
    LegalBasis,
    Citing,
    Precedent,
    CitedIn,
    Justel,
    SeeMoreRecently,
    PrecededBy,
    FollowedBy,
    Rectification,
    RelatedCase,
}

/// How a field's value paragraphs are turned into strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// First non-empty value paragraph, as plain text.
    Text,
    /// One entry per `<br>`-separated line.
    Lines,
    /// One entry per `;`/`,`-separated term.
    Terms,
    /// ECLI strings found in the paragraph text or link texts.
    References,
    /// Link targets.
    Links,
}

impl TargetField {
    pub const ALL: [TargetField; 22] = [
        Self::Ecli,
        Self::RolNumber,
        Self::Chamber,
        Self::FieldOfLaw,
        Self::Case,
        Self::Versions,
        Self::EcliAlias,
        Self::OpinionPublicAttorney,
        Self::Summary,
        Self::KeywordsCassation,
        Self::KeywordsUtu,
        Self::KeywordsFree,
        Self::LegalBasis,
        Self::Citing,
        Self::Precedent,
        Self::CitedIn,
        Self::Justel,
        Self::SeeMoreRecently,
        Self::PrecededBy,
        Self::FollowedBy,
        Self::Rectification,
        Self::RelatedCase,
    ];

    /// Field name as used in the mapping table and the output record.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ecli => "ecli",
            Self::RolNumber => "rolNumber",
            Self::Chamber => "chamber",
            Self::FieldOfLaw => "fieldOfLaw",
            Self::Case => "case",
            Self::Versions => "versions",
            Self::EcliAlias => "ecliAlias",
            Self::OpinionPublicAttorney => "opinionPublicAttorney",
            Self::Summary => "summary",
            Self::KeywordsCassation => "keywordsCassation",
            Self::KeywordsUtu => "keywordsUtu",
            Self::KeywordsFree => "keywordsFree",
            Self::LegalBasis => "legalBasis",
            Self::Citing => "citing",
            Self::Precedent => "precedent",
            Self::CitedIn => "citedIn",
            Self::Justel => "justel",
            Self::SeeMoreRecently => "seeMoreRecently",
            Self::PrecededBy => "precededBy",
            Self::FollowedBy => "followedBy",
            Self::Rectification => "rectification",
            Self::RelatedCase => "relatedCase",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::Ecli
                | Self::RolNumber
                | Self::Chamber
                | Self::FieldOfLaw
                | Self::Case
                | Self::OpinionPublicAttorney
                | Self::Summary
        )
    }

    pub fn shape(self) -> ValueShape {
        match self {
            f if f.is_scalar() => ValueShape::Text,
            Self::KeywordsCassation | Self::KeywordsUtu | Self::LegalBasis => ValueShape::Lines,
            Self::KeywordsFree => ValueShape::Terms,
            Self::Justel => ValueShape::Links,
            _ => ValueShape::References,
        }
    }
}

/// Per-field extraction problem. Non-fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("label for {field} has no value")]
    MissingValue { field: &'static str },

    #[error("conflicting values for {field}: kept {kept:?}, dropped {dropped:?}")]
    Conflicting {
        field: &'static str,
        kept: String,
        dropped: String,
    },

    #[error("could not extract {field}: {detail}")]
    Unextractable { field: &'static str, detail: String },
}

/// A label recognised in a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatch {
    pub field: TargetField,
    /// Value following the colon on the same paragraph ("Chambre: 1N").
    pub inline: Option<String>,
}

/// Label text → target field. Entries are tried in table order.
#[derive(Debug, Clone)]
pub struct LabelTable {
    entries: Vec<(TargetField, Vec<String>)>,
}

const BUILTIN: &[(TargetField, &[&str])] = &[
    (TargetField::Ecli, &["No ECLI", "ECLI nr", "ECLI-Nummer"]),
    (
        TargetField::RolNumber,
        &[
            "No Rôle",
            "No Arrêt/No Rôle",
            "Rolnummer",
            "Arrest-Rolnummer",
            "Arrest- Rolnummer",
            "Aktenzeichen",
        ],
    ),
    (TargetField::Chamber, &["Chambre", "Kamer", "Kammer"]),
    (
        TargetField::FieldOfLaw,
        &["Domaine juridique", "Rechtsgebied", "Rechtsgebiet"],
    ),
    (TargetField::Case, &["Affaire", "Zaak", "Sache"]),
    (TargetField::Versions, &["Version(s)", "Versie(s)", "Version(en)"]),
    (TargetField::EcliAlias, &["Alias ECLI", "ECLI alias", "ECLI-Alias"]),
    (
        TargetField::OpinionPublicAttorney,
        &["Conclusion M.P.", "Conclusie O.M.", "Schlussanträge StA"],
    ),
    (TargetField::Summary, &["Résumé", "Samenvatting", "Zusammenfassung"]),
    (
        TargetField::KeywordsCassation,
        &["Thésaurus Cassation", "Thesaurus CAS", "Thesaurus CASS", "Thesaurus Cassatie"],
    ),
    (
        TargetField::KeywordsUtu,
        &["Thésaurus UTU", "UTU-thesaurus", "UTU Thesaurus"],
    ),
    (
        TargetField::KeywordsFree,
        &["Mots libres", "Vrije woorden", "Freie Wörter", "Freie Schlagwörter"],
    ),
    (
        TargetField::LegalBasis,
        &["Bases légales", "Wettelijke bepalingen", "Rechtsgrundlage", "Rechtsgrundlagen"],
    ),
    (TargetField::Citing, &["Citant", "Citeert", "Zitiert"]),
    (TargetField::Precedent, &["Précédents", "Precedenten", "Präzedenzfälle"]),
    (TargetField::CitedIn, &["Cité par", "Geciteerd door", "Zitiert von"]),
    (TargetField::Justel, &["Lien Justel", "Link Justel"]),
    (
        TargetField::SeeMoreRecently,
        &["Voir plus récemment", "Zie ook recenter", "Zie recenter", "Siehe neuer"],
    ),
    (TargetField::PrecededBy, &["Précédé par", "Voorafgegaan door", "Vorausgegangen"]),
    (TargetField::FollowedBy, &["Suivi par", "Gevolgd door", "Gefolgt von"]),
    (TargetField::Rectification, &["Rectification", "Rechtzetting", "Berichtigung"]),
    (
        TargetField::RelatedCase,
        &["Dossier connexe", "Verbonden dossier", "Verbundene Sache"],
    ),
];

/// Lowercase, collapse whitespace, drop a trailing colon.
fn normalize_label(s: &str) -> String {
    text::normalize_whitespace(s)
        .to_lowercase()
        .trim_end_matches(':')
        .trim_end()
        .to_string()
}

/// Short paragraphs ending in a colon are labels even when the table does not know them.
fn looks_like_label(s: &str) -> bool {
    let s = s.trim();
    s.ends_with(':') && s.chars().count() <= 60
}

impl LabelTable {
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(field, legends)| (*field, legends.iter().map(|l| normalize_label(l)).collect()))
                .collect(),
        }
    }

    /// Read a `field,legend1,legend2,...` CSV table.
    ///
    /// Rows with an empty first cell or starting with `---` are skipped, as are
    /// rows naming an unknown field.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries: Vec<(TargetField, Vec<String>)> = Vec::new();
        for row in rdr.records() {
            let row = row?;
            let Some(name) = row.get(0) else { continue };
            if name.is_empty() || name.starts_with("---") {
                continue;
            }
            let Some(field) = TargetField::from_name(name) else {
                warn!(field = name, "unknown field in mapping table, row skipped");
                continue;
            };
            let legends: Vec<String> = row
                .iter()
                .skip(1)
                .map(|cell| normalize_label(cell.trim_matches('"')))
                .filter(|cell| !cell.is_empty())
                .collect();
            if legends.is_empty() {
                continue;
            }
            match entries.iter_mut().find(|(f, _)| *f == field) {
                Some((_, existing)) => existing.extend(legends),
                None => entries.push((field, legends)),
            }
        }
        Ok(Self { entries })
    }

    /// Load the table from `path`, falling back to [`LabelTable::builtin`]
    /// when no path is given or the file cannot be used.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            debug!("no mapping table configured, using built-in labels");
            return Self::builtin();
        };
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "mapping table unreadable, using built-in labels");
                return Self::builtin();
            }
        };
        match Self::from_csv_reader(file) {
            Ok(table) if !table.is_empty() => {
                debug!(path = %path.display(), fields = table.entries.len(), "loaded mapping table");
                table
            }
            Ok(_) => {
                warn!(path = %path.display(), "mapping table has no usable rows, using built-in labels");
                Self::builtin()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "mapping table malformed, using built-in labels");
                Self::builtin()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recognise a label paragraph, with an optional inline value.
    pub fn identify(&self, paragraph_text: &str) -> Option<LabelMatch> {
        let whole = normalize_label(paragraph_text);
        if whole.is_empty() {
            return None;
        }
        if let Some(field) = self.lookup(&whole) {
            return Some(LabelMatch { field, inline: None });
        }
        let (head, rest) = paragraph_text.split_once(':')?;
        let field = self.lookup(&normalize_label(head))?;
        let rest = text::normalize_whitespace(rest);
        Some(LabelMatch {
            field,
            inline: (!rest.is_empty()).then_some(rest),
        })
    }

    fn lookup(&self, normalized: &str) -> Option<TargetField> {
        self.entries
            .iter()
            .find(|(_, legends)| legends.iter().any(|l| l == normalized))
            .map(|(field, _)| *field)
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> &[String] {
        match self {
            Self::List(items) => items,
            Self::Scalar(_) => &[],
        }
    }
}

/// Values extracted from one section, with any per-field problems.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    pub values: BTreeMap<TargetField, FieldValue>,
    pub errors: Vec<MappingError>,
}

impl FieldMap {
    pub fn scalar(&self, field: TargetField) -> Option<&str> {
        self.values.get(&field).and_then(FieldValue::as_scalar)
    }

    pub fn list(&self, field: TargetField) -> &[String] {
        self.values.get(&field).map(FieldValue::as_list).unwrap_or(&[])
    }

    fn put_scalar(&mut self, field: TargetField, value: String) {
        match self.values.get(&field) {
            Some(FieldValue::Scalar(kept)) if kept != &value => {
                self.errors.push(MappingError::Conflicting {
                    field: field.name(),
                    kept: kept.clone(),
                    dropped: value,
                });
            }
            Some(_) => {}
            None => {
                self.values.insert(field, FieldValue::Scalar(value));
            }
        }
    }

    fn put_list(&mut self, field: TargetField, items: Vec<String>) {
        let entry = self
            .values
            .entry(field)
            .or_insert_with(|| FieldValue::List(Vec::new()));
        if let FieldValue::List(existing) = entry {
            existing.extend(items);
        }
    }

    fn finish(mut self) -> Self {
        for (field, value) in self.values.iter_mut() {
            if let FieldValue::List(items) = value {
                let taken = std::mem::take(items);
                *items = match field.shape() {
                    ValueShape::Lines | ValueShape::Terms => text::dedup_case_insensitive(taken),
                    _ => text::dedup_exact(taken),
                };
            }
        }
        self
    }
}

/// A label and the paragraphs up to the next label.
struct Block<'a> {
    field: Option<TargetField>,
    inline: Option<String>,
    values: Vec<&'a Paragraph>,
}

fn blocks<'a>(paragraphs: &'a [Paragraph], table: &LabelTable) -> (Vec<&'a Paragraph>, Vec<Block<'a>>) {
    let mut preamble = Vec::new();
    let mut out: Vec<Block<'a>> = Vec::new();

    for p in paragraphs {
        let t = p.trimmed();
        if t.is_empty() && p.links.is_empty() {
            continue;
        }
        if let Some(m) = table.identify(t) {
            out.push(Block {
                field: Some(m.field),
                inline: m.inline,
                values: Vec::new(),
            });
        } else if looks_like_label(t) {
            out.push(Block {
                field: None,
                inline: None,
                values: Vec::new(),
            });
        } else if let Some(block) = out.last_mut() {
            block.values.push(p);
        } else {
            preamble.push(p);
        }
    }
    (preamble, out)
}

fn first_text(block: &Block<'_>) -> Option<String> {
    if let Some(inline) = &block.inline {
        return Some(inline.clone());
    }
    block
        .values
        .iter()
        .map(|p| text::normalize_whitespace(&p.text))
        .find(|t| !matches!(t.as_str(), "" | "-" | "–"))
}

fn references(block: &Block<'_>) -> Vec<String> {
    let mut found = Vec::new();
    if let Some(inline) = &block.inline {
        found.extend(text::find_eclis(inline));
    }
    for p in &block.values {
        let in_text = text::find_eclis(&p.text);
        if in_text.is_empty() {
            found.extend(p.links.iter().flat_map(|l| text::find_eclis(&l.text)));
        } else {
            found.extend(in_text);
        }
    }
    found
}

fn links(block: &Block<'_>) -> Vec<String> {
    let mut found = Vec::new();
    for p in &block.values {
        if p.links.is_empty() {
            let t = p.trimmed();
            if t.starts_with("http://") || t.starts_with("https://") {
                found.push(t.to_string());
            }
        } else {
            found.extend(
                p.links
                    .iter()
                    .map(|l| l.href.trim().to_string())
                    .filter(|h| !h.is_empty()),
            );
        }
    }
    found
}

fn apply(map: &mut FieldMap, field: TargetField, block: &Block<'_>) {
    let has_content = block.inline.is_some() || !block.values.is_empty();
    match field.shape() {
        ValueShape::Text => match first_text(block) {
            Some(value) => map.put_scalar(field, value),
            None if !has_content => map.errors.push(MappingError::MissingValue { field: field.name() }),
            None => {}
        },
        ValueShape::Lines => {
            let mut items: Vec<String> = block.inline.iter().cloned().collect();
            items.extend(block.values.iter().flat_map(|p| text::split_lines(&p.html, &p.text)));
            map.put_list(field, items);
        }
        ValueShape::Terms => {
            let mut items: Vec<String> = block.inline.iter().flat_map(|s| text::split_terms(s)).collect();
            items.extend(
                block
                    .values
                    .iter()
                    .flat_map(|p| text::split_lines(&p.html, &p.text))
                    .flat_map(|line| text::split_terms(&line)),
            );
            map.put_list(field, items);
        }
        ValueShape::References => {
            let items = references(block);
            if items.is_empty() && has_content {
                map.errors.push(MappingError::Unextractable {
                    field: field.name(),
                    detail: "no ECLI found in value paragraphs".into(),
                });
            }
            map.put_list(field, items);
        }
        ValueShape::Links => {
            let items = links(block);
            if items.is_empty() && has_content {
                map.errors.push(MappingError::Unextractable {
                    field: field.name(),
                    detail: "no link found in value paragraphs".into(),
                });
            }
            map.put_list(field, items);
        }
    }
}

/// Map one classified section to target fields.
///
/// Full-text and unrecognised sections carry no labelled fields. In a fiche,
/// the first paragraph before any label is the summary.
pub fn map_section(section: &Section<'_>, table: &LabelTable) -> FieldMap {
    let mut map = FieldMap::default();
    let paragraphs = match section {
        Section::FullText { .. } | Section::Other { .. } => return map,
        Section::DecisionCard { paragraphs, .. }
        | Section::Fiche { paragraphs, .. }
        | Section::RelatedPublications { paragraphs, .. } => *paragraphs,
    };

    let (preamble, blocks) = blocks(paragraphs, table);

    if let Section::Fiche { .. } = section
        && let Some(first) = preamble.first()
    {
        let summary = text::normalize_whitespace(&first.text);
        if !matches!(summary.as_str(), "" | "-" | "–" | ":") {
            map.put_scalar(TargetField::Summary, summary);
        }
    }

    for block in &blocks {
        if let Some(field) = block.field {
            apply(&mut map, field, block);
        }
    }
    map.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Link, RawSection};
    use crate::section::classify;

    fn p(text: &str) -> Paragraph {
        Paragraph {
            text: text.into(),
            html: format!("<p>{text}</p>"),
            links: vec![],
        }
    }

    fn section(legend: &str, paragraphs: Vec<Paragraph>) -> RawSection {
        RawSection {
            legend: legend.into(),
            paragraphs,
        }
    }

    #[test]
    fn identifies_labels_with_and_without_inline_values() {
        let table = LabelTable::builtin();
        assert_eq!(
            table.identify("Chambre:"),
            Some(LabelMatch { field: TargetField::Chamber, inline: None })
        );
        assert_eq!(
            table.identify("Kamer: 1N"),
            Some(LabelMatch { field: TargetField::Chamber, inline: Some("1N".into()) })
        );
        assert_eq!(
            table.identify("  thésaurus   cassation :"),
            Some(LabelMatch { field: TargetField::KeywordsCassation, inline: None })
        );
        assert_eq!(table.identify("ECLI:BE:CASS:2007:ARR.20070622.5"), None);
        assert_eq!(table.identify("La Cour rejette le pourvoi."), None);
    }

    #[test]
    fn decision_card_fields() {
        let raw = section(
            "Jugement/arrêt du 22 juin 2007",
            vec![
                p("No ECLI:"),
                p("ECLI:BE:CASS:2007:ARR.20070622.5"),
                p("No Rôle:"),
                p("C.06.0123.F"),
                p("Chambre: 1F"),
                p("Unknown label:"),
                p("ignored value"),
                p("Domaine juridique:"),
                p("Droit civil"),
            ],
        );
        let map = map_section(&classify(&raw), &LabelTable::builtin());
        assert_eq!(map.scalar(TargetField::Ecli), Some("ECLI:BE:CASS:2007:ARR.20070622.5"));
        assert_eq!(map.scalar(TargetField::RolNumber), Some("C.06.0123.F"));
        assert_eq!(map.scalar(TargetField::Chamber), Some("1F"));
        assert_eq!(map.scalar(TargetField::FieldOfLaw), Some("Droit civil"));
        assert!(map.errors.is_empty());
    }

    #[test]
    fn repeated_list_label_concatenates() {
        let raw = section(
            "Fiche 1",
            vec![
                p("Le résumé."),
                p("Thésaurus Cassation:"),
                Paragraph {
                    text: "BAIL LOYER".into(),
                    html: "<p>BAIL<br/>LOYER</p>".into(),
                    links: vec![],
                },
                p("Thésaurus Cassation:"),
                p("loyer"),
                p("INDEXATION"),
            ],
        );
        let map = map_section(&classify(&raw), &LabelTable::builtin());
        assert_eq!(map.scalar(TargetField::Summary), Some("Le résumé."));
        assert_eq!(map.list(TargetField::KeywordsCassation), ["BAIL", "LOYER", "INDEXATION"]);
    }

    #[test]
    fn repeated_scalar_label_reports_conflict() {
        let raw = section(
            "Jugement/arrêt du 22 juin 2007",
            vec![p("Chambre:"), p("1F"), p("Chambre:"), p("2F")],
        );
        let map = map_section(&classify(&raw), &LabelTable::builtin());
        assert_eq!(map.scalar(TargetField::Chamber), Some("1F"));
        assert!(matches!(map.errors[0], MappingError::Conflicting { field: "chamber", .. }));
    }

    #[test]
    fn bad_field_does_not_stop_the_rest() {
        let raw = section(
            "Publication(s) liée(s)",
            vec![
                p("Citant:"),
                p("no identifier here"),
                p("Cité par:"),
                Paragraph {
                    text: "voir".into(),
                    html: String::new(),
                    links: vec![Link {
                        href: "/content/ECLI:BE:CASS:2010:ARR.20100101.1/FR".into(),
                        text: "ECLI:BE:CASS:2010:ARR.20100101.1".into(),
                    }],
                },
            ],
        );
        let map = map_section(&classify(&raw), &LabelTable::builtin());
        assert!(map.list(TargetField::Citing).is_empty());
        assert_eq!(map.list(TargetField::CitedIn), ["ECLI:BE:CASS:2010:ARR.20100101.1"]);
        assert_eq!(map.errors.len(), 1);
        assert!(matches!(map.errors[0], MappingError::Unextractable { field: "citing", .. }));
    }

    #[test]
    fn full_text_section_maps_nothing() {
        let raw = section("Texte de la décision", vec![p("Chambre:"), p("1F")]);
        let map = map_section(&classify(&raw), &LabelTable::builtin());
        assert!(map.values.is_empty());
    }

    #[test]
    fn csv_table_overrides_builtin() {
        let csv = "---,FR,NL\nchamber,Section:,Afdeling:\nnonsense,Foo:\n,orphan\n";
        let table = LabelTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.identify("Afdeling:").map(|m| m.field), Some(TargetField::Chamber));
        assert_eq!(table.identify("Chambre:"), None);
    }

    #[test]
    fn missing_table_falls_back_to_builtin() {
        let table = LabelTable::load(Some(Path::new("/definitely/not/here.csv")));
        assert_eq!(table.identify("Chambre:").map(|m| m.field), Some(TargetField::Chamber));
        let table = LabelTable::load(None);
        assert!(!table.is_empty());
    }

    #[test]
    fn field_names_roundtrip() {
        for field in TargetField::ALL {
            assert_eq!(TargetField::from_name(field.name()), Some(field));
        }
    }
}
