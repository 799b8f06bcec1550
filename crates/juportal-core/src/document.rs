//! Raw Juportal documents as scraped from the portal.

use serde::{Deserialize, Serialize};

/// One input file. Read-only.
///
/// Scraped files carry a flat `sections` list whose role is told by the
/// legend. Pre-split files may instead provide `decisionCard` and `ficheCard`
/// directly; both shapes are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDocument {
    pub title: Option<String>,
    pub sections: Vec<RawSection>,
    pub decision_card: Option<RawSection>,
    pub fiche_card: Vec<RawSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSection {
    pub legend: String,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paragraph {
    pub text: String,
    pub html: String,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub href: String,
    pub text: String,
}

impl RawDocument {
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl Paragraph {
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scraped_shape_parses() {
        let json = r#"{
            "title": "ECLI:BE:CASS:2007:ARR.20070622.5",
            "sections": [
                {"legend": "Jugement/arrêt du 22 juin 2007",
                 "paragraphs": [{"text": "No ECLI:", "html": "<p>No ECLI:</p>"}]}
            ]
        }"#;
        let doc = RawDocument::from_json(json.as_bytes()).unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].legend, "Jugement/arrêt du 22 juin 2007");
        assert_eq!(doc.sections[0].paragraphs[0].trimmed(), "No ECLI:");
        assert!(doc.sections[0].paragraphs[0].links.is_empty());
        assert!(doc.decision_card.is_none());
    }

    #[test]
    fn pre_split_shape_parses() {
        let json = br#"{
            "decisionCard": {"paragraphs": [{"text": "Chambre: 1F"}]},
            "ficheCard": [{"legend": "Fiche 1", "paragraphs": []}]
        }"#;
        let doc = RawDocument::from_json(json).unwrap();
        assert!(doc.sections.is_empty());
        assert_eq!(doc.decision_card.unwrap().paragraphs[0].text, "Chambre: 1F");
        assert_eq!(doc.fiche_card.len(), 1);
    }
}
