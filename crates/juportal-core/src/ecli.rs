//! European Case Law Identifier parsing and URL construction.
//!
//! Parses identifiers such as `ECLI:BE:CASS:2007:ARR.20070622.5` into their
//! structured components and builds the canonical Juportal content URL.
//!
//! # Accepted spellings
//!
//! - Colon-delimited (canonical): `ECLI:BE:CASS:2007:ARR.20070622.5`
//! - Dash-delimited: `ECLI-BE-CASS-2007-ARR.20070622.5`
//! - Underscore-delimited, as in Juportal file names: `BE_CASS_2007_ARR.20070622.5`
//!   (the `ECLI` head is optional in every spelling)
//! - A trailing version suffix after one more delimiter: `...ARR.20070622.5_FR`,
//!   `...ARR.20070622.5:v2`
//!
//! The last component (`TYPE.SERIAL`) only ever contains letters, digits and
//! dots, so any delimiter after it starts the version suffix.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Base URL of the Juportal portal.
pub const JUPORTAL_BASE: &str = "https://juportal.be";

/// Returned by [`build_url`] when no usable identifier is available.
pub const INVALID_URL: &str = "invalid:ecli";

/// A structurally valid ECLI. Every component is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ecli {
    /// Two-letter country code, uppercase (e.g. `BE`).
    pub jurisdiction: String,
    /// Court code, uppercase (e.g. `CASS`, `GHCC`).
    pub court_code: String,
    pub year: u16,
    /// Decision type, uppercase (e.g. `ARR`, `CONC`).
    pub decision_type: String,
    /// Everything after the first dot of the last component (e.g. `20070622.5`).
    pub serial: String,
    pub version_suffix: Option<String>,
}

/// Outcome of [`parse`]: either a valid identifier or the trimmed raw input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParsedEcli {
    Valid(Ecli),
    Unparsed(String),
}

impl Ecli {
    /// Canonical colon-delimited form, without version suffix.
    pub fn canonical(&self) -> String {
        format!(
            "ECLI:{}:{}:{}:{}.{}",
            self.jurisdiction, self.court_code, self.year, self.decision_type, self.serial
        )
    }
}

impl fmt::Display for Ecli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl ParsedEcli {
    pub fn as_valid(&self) -> Option<&Ecli> {
        match self {
            Self::Valid(ecli) => Some(ecli),
            Self::Unparsed(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Canonical form when valid, otherwise the raw text as received.
    pub fn display_form(&self) -> String {
        match self {
            Self::Valid(ecli) => ecli.canonical(),
            Self::Unparsed(raw) => raw.clone(),
        }
    }

    /// Identity key used to match records and references.
    ///
    /// Valid identifiers compare by canonical form; unparsed ones by their
    /// uppercased raw text. Empty input has no key.
    pub fn key(&self) -> Option<String> {
        match self {
            Self::Valid(ecli) => Some(ecli.canonical()),
            Self::Unparsed(raw) if raw.is_empty() => None,
            Self::Unparsed(raw) => Some(raw.to_ascii_uppercase()),
        }
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, ':' | '-' | '_')
}

/// Parse an ECLI. Malformed input yields [`ParsedEcli::Unparsed`], never a panic.
pub fn parse(raw: &str) -> ParsedEcli {
    let trimmed = raw.trim();
    match parse_components(trimmed) {
        Some(ecli) => ParsedEcli::Valid(ecli),
        None => ParsedEcli::Unparsed(trimmed.to_string()),
    }
}

fn parse_components(s: &str) -> Option<Ecli> {
    // Optional "ECLI" head followed by a delimiter.
    let rest = match s.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("ECLI") => {
            let after = &s[4..];
            let first = after.chars().next()?;
            if !is_delimiter(first) {
                return None;
            }
            &after[first.len_utf8()..]
        }
        _ => s,
    };

    let mut parts = rest.splitn(4, is_delimiter);
    let jurisdiction = parts.next()?;
    let court_code = parts.next()?;
    let year = parts.next()?;
    let tail = parts.next()?;

    if jurisdiction.len() != 2 || !jurisdiction.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if court_code.is_empty() || !court_code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: u16 = year.parse().ok()?;

    // Split off a version suffix after the TYPE.SERIAL component.
    let (type_serial, version_suffix) = match tail.find(is_delimiter) {
        Some(i) => (&tail[..i], Some(&tail[i + 1..])),
        None => (tail, None),
    };
    if let Some(suffix) = version_suffix
        && (suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_alphanumeric() || c == '.'))
    {
        return None;
    }

    let (decision_type, serial) = type_serial.split_once('.')?;
    if decision_type.is_empty() || !decision_type.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if serial.is_empty()
        || serial.starts_with('.')
        || !serial.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
    {
        return None;
    }

    Some(Ecli {
        jurisdiction: jurisdiction.to_ascii_uppercase(),
        court_code: court_code.to_ascii_uppercase(),
        year,
        decision_type: decision_type.to_ascii_uppercase(),
        serial: serial.to_ascii_uppercase(),
        version_suffix: version_suffix.map(|s| s.to_string()),
    })
}

/// Parse the ECLI embedded in a Juportal file name.
///
/// `juportal.be_BE_CASS_2007_ARR.20070622.5_FR.json` and
/// `juportal.be_ECLI_BE_CASS_2023_ARR.20230117.2N.7_FR.json` both yield the
/// identifier with `version_suffix = Some("FR")`.
pub fn from_file_name(file_name: &str) -> ParsedEcli {
    let stem = file_name.strip_suffix(".json").unwrap_or(file_name);
    let stem = stem.strip_prefix("juportal.be_").unwrap_or(stem);
    parse(stem)
}

/// Language code from a `_FR.json` / `_NL.json` / `_DE.json` file name suffix.
pub fn language_from_file_name(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(".json")?;
    let (_, lang) = stem.rsplit_once('_')?;
    let upper = lang.to_ascii_uppercase();
    matches!(upper.as_str(), "FR" | "NL" | "DE").then_some(upper)
}

/// Build the Juportal content URL for an identifier and a two-letter language.
///
/// Deterministic for valid input; returns [`INVALID_URL`] for an unparsed or
/// empty identifier or a language that is not two ASCII letters.
pub fn build_url(ecli: &ParsedEcli, language: &str) -> String {
    let language = language.trim();
    if language.len() != 2 || !language.chars().all(|c| c.is_ascii_alphabetic()) {
        return INVALID_URL.to_string();
    }
    match ecli {
        ParsedEcli::Valid(ecli) => format!(
            "{}/content/{}/{}",
            JUPORTAL_BASE,
            ecli.canonical(),
            language.to_ascii_uppercase()
        ),
        ParsedEcli::Unparsed(_) => INVALID_URL.to_string(),
    }
}
