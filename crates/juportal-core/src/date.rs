//! Decision date extraction.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::ecli::Ecli;

static LEGEND_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:du|van|vom)\s+(\d{1,2})(?:er)?\.?\s+(\p{L}+)\s+(\d{4})")
        .expect("valid regex")
});

const MONTHS: &[(&str, u32)] = &[
    ("janvier", 1),
    ("février", 2),
    ("fevrier", 2),
    ("mars", 3),
    ("avril", 4),
    ("mai", 5),
    ("juin", 6),
    ("juillet", 7),
    ("août", 8),
    ("aout", 8),
    ("septembre", 9),
    ("octobre", 10),
    ("novembre", 11),
    ("décembre", 12),
    ("decembre", 12),
    ("januari", 1),
    ("februari", 2),
    ("maart", 3),
    ("april", 4),
    ("mei", 5),
    ("juni", 6),
    ("juli", 7),
    ("augustus", 8),
    ("september", 9),
    ("oktober", 10),
    ("november", 11),
    ("december", 12),
    ("januar", 1),
    ("februar", 2),
    ("märz", 3),
    ("maerz", 3),
    ("august", 8),
    ("dezember", 12),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("unknown month name {0:?}")]
    UnknownMonth(String),

    #[error("no such date {year}-{month:02}-{day:02}")]
    Impossible { year: i32, month: u32, day: u32 },
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS.iter().find(|(m, _)| *m == lower).map(|(_, n)| *n)
}

/// Date encoded in a `TYPE.YYYYMMDD.N` serial, e.g. `ARR.20070622.5`.
pub fn date_from_serial(ecli: &Ecli) -> Option<NaiveDate> {
    let head = ecli.serial.split('.').next()?;
    if head.len() != 8 || !head.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(head, "%Y%m%d").ok()
}

/// Date spelled out in a decision-card legend ("Jugement/arrêt du 22 juin 2007").
///
/// `Ok(None)` when the legend carries no date phrase; an error when it does
/// but the phrase cannot be turned into a calendar date.
pub fn date_from_legend(legend: &str) -> Result<Option<NaiveDate>, DateError> {
    let Some(caps) = LEGEND_DATE.captures(legend) else {
        return Ok(None);
    };
    let day: u32 = caps[1].parse().unwrap_or(0);
    let month = month_number(&caps[2]).ok_or_else(|| DateError::UnknownMonth(caps[2].to_string()))?;
    let year: i32 = caps[3].parse().unwrap_or(0);
    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or(DateError::Impossible { year, month, day })
}

/// Best available decision date: serial, then legend, then the bare ECLI year.
///
/// Returns the formatted date (possibly empty) and any legend parse problem.
pub fn resolve(ecli: Option<&Ecli>, legend: Option<&str>) -> (String, Option<DateError>) {
    if let Some(date) = ecli.and_then(date_from_serial) {
        return (date.format("%Y-%m-%d").to_string(), None);
    }
    let mut problem = None;
    if let Some(legend) = legend {
        match date_from_legend(legend) {
            Ok(Some(date)) => return (date.format("%Y-%m-%d").to_string(), None),
            Ok(None) => {}
            Err(e) => problem = Some(e),
        }
    }
    let year = ecli.map(|e| e.year.to_string()).unwrap_or_default();
    (year, problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecli::parse;

    fn ecli(raw: &str) -> Ecli {
        parse(raw).as_valid().cloned().unwrap()
    }

    #[test]
    fn serial_date() {
        let e = ecli("ECLI:BE:CASS:2007:ARR.20070622.5");
        assert_eq!(date_from_serial(&e), NaiveDate::from_ymd_opt(2007, 6, 22));
        assert_eq!(date_from_serial(&ecli("ECLI:BE:GHCC:1985:ARR.003")), None);
        assert_eq!(date_from_serial(&ecli("ECLI:BE:CASS:2007:ARR.20071399.5")), None);
    }

    #[test]
    fn legend_dates_in_three_languages() {
        assert_eq!(
            date_from_legend("Jugement/arrêt du 1er février 2010"),
            Ok(NaiveDate::from_ymd_opt(2010, 2, 1))
        );
        assert_eq!(
            date_from_legend("Vonnis/arrest van 17 januari 2023"),
            Ok(NaiveDate::from_ymd_opt(2023, 1, 17))
        );
        assert_eq!(
            date_from_legend("Urteil vom 3. März 2015"),
            Ok(NaiveDate::from_ymd_opt(2015, 3, 3))
        );
        assert_eq!(date_from_legend("Fiche 1"), Ok(None));
    }

    #[test]
    fn bad_legend_dates() {
        assert_eq!(
            date_from_legend("Jugement/arrêt du 12 brumaire 2010"),
            Err(DateError::UnknownMonth("brumaire".into()))
        );
        assert!(matches!(
            date_from_legend("Vonnis/arrest van 31 februari 2010"),
            Err(DateError::Impossible { .. })
        ));
    }

    #[test]
    fn resolution_order() {
        let with_serial = ecli("ECLI:BE:CASS:2007:ARR.20070622.5");
        assert_eq!(
            resolve(Some(&with_serial), Some("Jugement/arrêt du 1 mai 2001")).0,
            "2007-06-22"
        );
        let without = ecli("ECLI:BE:GHCC:1985:ARR.003");
        assert_eq!(resolve(Some(&without), Some("Arrest van 5 juni 1985")).0, "1985-06-05");
        let (date, problem) = resolve(Some(&without), Some("Arrest van 5 brumaire 1985"));
        assert_eq!(date, "1985");
        assert!(problem.is_some());
        assert_eq!(resolve(None, None), (String::new(), None));
    }
}
