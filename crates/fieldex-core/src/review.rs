//! Advisory plausibility review of extracted records.
//!
//! The review scores how plausible each value looks for its field kind. It
//! never changes or filters records.

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::fields::{FieldKind, FieldSet};
use crate::models::record::{ExtractedValue, PageRecord};

lazy_static! {
    /// 2024-01-15, 2024/1/5, 2024.01.15
    static ref DATE_YMD: Regex = Regex::new(r"\b(\d{4})[\-/.](\d{1,2})[\-/.](\d{1,2})\b").unwrap();

    /// 15.01.2024, 15/1/24, 01-15-2024
    static ref DATE_DMY: Regex = Regex::new(r"\b(\d{1,2})[\-/.](\d{1,2})[\-/.](\d{4}|\d{2})\b").unwrap();
}

/// Exclusive bounds for a plausible document year.
const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// Minimum length of a plausible reference number, exclusive.
const MIN_REFERENCE_LEN: usize = 3;

/// Result of reviewing one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    /// Share of enabled fields holding a plausible value, 0 to 100.
    pub score: f32,
    /// One note per enabled field that did not pass.
    pub notes: Vec<String>,
}

impl Assessment {
    pub fn is_complete(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Review `record` against the enabled descriptors of `fields`.
pub fn assess(record: &PageRecord, fields: &FieldSet) -> Assessment {
    let mut enabled = 0usize;
    let mut passed = 0usize;
    let mut notes = Vec::new();

    for field in fields.enabled() {
        enabled += 1;

        let value = match record.get(&field.key) {
            Some(ExtractedValue::Found(value)) => value,
            Some(sentinel) => {
                notes.push(format!("{}: {}", field.label, sentinel));
                continue;
            }
            None => {
                notes.push(format!("{}: missing", field.label));
                continue;
            }
        };

        match check(field.kind, value) {
            Ok(()) => passed += 1,
            Err(reason) => notes.push(format!("{}: {}", field.label, reason)),
        }
    }

    let score = if enabled == 0 {
        0.0
    } else {
        passed as f32 / enabled as f32 * 100.0
    };

    Assessment { score, notes }
}

fn check(kind: FieldKind, value: &str) -> Result<(), String> {
    match kind {
        FieldKind::Text => Ok(()),
        FieldKind::Reference if value.chars().count() > MIN_REFERENCE_LEN => Ok(()),
        FieldKind::Reference => Err(format!("reference '{}' is too short", value)),
        FieldKind::Weight if value.chars().any(|c| c.is_ascii_digit()) => Ok(()),
        FieldKind::Weight => Err(format!("weight '{}' has no digits", value)),
        FieldKind::Date => match normalize_date(value) {
            Some(_) => Ok(()),
            None => Err(format!("'{}' is not a plausible date", value)),
        },
    }
}

/// Parse the first date in `text`, accepting year-first and day-first forms.
///
/// Day-first is preferred for ambiguous dates; month-first is only tried when
/// the day-first reading is not a calendar date. Two-digit years map to
/// 2000-2050 and 1951-1999. Years outside 1901-2099 are rejected.
pub fn normalize_date(text: &str) -> Option<NaiveDate> {
    let date = if let Some(caps) = DATE_YMD.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    } else {
        let caps = DATE_DMY.captures(text)?;
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year = expand_year(&caps[3])?;
        NaiveDate::from_ymd_opt(year, second, first).or_else(|| NaiveDate::from_ymd_opt(year, first, second))
    }?;

    (date.year() > MIN_YEAR && date.year() < MAX_YEAR).then_some(date)
}

fn expand_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    if s.len() > 2 {
        return Some(year);
    }
    Some(if year <= 50 { 2000 + year } else { 1900 + year })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldDescriptor;
    use crate::models::record::FieldValues;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("2024-01-15"), ymd(2024, 1, 15));
        assert_eq!(normalize_date("2024/1/5"), ymd(2024, 1, 5));
        assert_eq!(normalize_date("15.01.2024"), ymd(2024, 1, 15));
        assert_eq!(normalize_date("05/06/2024"), ymd(2024, 6, 5));
        assert_eq!(normalize_date("01/25/2024"), ymd(2024, 1, 25));
        assert_eq!(normalize_date("15-01-24"), ymd(2024, 1, 15));
        assert_eq!(normalize_date("15-01-99"), ymd(1999, 1, 15));
        assert_eq!(normalize_date("issued 2024-01-15 Seoul"), ymd(2024, 1, 15));
    }

    #[test]
    fn test_normalize_date_rejects() {
        assert_eq!(normalize_date("2024-13-45"), None);
        assert_eq!(normalize_date("1850-01-01"), None);
        assert_eq!(normalize_date("2150-01-01"), None);
        assert_eq!(normalize_date("January"), None);
        assert_eq!(normalize_date(""), None);
    }

    fn record(values: &[(&str, ExtractedValue)]) -> PageRecord {
        let mut fields = FieldValues::new();
        for (key, value) in values {
            fields.push(*key, value.clone());
        }
        PageRecord::new(1, fields)
    }

    #[test]
    fn test_full_score() {
        let record = record(&[
            ("referenceNo", ExtractedValue::Found("CO-2024-001234".into())),
            ("date", ExtractedValue::Found("2024-01-15".into())),
            ("grossWeight", ExtractedValue::Found("1,250.5 KG".into())),
        ]);

        let assessment = assess(&record, &FieldSet::default());
        assert_eq!(assessment.score, 100.0);
        assert!(assessment.is_complete());
    }

    #[test]
    fn test_partial_score_with_notes() {
        let record = record(&[
            ("referenceNo", ExtractedValue::Found("CO".into())),
            ("date", ExtractedValue::ExtractionFailed),
            ("grossWeight", ExtractedValue::Found("1,250.5 KG".into())),
        ]);

        let assessment = assess(&record, &FieldSet::default());
        assert!((assessment.score - 100.0 / 3.0).abs() < 0.01);
        assert_eq!(assessment.notes.len(), 2);
        assert!(assessment.notes[1].contains("EXTRACTION_FAILED"));
    }

    #[test]
    fn test_disabled_fields_not_counted() {
        let fields = FieldSet::new(vec![
            FieldDescriptor::new("consignee", "Consignee"),
            FieldDescriptor::new("date", "Date").with_kind(FieldKind::Date).with_enabled(false),
        ])
        .unwrap();
        let record = record(&[("consignee", ExtractedValue::Found("XYZ Import Corp".into()))]);

        let assessment = assess(&record, &fields);
        assert_eq!(assessment.score, 100.0);
    }

    #[test]
    fn test_no_enabled_fields() {
        let fields = FieldSet::new(Vec::new()).unwrap();
        assert_eq!(assess(&record(&[]), &fields).score, 0.0);
    }
}
