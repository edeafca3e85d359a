//! Extraction strategies, tried in order until one yields a value.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::fields::FieldDescriptor;
use crate::models::record::ExtractedValue;

lazy_static! {
    /// A line break together with the whitespace around it.
    static ref LINE_BREAK: Regex = Regex::new(r"\s*[\r\n]\s*").unwrap();
}

/// How far the keyword fallback searches for a usable line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordScan {
    /// Only the first line containing the label is considered.
    FirstOccurrence,
    /// Later lines containing the label are tried when an earlier one yields nothing.
    #[default]
    AllOccurrences,
}

/// One page, prepared once and shared by every field.
pub struct PageView<'t> {
    /// Original lines, in order.
    pub lines: Vec<&'t str>,
    /// Whole page with line breaks collapsed to single spaces.
    pub flowed: String,
}

impl<'t> PageView<'t> {
    pub fn new(text: &'t str) -> Self {
        Self {
            lines: text.lines().collect(),
            flowed: LINE_BREAK.replace_all(text, " ").into_owned(),
        }
    }
}

/// A descriptor with its matchers compiled for one run.
pub struct CompiledField {
    /// Output key.
    pub key: String,
    /// The explicit pattern: absent, compiled, or a compile error.
    pub pattern: Option<Result<Regex, regex::Error>>,
    /// Case-insensitive literal matcher for the label.
    pub label: Option<Regex>,
}

impl CompiledField {
    pub fn compile(field: &FieldDescriptor) -> Self {
        let pattern = field
            .pattern
            .as_deref()
            .map(|source| RegexBuilder::new(source).case_insensitive(true).build());

        let label = RegexBuilder::new(&regex::escape(field.label.trim()))
            .case_insensitive(true)
            .build()
            .ok();

        Self {
            key: field.key.clone(),
            pattern,
            label,
        }
    }

    /// Whether the field's label occurs in `text`.
    pub fn label_in(&self, text: &str) -> bool {
        self.label.as_ref().is_some_and(|re| re.is_match(text))
    }
}

/// Labels of the other enabled fields, used to reject a next line that is
/// really another field's heading.
pub struct OtherLabels<'f> {
    fields: Vec<&'f CompiledField>,
}

impl<'f> OtherLabels<'f> {
    pub fn new(fields: Vec<&'f CompiledField>) -> Self {
        Self { fields }
    }

    pub fn none() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn any_in(&self, text: &str) -> bool {
        self.fields.iter().any(|f| f.label_in(text))
    }
}

/// Result of applying one strategy to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// A value was found; later strategies are skipped.
    Found(String),
    /// Nothing found; the next strategy is tried.
    NoMatch,
    /// Extraction stops for this field with the given sentinel.
    Abort(ExtractedValue),
}

/// A single tier of the fallback chain.
pub trait ExtractionStrategy: Send + Sync {
    /// Name used in tests and diagnostics.
    fn name(&self) -> &'static str;

    /// Try to extract `field` from `page`.
    fn apply(&self, page: &PageView<'_>, field: &CompiledField, others: &OtherLabels<'_>) -> StrategyOutcome;
}

/// Search the flowed page with the descriptor's own pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitPattern;

impl ExtractionStrategy for ExplicitPattern {
    fn name(&self) -> &'static str {
        "explicit_pattern"
    }

    fn apply(&self, page: &PageView<'_>, field: &CompiledField, _others: &OtherLabels<'_>) -> StrategyOutcome {
        let regex = match &field.pattern {
            None => return StrategyOutcome::NoMatch,
            Some(Err(_)) => return StrategyOutcome::Abort(ExtractedValue::PatternError),
            Some(Ok(regex)) => regex,
        };

        // Group 1 when the pattern has groups, the whole match otherwise.
        let group = if regex.captures_len() > 1 { 1 } else { 0 };

        regex
            .captures(&page.flowed)
            .and_then(|caps| caps.get(group))
            .and_then(|m| non_empty(m.as_str()))
            .map_or(StrategyOutcome::NoMatch, StrategyOutcome::Found)
    }
}

/// Find the label on a line and read the value next to or below it.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordLine {
    pub scan: KeywordScan,
}

impl KeywordLine {
    pub fn new(scan: KeywordScan) -> Self {
        Self { scan }
    }
}

impl ExtractionStrategy for KeywordLine {
    fn name(&self) -> &'static str {
        "keyword_line"
    }

    fn apply(&self, page: &PageView<'_>, field: &CompiledField, others: &OtherLabels<'_>) -> StrategyOutcome {
        let Some(label) = &field.label else {
            return StrategyOutcome::NoMatch;
        };

        for (index, &line) in page.lines.iter().enumerate() {
            let Some(found) = label.find(line) else {
                continue;
            };

            let candidate = LineCandidate {
                line,
                label_end: found.end(),
                next: page.lines.get(index + 1).copied(),
            };

            if let Some(value) = LINE_RULES.iter().find_map(|(_, rule)| rule(&candidate, others)) {
                return StrategyOutcome::Found(value);
            }

            if self.scan == KeywordScan::FirstOccurrence {
                break;
            }
        }

        StrategyOutcome::NoMatch
    }
}

/// A line containing the label, with its neighbour.
pub struct LineCandidate<'t> {
    pub line: &'t str,
    /// Byte offset just past the label within `line`.
    pub label_end: usize,
    pub next: Option<&'t str>,
}

/// A rule reading a value off a candidate line.
pub type LineRule = fn(&LineCandidate<'_>, &OtherLabels<'_>) -> Option<String>;

/// Keyword line rules in precedence order.
pub const LINE_RULES: [(&str, LineRule); 3] = [
    ("colon", colon_value),
    ("trailing", trailing_value),
    ("next_line", next_line_value),
];

/// `Date: 2024-01-15` reads everything after the first colon.
pub fn colon_value(candidate: &LineCandidate<'_>, _others: &OtherLabels<'_>) -> Option<String> {
    candidate
        .line
        .split_once(':')
        .and_then(|(_, after)| non_empty(after))
}

/// `Gross Weight 1,250.5 KG` reads what follows the label on a colon-free line.
pub fn trailing_value(candidate: &LineCandidate<'_>, _others: &OtherLabels<'_>) -> Option<String> {
    if candidate.line.contains(':') {
        return None;
    }
    non_empty(&candidate.line[candidate.label_end..])
}

/// A label alone on its line takes the next line, unless that line names another field.
pub fn next_line_value(candidate: &LineCandidate<'_>, others: &OtherLabels<'_>) -> Option<String> {
    let next = candidate.next?;
    if others.any_in(next) {
        return None;
    }
    non_empty(next)
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compiled(label: &str, pattern: Option<&str>) -> CompiledField {
        let mut field = FieldDescriptor::new("f", label);
        field.pattern = pattern.map(str::to_string);
        CompiledField::compile(&field)
    }

    fn candidate<'t>(line: &'t str, label: &str, next: Option<&'t str>) -> LineCandidate<'t> {
        let end = compiled(label, None).label.unwrap().find(line).unwrap().end();
        LineCandidate {
            line,
            label_end: end,
            next,
        }
    }

    #[test]
    fn test_page_view_flows_lines() {
        let view = PageView::new("Reference No:\n   AB-123\r\nDate: x");
        assert_eq!(view.flowed, "Reference No: AB-123 Date: x");
        assert_eq!(view.lines, vec!["Reference No:", "   AB-123", "Date: x"]);
    }

    #[test]
    fn test_explicit_pattern_first_group() {
        let field = compiled("Reference No", Some(r"Reference No:\s*([A-Z0-9\-]+)"));
        let page = PageView::new("CERTIFICATE\nReference No:   AB-123  \nDate: 2024-01-15");
        assert_eq!(
            ExplicitPattern.apply(&page, &field, &OtherLabels::none()),
            StrategyOutcome::Found("AB-123".to_string())
        );
    }

    #[test]
    fn test_explicit_pattern_spans_line_breaks() {
        let field = compiled("Reference No", Some(r"Reference No:\s*([A-Z0-9\-]+)"));
        let page = PageView::new("Reference No:\nab-123");
        assert_eq!(
            ExplicitPattern.apply(&page, &field, &OtherLabels::none()),
            StrategyOutcome::Found("ab-123".to_string())
        );
    }

    #[test]
    fn test_explicit_pattern_without_group_uses_whole_match() {
        let field = compiled("Container", Some(r"[A-Z]{4}\d{7}"));
        let page = PageView::new("Container MSCU1234567 loaded");
        assert_eq!(
            ExplicitPattern.apply(&page, &field, &OtherLabels::none()),
            StrategyOutcome::Found("MSCU1234567".to_string())
        );
    }

    #[test]
    fn test_explicit_pattern_unset_group_falls_through() {
        let field = compiled("Reference No", Some(r"Reference No(\.)?:\s*\S+"));
        let page = PageView::new("Reference No: AB-1");
        assert_eq!(
            ExplicitPattern.apply(&page, &field, &OtherLabels::none()),
            StrategyOutcome::NoMatch
        );
        assert_eq!(
            ExplicitPattern.apply(&PageView::new("Reference No.: AB-1"), &field, &OtherLabels::none()),
            StrategyOutcome::Found(".".to_string())
        );
    }

    #[test]
    fn test_explicit_pattern_outcomes() {
        let page = PageView::new("nothing relevant");
        let none = OtherLabels::none();

        assert_eq!(ExplicitPattern.apply(&page, &compiled("x", None), &none), StrategyOutcome::NoMatch);
        assert_eq!(
            ExplicitPattern.apply(&page, &compiled("x", Some(r"Ref(\d+")), &none),
            StrategyOutcome::Abort(ExtractedValue::PatternError)
        );
        assert_eq!(
            ExplicitPattern.apply(&page, &compiled("x", Some(r"(?<=Ref: )\S+")), &none),
            StrategyOutcome::Abort(ExtractedValue::PatternError)
        );
        assert_eq!(
            ExplicitPattern.apply(&page, &compiled("x", Some(r"Ref(\d+)")), &none),
            StrategyOutcome::NoMatch
        );
        assert_eq!(
            ExplicitPattern.apply(&PageView::new("Ref:   "), &compiled("x", Some(r"Ref:(\s*)")), &none),
            StrategyOutcome::NoMatch
        );
    }

    #[test]
    fn test_colon_rule() {
        let none = OtherLabels::none();
        assert_eq!(
            colon_value(&candidate("Consignee: XYZ Import Corp", "Consignee", None), &none),
            Some("XYZ Import Corp".to_string())
        );
        assert_eq!(
            colon_value(&candidate("Time: 10:30", "Time", None), &none),
            Some("10:30".to_string())
        );
        assert_eq!(colon_value(&candidate("Date:   ", "Date", None), &none), None);
        assert_eq!(colon_value(&candidate("Gross Weight 5 KG", "Gross Weight", None), &none), None);
    }

    #[test]
    fn test_trailing_rule() {
        let none = OtherLabels::none();
        assert_eq!(
            trailing_value(&candidate("Gross Weight 1,250.5 KG", "Gross Weight", None), &none),
            Some("1,250.5 KG".to_string())
        );
        assert_eq!(
            trailing_value(&candidate("TOTAL GROSS WEIGHT   980 KGS", "gross weight", None), &none),
            Some("980 KGS".to_string())
        );
        assert_eq!(trailing_value(&candidate("Date", "Date", None), &none), None);
        assert_eq!(trailing_value(&candidate("Date:", "Date", None), &none), None);
    }

    #[test]
    fn test_next_line_rule() {
        let none = OtherLabels::none();
        assert_eq!(
            next_line_value(&candidate("Date", "Date", Some("  2024-01-15 ")), &none),
            Some("2024-01-15".to_string())
        );
        assert_eq!(next_line_value(&candidate("Date", "Date", Some("   ")), &none), None);
        assert_eq!(next_line_value(&candidate("Date", "Date", None), &none), None);

        let weight = compiled("Gross Weight", None);
        let guard = OtherLabels::new(vec![&weight]);
        assert_eq!(
            next_line_value(&candidate("Date", "Date", Some("Gross Weight 5 KG")), &guard),
            None
        );
    }

    #[test]
    fn test_keyword_label_is_literal() {
        let field = compiled("Ref. No (A+B)", None);
        let page = PageView::new("RefX No (A+B) wrong\nref. no (a+b): right");
        assert_eq!(
            KeywordLine::default().apply(&page, &field, &OtherLabels::none()),
            StrategyOutcome::Found("right".to_string())
        );
    }

    #[test]
    fn test_keyword_scan_modes() {
        let field = compiled("Date", None);
        let page = PageView::new("Date\n\nShipment Date: 2024-02-01");
        let none = OtherLabels::none();

        assert_eq!(
            KeywordLine::new(KeywordScan::FirstOccurrence).apply(&page, &field, &none),
            StrategyOutcome::NoMatch
        );
        assert_eq!(
            KeywordLine::new(KeywordScan::AllOccurrences).apply(&page, &field, &none),
            StrategyOutcome::Found("2024-02-01".to_string())
        );
    }

    #[test]
    fn test_line_rules_precedence() {
        let names: Vec<&str> = LINE_RULES.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["colon", "trailing", "next_line"]);
    }
}
