//! Per-page field extraction.
//!
//! Each enabled descriptor is resolved by running an ordered list of
//! strategies; the first one that finds a value wins. A descriptor whose
//! pattern does not compile resolves to `PATTERN_ERROR` on every page, and one
//! that nothing matches resolves to `EXTRACTION_FAILED`. Neither is an error.

mod strategy;

pub use strategy::{
    colon_value, next_line_value, trailing_value, CompiledField, ExplicitPattern, ExtractionStrategy,
    KeywordLine, KeywordScan, LineCandidate, LineRule, OtherLabels, PageView, StrategyOutcome, LINE_RULES,
};

use rayon::prelude::*;
use tracing::debug;

use crate::fields::FieldSet;
use crate::models::record::{ExtractedValue, FieldValues, PageRecord, PageText};

/// Extracts the enabled fields of one descriptor set from page texts.
///
/// Patterns and label matchers are compiled once at construction; extraction
/// itself is pure and can run on many pages in parallel.
pub struct Extractor {
    fields: Vec<CompiledField>,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Extractor {
    /// Compile `fields` with the default keyword scan.
    pub fn new(fields: &FieldSet) -> Self {
        Self::with_keyword_scan(fields, KeywordScan::default())
    }

    /// Compile `fields`, choosing how the keyword fallback scans.
    pub fn with_keyword_scan(fields: &FieldSet, scan: KeywordScan) -> Self {
        let fields: Vec<CompiledField> = fields.enabled().map(CompiledField::compile).collect();

        for field in &fields {
            if let Some(Err(e)) = &field.pattern {
                debug!("Pattern for '{}' does not compile: {}", field.key, e);
            }
        }

        Self {
            fields,
            strategies: vec![Box::new(ExplicitPattern), Box::new(KeywordLine::new(scan))],
        }
    }

    /// Output keys, in descriptor order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    /// Strategy names, in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract every enabled field from one page of text.
    pub fn extract(&self, page_text: &str) -> FieldValues {
        let page = PageView::new(page_text);
        let mut values = FieldValues::with_capacity(self.fields.len());

        for (index, field) in self.fields.iter().enumerate() {
            let others = OtherLabels::new(
                self.fields
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != index)
                    .map(|(_, f)| f)
                    .collect(),
            );
            values.push(field.key.clone(), self.resolve(&page, field, &others));
        }

        values
    }

    /// Extract one page into a record.
    pub fn extract_page(&self, page: &PageText) -> PageRecord {
        PageRecord::new(page.page, self.extract(&page.text))
    }

    /// Extract many pages in parallel, keeping their order.
    pub fn extract_pages(&self, pages: &[PageText]) -> Vec<PageRecord> {
        pages.par_iter().map(|page| self.extract_page(page)).collect()
    }

    fn resolve(&self, page: &PageView<'_>, field: &CompiledField, others: &OtherLabels<'_>) -> ExtractedValue {
        for strategy in &self.strategies {
            match strategy.apply(page, field, others) {
                StrategyOutcome::Found(value) => return ExtractedValue::Found(value),
                StrategyOutcome::Abort(sentinel) => return sentinel,
                StrategyOutcome::NoMatch => {}
            }
        }
        ExtractedValue::ExtractionFailed
    }
}

/// Extract the enabled fields of `fields` from one page of text.
pub fn extract(page_text: &str, fields: &FieldSet) -> FieldValues {
    Extractor::new(fields).extract(page_text)
}
