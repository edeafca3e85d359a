//! Dropping pages that yielded nothing.

use tracing::debug;

use crate::models::record::PageRecord;

/// Keep only records with at least one real value.
///
/// A page where every field is `EXTRACTION_FAILED` or `PATTERN_ERROR` is
/// removed; partial successes stay.
pub fn retain_informative(records: Vec<PageRecord>) -> Vec<PageRecord> {
    let before = records.len();
    let kept: Vec<PageRecord> = records
        .into_iter()
        .filter(|record| record.values.has_extracted_value())
        .collect();

    if kept.len() < before {
        debug!("Filtered out {} pages without extracted values", before - kept.len());
    }
    kept
}
