//! Built-in descriptors for certificates of origin and shipping documents.

use super::{FieldDescriptor, FieldKind};

/// Reference / certificate number, e.g. `Reference No.: CO-2024-001234`.
pub const REFERENCE_NO_PATTERN: &str = r"Reference\s*No\.?\s*[:\-]?\s*([A-Z0-9][A-Z0-9\-/]*)";

/// Issue date in day-first, month-first or ISO order.
pub const DATE_PATTERN: &str = r"Date\s*[:\-]?\s*(\d{4}[\-/.]\d{1,2}[\-/.]\d{1,2}|\d{1,2}[\-/.]\d{1,2}[\-/.]\d{2,4})";

/// Gross weight with its unit, e.g. `Gross Weight: 1,250.5 KG`.
pub const GROSS_WEIGHT_PATTERN: &str = r"Gross\s*Weight\s*[:\-]?\s*(\d[\d,.]*\s*(?:KGS?|T|TONS?)\b)";

/// The three descriptors used when the caller supplies none.
pub fn default_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("referenceNo", "Reference No")
            .with_pattern(REFERENCE_NO_PATTERN)
            .with_kind(FieldKind::Reference),
        FieldDescriptor::new("date", "Date")
            .with_pattern(DATE_PATTERN)
            .with_kind(FieldKind::Date),
        FieldDescriptor::new("grossWeight", "Gross Weight")
            .with_pattern(GROSS_WEIGHT_PATTERN)
            .with_kind(FieldKind::Weight),
    ]
}
