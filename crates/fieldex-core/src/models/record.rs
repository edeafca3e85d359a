//! Page texts, extracted values and the per-page output records.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Literal emitted when no extraction rule matched.
pub const EXTRACTION_FAILED: &str = "EXTRACTION_FAILED";

/// Literal emitted when a descriptor's pattern failed to compile.
pub const PATTERN_ERROR: &str = "PATTERN_ERROR";

/// Recovered text of one physical page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// Original page number (1-indexed).
    pub page: u32,
    /// Text returned by the OCR collaborator.
    pub text: String,
}

impl PageText {
    pub fn new(page: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
        }
    }
}

/// Outcome of extracting one field from one page.
///
/// Serializes to a plain string; the two failure variants serialize to their
/// sentinel literals so partial results stay representable in JSON and CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedValue {
    /// A value was found.
    Found(String),
    /// Neither the explicit pattern nor the keyword fallback produced a value.
    ExtractionFailed,
    /// The descriptor's pattern did not compile.
    PatternError,
}

impl ExtractedValue {
    /// The string form: the value itself or the sentinel literal.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Found(value) => value,
            Self::ExtractionFailed => EXTRACTION_FAILED,
            Self::PatternError => PATTERN_ERROR,
        }
    }

    /// The extracted value, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Found(_))
    }
}

impl fmt::Display for ExtractedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ExtractedValue {
    fn from(s: String) -> Self {
        match s.as_str() {
            EXTRACTION_FAILED => Self::ExtractionFailed,
            PATTERN_ERROR => Self::PatternError,
            _ => Self::Found(s),
        }
    }
}

impl Serialize for ExtractedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExtractedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Extracted values for one page, keyed by descriptor key in descriptor order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    entries: Vec<(String, ExtractedValue)>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a value. Keys are unique because descriptor sets are validated.
    pub fn push(&mut self, key: impl Into<String>, value: ExtractedValue) {
        self.entries.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&ExtractedValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtractedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when at least one value is not a sentinel.
    pub fn has_extracted_value(&self) -> bool {
        self.entries.iter().any(|(_, v)| !v.is_sentinel())
    }
}

/// One output row: a page number plus its extracted values.
///
/// Serialized flat, e.g. `{"page": 2, "referenceNo": "CO-1", "date": "EXTRACTION_FAILED"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// Original page number (1-indexed).
    pub page: u32,
    /// Values per enabled descriptor.
    pub values: FieldValues,
}

impl PageRecord {
    pub fn new(page: u32, values: FieldValues) -> Self {
        Self { page, values }
    }

    pub fn get(&self, key: &str) -> Option<&ExtractedValue> {
        self.values.get(key)
    }
}

impl Serialize for PageRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("page", &self.page)?;
        for (key, value) in self.values.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PageRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;

        let mut page = None;
        let mut values = FieldValues::with_capacity(object.len());
        for (key, value) in object {
            if key == "page" {
                let number = value
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| de::Error::custom("page must be a positive integer"))?;
                page = Some(number);
            } else {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                values.push(key, ExtractedValue::from(value));
            }
        }

        let page = page.ok_or_else(|| de::Error::missing_field("page"))?;
        Ok(Self { page, values })
    }
}
