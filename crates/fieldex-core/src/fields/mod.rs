//! Field descriptors: the caller's catalog of fields to extract.

mod defaults;

pub use defaults::{default_fields, DATE_PATTERN, GROSS_WEIGHT_PATTERN, REFERENCE_NO_PATTERN};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::DescriptorError;

/// What kind of value a field is expected to hold.
///
/// Only consulted by the advisory review; extraction treats every kind alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text.
    #[default]
    Text,
    /// Document or certificate reference number.
    Reference,
    /// Calendar date.
    Date,
    /// Weight with a unit.
    Weight,
}

/// A caller-defined description of one field to extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Opaque identifier assigned by the caller (e.g. a UI row id).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Stable identifier used as the output record key.
    pub key: String,

    /// Human-readable keyword searched for by the fallback strategy.
    pub label: String,

    /// Disabled descriptors produce no output and never guard other fields.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Regular expression source tried before the keyword fallback.
    ///
    /// Compiled case-insensitively with the `regex` crate syntax. Look-around
    /// and backreferences are not supported; such a pattern resolves to
    /// `PATTERN_ERROR`. The first capture group is the value, or the whole
    /// match when the pattern has no groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Expected value kind.
    #[serde(default)]
    pub kind: FieldKind,
}

fn default_enabled() -> bool {
    true
}

impl FieldDescriptor {
    /// Create an enabled descriptor without a pattern.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            id: key.clone(),
            key,
            label: label.into(),
            enabled: true,
            pattern: None,
            kind: FieldKind::Text,
        }
    }

    /// Set the explicit extraction pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set the expected value kind.
    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set whether the descriptor takes part in extraction.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A validated, ordered set of field descriptors.
///
/// Keys are unique, labels are non-empty and patterns, when present, are
/// non-empty. Construction is the only place these caller errors are reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldDescriptor>", into = "Vec<FieldDescriptor>")]
pub struct FieldSet {
    fields: Vec<FieldDescriptor>,
}

impl FieldSet {
    /// Validate and wrap a list of descriptors.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, DescriptorError> {
        let mut seen = HashSet::with_capacity(fields.len());

        for (position, field) in fields.iter().enumerate() {
            if field.key.trim().is_empty() {
                return Err(DescriptorError::EmptyKey(position));
            }
            if field.key == "page" {
                return Err(DescriptorError::ReservedKey(field.key.clone()));
            }
            if field.label.trim().is_empty() {
                return Err(DescriptorError::EmptyLabel(field.key.clone()));
            }
            if field.pattern.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err(DescriptorError::EmptyPattern(field.key.clone()));
            }
            if !seen.insert(field.key.as_str()) {
                return Err(DescriptorError::DuplicateKey(field.key.clone()));
            }
        }

        Ok(Self { fields })
    }

    /// Parse a JSON array of descriptors.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let fields: Vec<FieldDescriptor> = serde_json::from_str(json)
            .map_err(|e| crate::FieldexError::Config(format!("invalid field list: {}", e)))?;
        Ok(Self::new(fields)?)
    }

    /// All descriptors, in caller order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    /// Enabled descriptors, in caller order.
    pub fn enabled(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.enabled)
    }

    /// Look up a descriptor by key.
    pub fn get(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self {
            fields: default_fields(),
        }
    }
}

impl TryFrom<Vec<FieldDescriptor>> for FieldSet {
    type Error = DescriptorError;

    fn try_from(fields: Vec<FieldDescriptor>) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<FieldSet> for Vec<FieldDescriptor> {
    fn from(set: FieldSet) -> Self {
        set.fields
    }
}
