//! Data models: pipeline configuration and per-page records.

pub mod config;
pub mod record;

pub use config::{ChunkingConfig, ExtractionConfig, FieldexConfig, OcrConfig};
pub use record::{ExtractedValue, FieldValues, PageRecord, PageText, EXTRACTION_FAILED, PATTERN_ERROR};
