//! Core library for customs document field extraction.
//!
//! This crate provides:
//! - PDF chunking into page-bounded sub-documents
//! - OCR collaborators (Document AI, embedded text layer)
//! - Reassembly of per-chunk OCR output into ordered page texts
//! - Per-page field extraction with pattern and keyword fallbacks
//! - Filtering and advisory review of the extracted records

pub mod error;
pub mod models;
pub mod fields;
pub mod pdf;
pub mod ocr;
pub mod aggregate;
pub mod extract;
pub mod filter;
pub mod review;
pub mod pipeline;

pub use error::{DescriptorError, FieldexError, OcrError, PdfError, Result};
pub use models::{
    ChunkingConfig, ExtractedValue, ExtractionConfig, FieldValues, FieldexConfig, OcrConfig, PageRecord,
    PageText, EXTRACTION_FAILED, PATTERN_ERROR,
};
pub use fields::{default_fields, FieldDescriptor, FieldKind, FieldSet};
pub use pdf::{plan_chunks, Chunk, PageRange, PdfChunker};
pub use ocr::{DocumentAiClient, OcrCollaborator, OcrDocument, OcrPage};
#[cfg(feature = "native")]
pub use ocr::EmbeddedTextRecognizer;
pub use aggregate::{aggregate, ChunkOutcome};
pub use extract::{extract, Extractor, KeywordScan};
pub use filter::retain_informative;
pub use review::{assess, normalize_date, Assessment};
pub use pipeline::{extract_document, ExtractionPipeline, RunReport};
