//! PDF loading and page-bounded chunking.

mod chunker;

pub use chunker::{plan_chunks, Chunk, PageRange, PdfChunker};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;
