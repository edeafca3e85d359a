//! Recognizer that reads a chunk's embedded text layer with pdf-extract.

use tracing::debug;

use super::{OcrCollaborator, OcrDocument, OcrFuture};
use crate::error::OcrError;
use crate::pdf::Chunk;

/// Offline collaborator for digitally generated PDFs.
///
/// Scanned pages have no text layer and come back empty, which the result
/// filter then drops.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTextRecognizer;

impl EmbeddedTextRecognizer {
    pub fn new() -> Self {
        Self
    }
}

impl OcrCollaborator for EmbeddedTextRecognizer {
    fn name(&self) -> &str {
        "embedded-text"
    }

    fn recognize<'a>(&'a self, chunk: &'a Chunk) -> OcrFuture<'a> {
        Box::pin(async move {
            let bytes = chunk.bytes.clone();

            // pdf-extract is CPU-bound and panics on some malformed fonts.
            let pages = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem_by_pages(&bytes)
            })
            .await
            .map_err(|e| OcrError::TextExtraction(e.to_string()))?
            .map_err(|e| OcrError::TextExtraction(e.to_string()))?;

            debug!(
                "Read text layer of chunk {}: {} pages",
                chunk.index,
                pages.len()
            );
            Ok(OcrDocument::from_page_texts(pages))
        })
    }
}
