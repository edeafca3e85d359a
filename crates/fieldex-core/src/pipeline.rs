//! End-to-end extraction: chunk, recognize, reassemble, extract, filter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, ChunkOutcome};
use crate::error::{FieldexError, OcrError, Result};
use crate::extract::Extractor;
use crate::fields::FieldSet;
use crate::filter::retain_informative;
use crate::models::config::{ChunkingConfig, FieldexConfig};
use crate::models::record::{PageRecord, PageText};
use crate::ocr::{OcrCollaborator, OcrDocument};
use crate::pdf::{Chunk, PdfChunker};

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Pages in the source document.
    pub page_count: u32,
    /// Chunks sent to the OCR collaborator.
    pub chunks_submitted: usize,
    /// Chunks that failed after all retries.
    pub chunks_failed: usize,
    /// Pages with recognized text.
    pub pages_recognized: usize,
    /// Pages left after filtering.
    pub pages_kept: usize,
    /// Wall time in milliseconds.
    pub elapsed_ms: u64,
}

/// Runs documents through an OCR collaborator and the extraction engine.
pub struct ExtractionPipeline {
    config: FieldexConfig,
    collaborator: Arc<dyn OcrCollaborator>,
}

impl ExtractionPipeline {
    pub fn new(config: FieldexConfig, collaborator: Arc<dyn OcrCollaborator>) -> Self {
        Self {
            config,
            collaborator,
        }
    }

    pub fn config(&self) -> &FieldexConfig {
        &self.config
    }

    /// Extract `fields` from every page of a PDF.
    ///
    /// Returns `Ok` with no records when nothing could be extracted. Errors are
    /// reserved for invalid configuration and malformed documents.
    pub async fn run(&self, bytes: &[u8], fields: &FieldSet) -> Result<Vec<PageRecord>> {
        self.run_with_report(bytes, fields).await.map(|(records, _)| records)
    }

    /// Like [`run`](Self::run), also returning a summary of the run.
    pub async fn run_with_report(&self, bytes: &[u8], fields: &FieldSet) -> Result<(Vec<PageRecord>, RunReport)> {
        let start = Instant::now();
        let (pages, mut report) = self.recognize(bytes).await?;

        let fields = fields.clone();
        let scan = self.config.extraction.keyword_scan;
        let records = tokio::task::spawn_blocking(move || {
            let extractor = Extractor::with_keyword_scan(&fields, scan);
            retain_informative(extractor.extract_pages(&pages))
        })
        .await
        .map_err(|e| FieldexError::Task(e.to_string()))?;

        report.pages_kept = records.len();
        report.elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            "Extracted {} of {} pages in {}ms ({} of {} chunks failed)",
            report.pages_kept,
            report.page_count,
            report.elapsed_ms,
            report.chunks_failed,
            report.chunks_submitted
        );
        Ok((records, report))
    }

    /// Chunk a PDF and recognize its pages, without extracting fields.
    pub async fn recognize(&self, bytes: &[u8]) -> Result<(Vec<PageText>, RunReport)> {
        self.config.validate()?;
        let chunking = &self.config.chunking;

        // Parsing and re-serializing every chunk is CPU-bound.
        let source = bytes.to_vec();
        let chunk_size = chunking.chunk_size;
        let (page_count, chunks) = tokio::task::spawn_blocking(move || -> Result<(u32, Vec<Chunk>)> {
            let chunker = PdfChunker::load(&source)?;
            let chunks = chunker
                .chunks(chunk_size)
                .collect::<std::result::Result<Vec<Chunk>, _>>()?;
            Ok((chunker.page_count(), chunks))
        })
        .await
        .map_err(|e| FieldexError::Task(e.to_string()))??;

        info!(
            "Submitting {} chunks to {} (max {} in flight)",
            chunks.len(),
            self.collaborator.name(),
            chunking.max_concurrent_chunks
        );

        let outcomes: Vec<ChunkOutcome> = stream::iter(chunks.iter())
            .map(|chunk| async move {
                let result = self.recognize_chunk(chunk).await;
                ChunkOutcome::new(chunk.index, chunk.range, result)
            })
            .buffer_unordered(chunking.max_concurrent_chunks)
            .collect()
            .await;

        let mut report = RunReport {
            page_count,
            chunks_submitted: chunks.len(),
            chunks_failed: outcomes.iter().filter(|o| !o.is_ok()).count(),
            ..RunReport::default()
        };

        let pages = aggregate(outcomes);
        report.pages_recognized = pages.len();
        Ok((pages, report))
    }

    /// One chunk with timeout and bounded retries.
    async fn recognize_chunk(&self, chunk: &Chunk) -> std::result::Result<OcrDocument, OcrError> {
        let chunking = &self.config.chunking;
        let timeout = Duration::from_secs(chunking.chunk_timeout_secs);
        let mut attempt = 0;

        loop {
            let result = tokio::time::timeout(timeout, self.collaborator.recognize(chunk))
                .await
                .unwrap_or_else(|_| Err(OcrError::Timeout(chunking.chunk_timeout_secs)));

            match result {
                Ok(document) => {
                    debug!("Chunk {} recognized on attempt {}", chunk.index, attempt + 1);
                    return Ok(document);
                }
                Err(e) if attempt < chunking.max_retries && e.is_retryable() => {
                    let delay = retry_delay(chunking, attempt);
                    warn!(
                        "Chunk {} attempt {} failed: {}; retrying in {:?}",
                        chunk.index,
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Exponential backoff: the base delay doubled for each earlier retry.
fn retry_delay(chunking: &ChunkingConfig, attempt: u32) -> Duration {
    Duration::from_millis(chunking.retry_backoff_ms.saturating_mul(1 << attempt.min(16)))
}

/// Convenience: build a pipeline and run it once.
pub async fn extract_document(
    bytes: &[u8],
    fields: &FieldSet,
    config: FieldexConfig,
    collaborator: Arc<dyn OcrCollaborator>,
) -> Result<Vec<PageRecord>> {
    ExtractionPipeline::new(config, collaborator).run(bytes, fields).await
}
