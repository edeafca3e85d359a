//! Splitting a PDF into page-bounded sub-documents using lopdf.

use lopdf::Document;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::Result;
use crate::error::PdfError;

/// A contiguous, half-open range of 0-based page indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageRange {
    /// First page index (0-based, inclusive).
    pub start: u32,
    /// One past the last page index.
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of pages covered.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First page as a 1-indexed page number.
    pub fn first_page(&self) -> u32 {
        self.start + 1
    }

    /// Last page as a 1-indexed page number.
    pub fn last_page(&self) -> u32 {
        self.end
    }

    /// Whether a 1-indexed page number falls inside the range.
    pub fn contains_page(&self, page: u32) -> bool {
        page > self.start && page <= self.end
    }

    /// 1-indexed page numbers covered by the range.
    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        self.first_page()..=self.last_page()
    }
}

/// A standalone sub-document holding a slice of the source pages.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Position of the chunk in source order (0-based).
    pub index: usize,
    /// Source pages carried by this chunk.
    pub range: PageRange,
    /// Serialized PDF containing exactly those pages, in original order.
    pub bytes: Vec<u8>,
}

/// Partition `page_count` pages into ranges of at most `chunk_size` pages.
///
/// Ranges are contiguous, ordered and cover every page exactly once; only the
/// last range may be shorter. A zero `chunk_size` yields no ranges.
pub fn plan_chunks(page_count: u32, chunk_size: u32) -> Vec<PageRange> {
    if chunk_size == 0 {
        return Vec::new();
    }

    let mut ranges = Vec::with_capacity(page_count.div_ceil(chunk_size) as usize);
    let mut start = 0;
    while start < page_count {
        let end = start.saturating_add(chunk_size).min(page_count);
        ranges.push(PageRange::new(start, end));
        start = end;
    }
    ranges
}

/// Loads a PDF once and cuts it into chunk sub-documents.
pub struct PdfChunker {
    document: Document,
    page_count: u32,
}

impl PdfChunker {
    /// Parse a PDF from bytes.
    ///
    /// Documents encrypted with an empty user password are decrypted; any other
    /// encryption, a parse failure, or a page-less document is a structural error.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = document.get_pages().len() as u32;
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self {
            document,
            page_count,
        })
    }

    /// Number of pages in the source document.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Ranges this document splits into for the given chunk size.
    pub fn plan(&self, chunk_size: u32) -> Vec<PageRange> {
        plan_chunks(self.page_count, chunk_size)
    }

    /// Build chunks one at a time, in source order.
    pub fn chunks(&self, chunk_size: u32) -> impl Iterator<Item = Result<Chunk>> + '_ {
        self.plan(chunk_size)
            .into_iter()
            .enumerate()
            .map(move |(index, range)| self.build_chunk(index, range))
    }

    /// Build the sub-document for one range.
    pub fn build_chunk(&self, index: usize, range: PageRange) -> Result<Chunk> {
        if range.is_empty() || range.end > self.page_count {
            return Err(PdfError::InvalidRange {
                first: range.first_page(),
                last: range.last_page(),
                total: self.page_count,
            });
        }

        let chunk_error = |reason: String| PdfError::Chunk {
            first: range.first_page(),
            last: range.last_page(),
            reason,
        };

        let mut sub = self.document.clone();
        let outside: Vec<u32> = (1..=self.page_count)
            .filter(|page| !range.contains_page(*page))
            .collect();

        if !outside.is_empty() {
            sub.delete_pages(&outside);
            sub.prune_objects();
        }

        let kept = sub.get_pages().len() as u32;
        if kept != range.len() {
            return Err(chunk_error(format!(
                "expected {} pages after split, found {}",
                range.len(),
                kept
            )));
        }

        let mut bytes = Vec::new();
        sub.save_to(&mut bytes)
            .map_err(|e| chunk_error(e.to_string()))?;

        trace!(
            "Built chunk {} (pages {}-{}, {} bytes)",
            index,
            range.first_page(),
            range.last_page(),
            bytes.len()
        );

        Ok(Chunk {
            index,
            range,
            bytes,
        })
    }
}
