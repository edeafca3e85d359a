//! Reassembly of per-chunk OCR output into ordered page texts.

use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::record::PageText;
use crate::ocr::OcrDocument;
use crate::pdf::PageRange;

/// The result of recognizing one chunk, tagged with the pages it carried.
#[derive(Debug)]
pub struct ChunkOutcome {
    pub index: usize,
    pub range: PageRange,
    pub result: Result<OcrDocument, OcrError>,
}

impl ChunkOutcome {
    pub fn new(index: usize, range: PageRange, result: Result<OcrDocument, OcrError>) -> Self {
        Self { index, range, result }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Merge chunk outcomes, in any completion order, into page texts ordered by
/// original page number.
///
/// Failed chunks contribute no pages. Gaps left by them are kept as gaps.
pub fn aggregate(mut outcomes: Vec<ChunkOutcome>) -> Vec<PageText> {
    outcomes.sort_by_key(|o| o.range);

    let mut pages = Vec::new();
    for outcome in outcomes {
        let range = outcome.range;
        match outcome.result {
            Ok(document) => collect_pages(range, document, &mut pages),
            Err(e) => warn!(
                "Chunk {} (pages {}-{}) failed, its pages are omitted: {}",
                outcome.index,
                range.first_page(),
                range.last_page(),
                e
            ),
        }
    }

    pages.sort_by_key(|p| p.page);
    pages
}

fn collect_pages(range: PageRange, document: OcrDocument, out: &mut Vec<PageText>) {
    if !document.is_paged() {
        debug!(
            "No page boundaries for pages {}-{}, attributing text to page {}",
            range.first_page(),
            range.last_page(),
            range.first_page()
        );
        out.push(PageText::new(range.first_page(), document.text));
        return;
    }

    for (position, page) in document.pages.into_iter().enumerate() {
        let within = page.number.unwrap_or(position as u32 + 1);
        let number = range
            .first_page()
            .checked_add(within)
            .and_then(|n| n.checked_sub(1));

        match number {
            Some(number) if within > 0 && range.contains_page(number) => {
                out.push(PageText::new(number, page.text));
            }
            _ => warn!(
                "Dropping recognized page {} outside chunk pages {}-{}",
                within,
                range.first_page(),
                range.last_page()
            ),
        }
    }
}
