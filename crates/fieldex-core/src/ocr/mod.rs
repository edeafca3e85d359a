//! OCR collaborators: services that turn a chunk sub-document into page texts.

mod document_ai;
#[cfg(feature = "native")]
mod embedded;

pub use document_ai::DocumentAiClient;
#[cfg(feature = "native")]
pub use embedded::EmbeddedTextRecognizer;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::pdf::Chunk;

/// Mime type of every chunk submitted for recognition.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Boxed future returned by [`OcrCollaborator::recognize`].
pub type OcrFuture<'a> = Pin<Box<dyn Future<Output = Result<OcrDocument, OcrError>> + Send + 'a>>;

/// An external service that recognizes text in a bounded PDF.
///
/// Implementations may fail per chunk; the pipeline logs the failure and drops
/// the chunk's pages rather than aborting the run.
pub trait OcrCollaborator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Recognize the text of one chunk.
    fn recognize<'a>(&'a self, chunk: &'a Chunk) -> OcrFuture<'a>;
}

/// Text recovered from one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrDocument {
    /// Full recovered text of the chunk.
    pub text: String,

    /// Per-page slices of `text`. Empty when the service gave no page boundaries.
    pub pages: Vec<OcrPage>,
}

/// Text of one page within a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrPage {
    /// Page number within the chunk (1-indexed), when the service reports one.
    pub number: Option<u32>,
    /// Recovered text of the page.
    pub text: String,
}

impl OcrDocument {
    /// A response without page boundaries.
    pub fn unpaged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pages: Vec::new(),
        }
    }

    /// A response made of consecutive page texts, numbered from 1.
    pub fn from_page_texts<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages: Vec<OcrPage> = pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| OcrPage {
                number: Some(i as u32 + 1),
                text: text.into(),
            })
            .collect();
        let text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self { text, pages }
    }

    /// Whether the response carries per-page boundaries.
    pub fn is_paged(&self) -> bool {
        !self.pages.is_empty()
    }
}
