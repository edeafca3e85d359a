//! Error types for the fieldex-core library.

use thiserror::Error;

/// Main error type for the fieldex library.
///
/// Only structural and configuration problems surface here. Chunk-level OCR
/// failures are absorbed by the pipeline and field-level failures are sentinel
/// values in the output records.
#[derive(Error, Debug)]
pub enum FieldexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR collaborator error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Invalid field descriptor set.
    #[error("descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A blocking worker panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Task(String),
}

impl FieldexError {
    /// Whether the error was caused by the input document rather than setup.
    pub fn is_document_error(&self) -> bool {
        matches!(self, FieldexError::Pdf(_))
    }
}

/// Errors related to PDF loading and chunking.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// A page range does not fit the loaded document.
    #[error("invalid page range {first}..={last} for a {total}-page document")]
    InvalidRange { first: u32, last: u32, total: u32 },

    /// Failed to write a chunk sub-document.
    #[error("failed to build chunk for pages {first}..={last}: {reason}")]
    Chunk { first: u32, last: u32, reason: String },
}

/// Errors returned by an OCR collaborator for a single chunk.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The collaborator could not be reached.
    #[error("request failed: {0}")]
    Request(String),

    /// The collaborator answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The chunk did not complete in time.
    #[error("timed out after {0}s")]
    Timeout(u64),

    /// Text layer extraction failed.
    #[error("text extraction failed: {0}")]
    TextExtraction(String),

    /// The collaborator is not configured correctly.
    #[error("collaborator misconfigured: {0}")]
    Config(String),
}

impl OcrError {
    /// Whether another attempt at the same chunk could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            OcrError::Request(_) | OcrError::Timeout(_) => true,
            OcrError::Status { status, .. } => *status == 429 || *status >= 500,
            OcrError::Decode(_) | OcrError::TextExtraction(_) | OcrError::Config(_) => false,
        }
    }
}

/// Caller errors in a field descriptor set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// A descriptor has an empty key.
    #[error("descriptor at position {0} has an empty key")]
    EmptyKey(usize),

    /// A descriptor has an empty label.
    #[error("descriptor '{0}' has an empty label")]
    EmptyLabel(String),

    /// A descriptor has a pattern that is present but empty.
    #[error("descriptor '{0}' has an empty pattern")]
    EmptyPattern(String),

    /// A key collides with a column every record already has.
    #[error("descriptor key '{0}' is reserved")]
    ReservedKey(String),

    /// Two descriptors share a key.
    #[error("duplicate descriptor key '{0}'")]
    DuplicateKey(String),
}

/// Result type for the fieldex library.
pub type Result<T> = std::result::Result<T, FieldexError>;
