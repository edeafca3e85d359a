//! Configuration structures for the extraction pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FieldexError;
use crate::extract::KeywordScan;
use crate::fields::FieldSet;

/// Main configuration for the fieldex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldexConfig {
    /// Document chunking and OCR dispatch.
    pub chunking: ChunkingConfig,

    /// OCR collaborator settings.
    pub ocr: OcrConfig,

    /// Field extraction settings.
    pub extraction: ExtractionConfig,
}

/// How documents are split and submitted to the OCR collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum pages per OCR submission.
    pub chunk_size: u32,

    /// Maximum chunk submissions in flight.
    pub max_concurrent_chunks: usize,

    /// Per-attempt timeout for one chunk, in seconds.
    pub chunk_timeout_secs: u64,

    /// Retries after a failed chunk attempt.
    pub max_retries: u32,

    /// Delay before the first retry; doubled for each further retry.
    pub retry_backoff_ms: u64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10,
            max_concurrent_chunks: 4,
            chunk_timeout_secs: 120,
            max_retries: 1,
            retry_backoff_ms: 500,
        }
    }
}

/// Document AI processor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// API base URL. Empty means the regional default for `location`.
    pub endpoint: String,

    /// Google Cloud project id.
    pub project_id: String,

    /// Processor location (e.g. "us", "eu").
    pub location: String,

    /// OCR processor id.
    pub processor_id: String,

    /// Environment variable holding the OAuth access token.
    pub access_token_env: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            project_id: String::new(),
            location: "us".to_string(),
            processor_id: String::new(),
            access_token_env: "FIELDEX_OCR_TOKEN".to_string(),
        }
    }
}

impl OcrConfig {
    /// Base URL of the processing API.
    pub fn base_url(&self) -> String {
        if self.endpoint.is_empty() {
            format!("https://{}-documentai.googleapis.com", self.location)
        } else {
            self.endpoint.trim_end_matches('/').to_string()
        }
    }

    /// Full URL of the processor's `process` method.
    pub fn process_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/processors/{}:process",
            self.base_url(),
            self.project_id,
            self.location,
            self.processor_id
        )
    }
}

/// Field extraction settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Whether the keyword fallback looks past the first line containing a label.
    pub keyword_scan: KeywordScan,

    /// Descriptor set used when the caller supplies none. `None` means the built-ins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_fields: Option<FieldSet>,
}

impl ExtractionConfig {
    /// The configured default descriptors, or the built-in three.
    pub fn fields(&self) -> FieldSet {
        self.default_fields.clone().unwrap_or_default()
    }
}

impl FieldexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(FieldexError::Config("chunking.chunk_size must be at least 1".to_string()));
        }
        if self.chunking.max_concurrent_chunks == 0 {
            return Err(FieldexError::Config(
                "chunking.max_concurrent_chunks must be at least 1".to_string(),
            ));
        }
        if self.chunking.chunk_timeout_secs == 0 {
            return Err(FieldexError::Config(
                "chunking.chunk_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
