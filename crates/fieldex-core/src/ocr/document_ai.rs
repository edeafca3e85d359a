//! Google Document AI OCR processor client.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{OcrCollaborator, OcrDocument, OcrFuture, OcrPage, PDF_MIME_TYPE};
use crate::error::OcrError;
use crate::models::config::OcrConfig;
use crate::pdf::Chunk;

/// Longest error body kept in an [`OcrError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Client for a Document AI OCR processor's `process` method.
pub struct DocumentAiClient {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl DocumentAiClient {
    /// Create a client, reading the access token from the configured environment variable.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let token = std::env::var(&config.access_token_env).map_err(|_| {
            OcrError::Config(format!(
                "access token variable {} is not set",
                config.access_token_env
            ))
        })?;
        Self::new(config, token)
    }

    /// Create a client with an explicit access token.
    pub fn new(config: &OcrConfig, token: impl Into<String>) -> Result<Self, OcrError> {
        if config.project_id.is_empty() || config.processor_id.is_empty() {
            return Err(OcrError::Config(
                "ocr.project_id and ocr.processor_id must be set".to_string(),
            ));
        }

        let token = token.into();
        if token.trim().is_empty() {
            return Err(OcrError::Config("access token is empty".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            url: config.process_url(),
            token,
        })
    }

    /// Use a preconfigured HTTP client (proxies, custom TLS roots).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn process(&self, chunk: &Chunk) -> Result<OcrDocument, OcrError> {
        let request = ProcessRequest {
            raw_document: RawDocument {
                content: STANDARD.encode(&chunk.bytes),
                mime_type: PDF_MIME_TYPE,
            },
        };

        debug!(
            "Submitting chunk {} (pages {}-{}) to Document AI",
            chunk.index,
            chunk.range.first_page(),
            chunk.range.last_page()
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(OcrError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ProcessResponse = response
            .json()
            .await
            .map_err(|e| OcrError::Decode(e.to_string()))?;

        let document = parsed
            .document
            .ok_or_else(|| OcrError::Decode("response has no document".to_string()))?;

        let result = document.into_ocr_document();
        trace!(
            "Chunk {} recognized: {} chars, {} pages",
            chunk.index,
            result.text.len(),
            result.pages.len()
        );
        Ok(result)
    }
}

impl OcrCollaborator for DocumentAiClient {
    fn name(&self) -> &str {
        "document-ai"
    }

    fn recognize<'a>(&'a self, chunk: &'a Chunk) -> OcrFuture<'a> {
        Box::pin(self.process(chunk))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest {
    raw_document: RawDocument,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    content: String,
    mime_type: &'static str,
}

#[derive(Deserialize)]
struct ProcessResponse {
    document: Option<ResponseDocument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseDocument {
    text: String,
    pages: Vec<ResponsePage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ResponsePage {
    page_number: Option<u32>,
    layout: Option<Layout>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Layout {
    text_anchor: Option<TextAnchor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TextAnchor {
    text_segments: Vec<TextSegment>,
}

/// Character offsets into the document text. Int64 values arrive as JSON strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TextSegment {
    #[serde(deserialize_with = "int64")]
    start_index: usize,
    #[serde(deserialize_with = "int64")]
    end_index: usize,
}

fn int64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Number(u64),
        Text(String),
    }

    match Int64::deserialize(deserializer)? {
        Int64::Number(n) => usize::try_from(n).map_err(de::Error::custom),
        Int64::Text(s) => s.parse().map_err(de::Error::custom),
    }
}

impl ResponseDocument {
    fn into_ocr_document(self) -> OcrDocument {
        let has_boundaries = self.pages.iter().any(|page| {
            page.layout
                .as_ref()
                .and_then(|l| l.text_anchor.as_ref())
                .is_some_and(|a| !a.text_segments.is_empty())
        });

        if !has_boundaries {
            return OcrDocument::unpaged(self.text);
        }

        // Byte offset of every character, plus the end of the text.
        let offsets: Vec<usize> = self
            .text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(self.text.len()))
            .collect();
        let char_count = offsets.len() - 1;

        let pages = self
            .pages
            .iter()
            .map(|page| {
                let segments = page
                    .layout
                    .as_ref()
                    .and_then(|l| l.text_anchor.as_ref())
                    .map(|a| a.text_segments.as_slice())
                    .unwrap_or_default();

                let mut text = String::new();
                for segment in segments {
                    let start = segment.start_index.min(char_count);
                    let end = segment.end_index.min(char_count);
                    if start < end {
                        text.push_str(&self.text[offsets[start]..offsets[end]]);
                    }
                }

                OcrPage {
                    number: page.page_number,
                    text,
                }
            })
            .collect();

        OcrDocument {
            text: self.text,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> OcrDocument {
        let response: ProcessResponse = serde_json::from_str(json).unwrap();
        response.document.unwrap().into_ocr_document()
    }

    #[test]
    fn test_splits_text_by_segments() {
        let doc = parse(
            r#"{"document": {
                "text": "Reference No: CO-1\nDate: 2024-01-15\nGross Weight 10 KG\n",
                "pages": [
                    {"pageNumber": 1, "layout": {"textAnchor": {"textSegments": [{"endIndex": "19"}]}}},
                    {"pageNumber": 2, "layout": {"textAnchor": {"textSegments": [{"startIndex": "19", "endIndex": 55}]}}}
                ]
            }}"#,
        );

        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].number, Some(1));
        assert_eq!(doc.pages[0].text, "Reference No: CO-1\n");
        assert_eq!(doc.pages[1].text, "Date: 2024-01-15\nGross Weight 10 KG\n");
    }

    #[test]
    fn test_offsets_are_characters() {
        let doc = parse(
            r#"{"document": {
                "text": "총 중량: 5 KG\nNext",
                "pages": [
                    {"pageNumber": 1, "layout": {"textAnchor": {"textSegments": [{"startIndex": "0", "endIndex": "11"}]}}},
                    {"pageNumber": 2, "layout": {"textAnchor": {"textSegments": [{"startIndex": "11", "endIndex": "99"}]}}}
                ]
            }}"#,
        );

        assert_eq!(doc.pages[0].text, "총 중량: 5 KG\n");
        assert_eq!(doc.pages[1].text, "Next");
    }

    #[test]
    fn test_missing_boundaries_is_unpaged() {
        let doc = parse(r#"{"document": {"text": "whole chunk", "pages": [{"pageNumber": 1}]}}"#);
        assert!(!doc.is_paged());
        assert_eq!(doc.text, "whole chunk");

        let doc = parse(r#"{"document": {"text": "no pages at all"}}"#);
        assert!(!doc.is_paged());
    }

    #[test]
    fn test_missing_page_numbers_kept_as_none() {
        let doc = parse(
            r#"{"document": {
                "text": "ab",
                "pages": [
                    {"layout": {"textAnchor": {"textSegments": [{"endIndex": "1"}]}}},
                    {"layout": {"textAnchor": {"textSegments": [{"startIndex": "1", "endIndex": "2"}]}}}
                ]
            }}"#,
        );
        assert_eq!(doc.pages[0].number, None);
        assert_eq!(doc.pages[1].text, "b");
    }

    #[test]
    fn test_request_shape() {
        let request = ProcessRequest {
            raw_document: RawDocument {
                content: STANDARD.encode(b"%PDF"),
                mime_type: PDF_MIME_TYPE,
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"rawDocument":{"content":"JVBERg==","mimeType":"application/pdf"}}"#);
    }

    #[test]
    fn test_new_requires_processor() {
        let config = OcrConfig::default();
        assert!(matches!(
            DocumentAiClient::new(&config, "token"),
            Err(OcrError::Config(_))
        ));

        let config = OcrConfig {
            project_id: "p".to_string(),
            processor_id: "x".to_string(),
            ..OcrConfig::default()
        };
        assert!(DocumentAiClient::new(&config, "token").is_ok());
        assert!(DocumentAiClient::new(&config, " ").is_err());
    }
}
