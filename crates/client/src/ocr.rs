//! Server-side text extraction (PDF, images, DOCX).

use std::collections::BTreeMap;

use pl_domain::error::{Error, Result};
use pl_sse::{CancellationToken, StreamOutcome};
use serde_json::Value;

use crate::attachment::Attachment;
use crate::client::{ApiRequest, Auth, MultipartBody, ParalegalClient};
use crate::types::{OcrExtraction, OcrResponse, OcrResponseData};

/// A typed frame from `/ocr/stream`.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrStreamEvent {
    TextDelta { filename: String, delta: String },
    /// One file is done (`extraction_complete`).
    FileComplete(OcrExtraction),
    /// Every file is done.
    Complete(OcrResponse),
    Error(String),
}

impl OcrStreamEvent {
    pub fn from_frame(name: &str, data: &Value) -> Option<Self> {
        match name {
            "text_delta" => {
                let filename = data.get("filename").and_then(Value::as_str)?;
                let delta = data.get("delta").and_then(Value::as_str)?;
                Some(OcrStreamEvent::TextDelta {
                    filename: filename.to_owned(),
                    delta: delta.to_owned(),
                })
            }
            "extraction_complete" => match serde_json::from_value(data.clone()) {
                Ok(extraction) => Some(OcrStreamEvent::FileComplete(extraction)),
                Err(e) => {
                    tracing::debug!(error = %e, "malformed extraction_complete frame");
                    None
                }
            },
            "complete" => {
                let extractions = data
                    .get("extractions")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default();
                Some(OcrStreamEvent::Complete(OcrResponse {
                    data: OcrResponseData { extractions },
                }))
            }
            "error" => Some(OcrStreamEvent::Error(
                data.get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Stream error")
                    .to_owned(),
            )),
            _ => None,
        }
    }
}

/// Accumulates a streamed extraction, keeping per-file text as well as the
/// running total.
#[derive(Debug, Default, Clone)]
pub struct OcrStreamCollector {
    text: String,
    per_file: BTreeMap<String, String>,
    finished: Vec<OcrExtraction>,
    response: Option<OcrResponse>,
    error: Option<String>,
}

impl OcrStreamCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: OcrStreamEvent) {
        match event {
            OcrStreamEvent::TextDelta { filename, delta } => {
                self.text.push_str(&delta);
                self.per_file.entry(filename).or_default().push_str(&delta);
            }
            OcrStreamEvent::FileComplete(extraction) => self.finished.push(extraction),
            OcrStreamEvent::Complete(response) => self.response = Some(response),
            OcrStreamEvent::Error(message) => self.error = Some(message),
        }
    }

    /// All deltas so far, across files, in arrival order.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_text(&self, filename: &str) -> Option<&str> {
        self.per_file.get(filename).map(String::as_str)
    }

    pub fn finished_files(&self) -> &[OcrExtraction] {
        &self.finished
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The `complete` payload, else the files that finished individually.
    pub fn into_result(self) -> Result<OcrResponse> {
        if let Some(message) = self.error {
            return Err(Error::Stream(message));
        }
        Ok(self.response.unwrap_or(OcrResponse {
            data: OcrResponseData {
                extractions: self.finished,
            },
        }))
    }
}

impl ParalegalClient {
    /// POST /api/sdk/v1/ocr/extract
    pub async fn extract_text(&self, session_token: &str, files: &[Attachment]) -> Result<OcrResponse> {
        let req = ApiRequest::post("OCR request", "/api/sdk/v1/ocr/extract", Auth::Session(session_token))
            .multipart(MultipartBody::new().files("files[]", files));
        self.fetch_json(&req).await
    }

    /// POST /api/sdk/v1/ocr/stream
    pub async fn stream_ocr<F>(
        &self,
        session_token: &str,
        files: &[Attachment],
        mut on_event: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<StreamOutcome>
    where
        F: FnMut(OcrStreamEvent),
    {
        let req = ApiRequest::post("OCR stream", "/api/sdk/v1/ocr/stream", Auth::Session(session_token))
            .multipart(MultipartBody::new().files("files[]", files))
            .streaming();
        self.run_stream(
            req,
            |name, data| {
                if let Some(event) = OcrStreamEvent::from_frame(name, &data) {
                    on_event(event);
                }
            },
            cancel,
        )
        .await
    }
}
