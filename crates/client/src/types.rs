//! Request and response bodies of the host SDK API.
//!
//! Field names follow the wire format (`snake_case`), except the Ask-AI
//! references which the host sends in `camelCase`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Token exchange
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /api/sdk/v1/token/exchange: request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenExchangeRequest {
    pub exchange_token: String,
}

/// POST /api/sdk/v1/token/exchange: response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenExchangeResponse {
    pub session_token: String,
    pub firm_id: String,
    pub matter_id: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Ask AI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /api/sdk/v1/ai/ask (API-key auth): request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskAiRequest {
    pub prompt: String,
    pub firm_id: String,
    pub matter_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_matter_facts: Option<bool>,
}

/// POST /api/sdk/v1/ai/ask (session auth): request body. Firm and matter
/// come from the session token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionAskAiRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_matter_facts: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskAiReference {
    pub client_document_id: String,
    pub client_document_name: String,
    #[serde(default)]
    pub parent_client_document_id: Option<String>,
    #[serde(default)]
    pub parent_document_name: Option<String>,
    #[serde(default)]
    pub provider_item_path: Option<String>,
    pub matter_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskAiResponseData {
    pub answer: String,
    #[serde(default)]
    pub references: Vec<AskAiReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskAiResponse {
    pub data: AskAiResponseData,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Submit result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /api/sdk/v1/result: request body. `result` is an object or a
/// string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResultRequest {
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResultResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Provider/model selection and sampling options for LLM calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmRequestOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// POST /api/sdk/v1/llm/{ask,stream}: JSON request body.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LlmJsonBody<'a> {
    pub prompt: &'a str,
    #[serde(flatten)]
    pub options: &'a LlmRequestOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponseData {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<LlmUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub data: LlmResponseData,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// OCR
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Text extracted from one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrExtraction {
    pub filename: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrResponseData {
    #[serde(default)]
    pub extractions: Vec<OcrExtraction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrResponse {
    pub data: OcrResponseData,
}

impl OcrResponse {
    /// All extracted texts joined by a blank line, in upload order.
    pub fn combined_text(&self) -> String {
        self.data
            .extractions
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Files and MarkItDown
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A file stored on the host for the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesResponseData {
    #[serde(default)]
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesResponse {
    pub data: FilesResponseData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkItDownConversion {
    pub filename: String,
    pub markdown: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkItDownResponseData {
    #[serde(default)]
    pub conversions: Vec<MarkItDownConversion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkItDownResponse {
    pub data: MarkItDownResponseData,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Documents
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /api/sdk/v1/docs/create: request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocCreateOptions {
    pub markdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Output format, e.g. `docx`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocDetail {
    #[serde(flatten)]
    pub meta: DocMeta,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMarkdown {
    pub id: String,
    pub filename: String,
    pub markdown: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocList {
    #[serde(default)]
    pub documents: Vec<DocMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocCreateResponse {
    pub data: DocMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocUploadResponse {
    pub data: DocList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsListResponse {
    pub data: DocList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocShowResponse {
    pub data: DocDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocUpdateResponse {
    pub data: DocMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMarkdownResponse {
    pub data: DocMarkdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ask_reference_uses_camel_case() {
        let body = json!({
            "data": {
                "answer": "Yes.",
                "references": [{
                    "clientDocumentId": "d1",
                    "clientDocumentName": "Lease.pdf",
                    "parentClientDocumentId": null,
                    "parentDocumentName": null,
                    "providerItemPath": "/matters/1/Lease.pdf",
                    "matterId": "m1"
                }]
            }
        });
        let resp: AskAiResponse = serde_json::from_value(body).unwrap();
        let r = &resp.data.references[0];
        assert_eq!(r.client_document_name, "Lease.pdf");
        assert_eq!(r.provider_item_path.as_deref(), Some("/matters/1/Lease.pdf"));
        assert!(r.parent_client_document_id.is_none());
    }

    #[test]
    fn unset_ask_flags_are_omitted() {
        let req = SessionAskAiRequest {
            prompt: "Summarise".into(),
            load_matter_facts: None,
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"prompt": "Summarise"}));
    }

    #[test]
    fn llm_json_body_flattens_options_and_omits_unset() {
        let options = LlmRequestOptions {
            provider: Some("openai".into()),
            max_tokens: Some(256),
            ..Default::default()
        };
        let body = LlmJsonBody {
            prompt: "Hi",
            options: &options,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"prompt": "Hi", "provider": "openai", "max_tokens": 256})
        );
    }

    #[test]
    fn token_exchange_defaults_optional_fields() {
        let body = json!({
            "session_token": "sess-abc",
            "firm_id": "firm-1",
            "matter_id": "matter-1",
            "expires_at": "2026-12-31T00:00:00Z"
        });
        let resp: TokenExchangeResponse = serde_json::from_value(body).unwrap();
        assert!(resp.parameters.is_empty());
        assert!(resp.chat_id.is_none());
        assert_eq!(resp.expires_at.to_rfc3339(), "2026-12-31T00:00:00+00:00");
    }

    #[test]
    fn doc_detail_flattens_meta() {
        let body = json!({
            "id": "doc-1",
            "filename": "letter.docx",
            "mime_type": "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "size": 2048,
            "created_at": "2026-01-02T03:04:05Z",
            "updated_at": "2026-01-02T03:04:05Z",
            "content": "Dear Sir"
        });
        let detail: DocDetail = serde_json::from_value(body).unwrap();
        assert_eq!(detail.meta.id, "doc-1");
        assert_eq!(detail.meta.size, 2048);
        assert_eq!(detail.content, "Dear Sir");
    }

    #[test]
    fn combined_ocr_text_joins_with_blank_line() {
        let resp = OcrResponse {
            data: OcrResponseData {
                extractions: vec![
                    OcrExtraction {
                        filename: "a.png".into(),
                        text: "first".into(),
                        mime_type: None,
                    },
                    OcrExtraction {
                        filename: "b.pdf".into(),
                        text: "second".into(),
                        mime_type: Some("application/pdf".into()),
                    },
                ],
            },
        };
        assert_eq!(resp.combined_text(), "first\n\nsecond");
    }
}
