//! LLM text generation, one-shot and streamed.

use pl_domain::error::{Error, Result};
use pl_sse::{CancellationToken, StreamOutcome};
use serde_json::Value;

use crate::attachment::Attachment;
use crate::client::{ApiRequest, Auth, MultipartBody, ParalegalClient};
use crate::types::{LlmJsonBody, LlmRequestOptions, LlmResponse, LlmResponseData};

const ASK_PATH: &str = "/api/sdk/v1/llm/ask";
const STREAM_PATH: &str = "/api/sdk/v1/llm/stream";

/// A typed frame from `/llm/stream`.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmStreamEvent {
    /// A fragment of generated text.
    TextDelta(String),
    /// Generation finished; carries the full text and token usage.
    Complete(LlmResponse),
    /// The host reported a failure on the open stream.
    Error(String),
}

impl LlmStreamEvent {
    /// Map a raw frame to a typed event. Unknown names and `text_delta`
    /// frames without a string `delta` yield `None`.
    pub fn from_frame(name: &str, data: &Value) -> Option<Self> {
        match name {
            "text_delta" => data
                .get("delta")
                .and_then(Value::as_str)
                .map(|delta| LlmStreamEvent::TextDelta(delta.to_owned())),
            "complete" => Some(LlmStreamEvent::Complete(LlmResponse {
                data: LlmResponseData {
                    text: data
                        .get("text")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned(),
                    usage: data
                        .get("usage")
                        .and_then(|u| serde_json::from_value(u.clone()).ok()),
                },
            })),
            "error" => Some(LlmStreamEvent::Error(
                data.get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Stream error")
                    .to_owned(),
            )),
            _ => None,
        }
    }
}

/// Accumulates a streamed generation.
#[derive(Debug, Default, Clone)]
pub struct LlmStreamCollector {
    text: String,
    response: Option<LlmResponse>,
    error: Option<String>,
}

impl LlmStreamCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: LlmStreamEvent) {
        match event {
            LlmStreamEvent::TextDelta(delta) => self.text.push_str(&delta),
            LlmStreamEvent::Complete(response) => self.response = Some(response),
            LlmStreamEvent::Error(message) => self.error = Some(message),
        }
    }

    /// Text received so far, from deltas only.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn response(&self) -> Option<&LlmResponse> {
        self.response.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The `complete` payload if one arrived, else the accumulated deltas.
    /// An `error` frame turns into [`Error::Stream`].
    pub fn into_result(self) -> Result<LlmResponse> {
        if let Some(message) = self.error {
            return Err(Error::Stream(message));
        }
        Ok(self.response.unwrap_or(LlmResponse {
            data: LlmResponseData {
                text: self.text,
                usage: None,
            },
        }))
    }
}

impl ParalegalClient {
    /// POST /api/sdk/v1/llm/ask
    ///
    /// Sends JSON, or multipart when `attachments` is non-empty.
    pub async fn ask_llm(
        &self,
        session_token: &str,
        prompt: &str,
        options: &LlmRequestOptions,
        attachments: &[Attachment],
    ) -> Result<LlmResponse> {
        let req = llm_request("LLM request", ASK_PATH, session_token, prompt, options, attachments)?;
        self.fetch_json(&req).await
    }

    /// POST /api/sdk/v1/llm/stream
    ///
    /// Calls `on_event` for each `text_delta`, `complete` and `error`
    /// frame. An `error` frame does not end the call; the host closes the
    /// stream after it.
    pub async fn stream_llm<F>(
        &self,
        session_token: &str,
        prompt: &str,
        options: &LlmRequestOptions,
        attachments: &[Attachment],
        mut on_event: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<StreamOutcome>
    where
        F: FnMut(LlmStreamEvent),
    {
        let req = llm_request("LLM stream", STREAM_PATH, session_token, prompt, options, attachments)?
            .streaming();
        self.run_stream(
            req,
            |name, data| {
                if let Some(event) = LlmStreamEvent::from_frame(name, &data) {
                    on_event(event);
                }
            },
            cancel,
        )
        .await
    }
}

fn llm_request<'a>(
    action: &'static str,
    path: &str,
    session_token: &'a str,
    prompt: &str,
    options: &LlmRequestOptions,
    attachments: &[Attachment],
) -> Result<ApiRequest<'a>> {
    let req = ApiRequest::post(action, path, Auth::Session(session_token));
    if attachments.is_empty() {
        return req.json(&LlmJsonBody { prompt, options });
    }
    Ok(req.multipart(llm_form(prompt, options, attachments)))
}

/// Empty strings are left out, matching the JSON body's omitted fields.
fn llm_form(prompt: &str, options: &LlmRequestOptions, attachments: &[Attachment]) -> MultipartBody {
    let mut form = MultipartBody::new().text("prompt", prompt);
    let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());

    if let Some(v) = non_empty(&options.system_instructions) {
        form = form.text("system_instructions", v);
    }
    if let Some(v) = non_empty(&options.provider) {
        form = form.text("provider", v);
    }
    if let Some(v) = non_empty(&options.model) {
        form = form.text("model", v);
    }
    if let Some(v) = options.temperature {
        form = form.text("temperature", v.to_string());
    }
    if let Some(v) = options.max_tokens {
        form = form.text("max_tokens", v.to_string());
    }
    form.files("attachments[]", attachments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LlmUsage;
    use serde_json::json;

    #[test]
    fn text_delta_requires_string_delta() {
        assert_eq!(
            LlmStreamEvent::from_frame("text_delta", &json!({"delta": "Hel"})),
            Some(LlmStreamEvent::TextDelta("Hel".into()))
        );
        assert_eq!(LlmStreamEvent::from_frame("text_delta", &json!({"delta": 5})), None);
        assert_eq!(LlmStreamEvent::from_frame("text_delta", &json!({})), None);
    }

    #[test]
    fn complete_defaults_text_and_parses_usage() {
        let event = LlmStreamEvent::from_frame(
            "complete",
            &json!({"usage": {"prompt_tokens": 12, "completion_tokens": 3}}),
        );
        let Some(LlmStreamEvent::Complete(resp)) = event else {
            panic!("expected complete, got {event:?}");
        };
        assert_eq!(resp.data.text, "");
        assert_eq!(
            resp.data.usage,
            Some(LlmUsage {
                prompt_tokens: 12,
                completion_tokens: 3
            })
        );
    }

    #[test]
    fn error_defaults_message() {
        assert_eq!(
            LlmStreamEvent::from_frame("error", &json!({})),
            Some(LlmStreamEvent::Error("Stream error".into()))
        );
        assert_eq!(
            LlmStreamEvent::from_frame("error", &json!({"message": "quota"})),
            Some(LlmStreamEvent::Error("quota".into()))
        );
    }

    #[test]
    fn unknown_frames_are_ignored() {
        assert_eq!(LlmStreamEvent::from_frame("ping", &json!({})), None);
    }

    #[test]
    fn collector_prefers_complete_payload() {
        let mut c = LlmStreamCollector::new();
        c.push(LlmStreamEvent::TextDelta("Hel".into()));
        c.push(LlmStreamEvent::TextDelta("lo".into()));
        assert_eq!(c.text(), "Hello");

        c.push(LlmStreamEvent::Complete(LlmResponse {
            data: LlmResponseData {
                text: "Hello.".into(),
                usage: None,
            },
        }));
        assert_eq!(c.into_result().unwrap().data.text, "Hello.");
    }

    #[test]
    fn collector_falls_back_to_deltas() {
        let mut c = LlmStreamCollector::new();
        c.push(LlmStreamEvent::TextDelta("partial".into()));
        assert_eq!(c.into_result().unwrap().data.text, "partial");
    }

    #[test]
    fn collector_error_becomes_stream_error() {
        let mut c = LlmStreamCollector::new();
        c.push(LlmStreamEvent::TextDelta("x".into()));
        c.push(LlmStreamEvent::Error("model overloaded".into()));
        assert_eq!(c.error(), Some("model overloaded"));
        let err = c.into_result().unwrap_err();
        assert!(matches!(err, Error::Stream(ref m) if m == "model overloaded"));
    }

    #[test]
    fn json_body_is_used_without_attachments() {
        let options = LlmRequestOptions {
            model: Some("gpt-4o".into()),
            ..Default::default()
        };
        let req = llm_request("LLM request", ASK_PATH, "t", "Hi", &options, &[]).unwrap();
        match req.payload {
            crate::client::Payload::Json(body) => {
                assert_eq!(body, json!({"prompt": "Hi", "model": "gpt-4o"}))
            }
            other => panic!("expected JSON payload, got {other:?}"),
        }
    }

    #[test]
    fn attachments_switch_to_multipart() {
        let files = [Attachment::new("a.png", b"png".to_vec())];
        let req = llm_request("LLM request", ASK_PATH, "t", "Hi", &LlmRequestOptions::default(), &files)
            .unwrap();
        assert!(matches!(req.payload, crate::client::Payload::Multipart(_)));
    }
}
