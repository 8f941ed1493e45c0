//! `ParalegalClient`: request construction, authentication headers, and
//! the send/retry engine shared by every endpoint module.

use std::time::{Duration, Instant};

use pl_domain::config::ClientConfig;
use pl_domain::error::{Error, Result};
use pl_domain::trace::TraceEvent;
use pl_sse::from_reqwest;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::attachment::Attachment;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");
const CLIENT_TYPE_HEADER: HeaderName = HeaderName::from_static("x-client-type");
const TRACE_ID_HEADER: HeaderName = HeaderName::from_static("x-trace-id");
const CLIENT_TYPE: &str = "paralegal-sdk-rust";
pub(crate) const EVENT_STREAM: &str = "text/event-stream";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Client for the AI Paralegal host SDK API.
///
/// Cheap to clone; the underlying `reqwest::Client` keeps a connection pool.
#[derive(Debug, Clone)]
pub struct ParalegalClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    max_retries: u32,
}

impl ParalegalClient {
    /// Build a client from a [`ClientConfig`].
    ///
    /// Fails with [`Error::Config`] when `base_url` is empty. Trailing
    /// slashes are stripped so paths can be appended verbatim.
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let base_url = cfg.base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(Error::Config("ParalegalClient: base_url is required".into()));
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            api_key: cfg.resolve_api_key(),
            timeout: Duration::from_millis(cfg.timeout_ms),
            max_retries: cfg.max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Build the full URL for an API path like `/api/sdk/v1/docs`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ── auth headers ─────────────────────────────────────────────────

    /// Headers for API-key authenticated requests.
    pub fn api_key_headers(&self) -> Result<HeaderMap> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            Error::Auth(
                "ParalegalClient: apiKey is required for API-key authenticated requests".into(),
            )
        })?;

        let mut headers = json_headers();
        headers.insert(API_KEY_HEADER, header_value(key)?);
        Ok(headers)
    }

    /// Headers for session-token authenticated JSON requests.
    pub fn session_headers(&self, session_token: &str) -> Result<HeaderMap> {
        let mut headers = json_headers();
        headers.insert(AUTHORIZATION, bearer(session_token)?);
        Ok(headers)
    }

    /// Headers for session-token authenticated multipart requests. No
    /// `Content-Type`: reqwest sets it together with the boundary.
    pub fn multipart_session_headers(&self, session_token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer(session_token)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    // ── request helpers ──────────────────────────────────────────────

    /// Turn an [`ApiRequest`] into a ready-to-send `RequestBuilder`.
    ///
    /// Called once per attempt: multipart forms cannot be cloned, so the
    /// body is rebuilt from the request description each time.
    fn build(&self, req: &ApiRequest<'_>) -> Result<RequestBuilder> {
        let multipart = matches!(req.payload, Payload::Multipart(_));
        let mut headers = match req.auth {
            Auth::ApiKey => self.api_key_headers()?,
            Auth::Session(token) if multipart => self.multipart_session_headers(token)?,
            Auth::Session(token) => self.session_headers(token)?,
        };
        if req.streaming {
            headers.insert(ACCEPT, HeaderValue::from_static(EVENT_STREAM));
        }
        headers.insert(CLIENT_TYPE_HEADER, HeaderValue::from_static(CLIENT_TYPE));
        headers.insert(TRACE_ID_HEADER, header_value(&Uuid::new_v4().to_string())?);

        let mut rb = self
            .http
            .request(req.method.clone(), self.url(&req.path))
            .headers(headers);

        // Streams stay open for as long as the host keeps generating.
        if !req.streaming {
            rb = rb.timeout(self.timeout);
        }

        rb = match &req.payload {
            Payload::Empty => rb,
            Payload::Json(body) => rb.body(serde_json::to_vec(body)?),
            Payload::Multipart(body) => rb.multipart(body.to_form()?),
        };
        Ok(rb)
    }

    // ── retry engine ─────────────────────────────────────────────────

    /// Send a request, returning the response only when it is 2xx.
    ///
    /// * GET requests are retried with exponential back-off on 5xx and
    ///   transport errors, up to `max_retries` times.
    /// * Everything else is sent exactly once.
    /// * Non-2xx responses become [`Error::Api`] with the body's `message`
    ///   field, or `"<action> failed with status <n>"`.
    /// * Emits a `TraceEvent::ApiCall` after every attempt.
    pub(crate) async fn execute(&self, req: &ApiRequest<'_>) -> Result<Response> {
        let endpoint = req.endpoint();
        let retries = if req.method == Method::GET {
            self.max_retries
        } else {
            0
        };
        let mut last_err: Option<Error> = None;

        for attempt in 0..=retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tracing::debug!(
                    endpoint = %endpoint,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "retrying request"
                );
                tokio::time::sleep(backoff).await;
            }

            let start = Instant::now();
            let result = self.build(req)?.send().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    let status = resp.status();

                    TraceEvent::ApiCall {
                        endpoint: endpoint.clone(),
                        status: status.as_u16(),
                        duration_ms,
                        attempt,
                    }
                    .emit();

                    if status.is_success() {
                        return Ok(resp);
                    }

                    let err = api_error(req.action, resp).await;
                    if status.is_server_error() && attempt < retries {
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let status = e.status().map(|s| s.as_u16()).unwrap_or(0);

                    TraceEvent::ApiCall {
                        endpoint: endpoint.clone(),
                        status,
                        duration_ms,
                        attempt,
                    }
                    .emit();

                    tracing::warn!(endpoint = %endpoint, attempt, error = %e, "request failed");
                    last_err = Some(from_reqwest(e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Other(format!("{endpoint}: all retries exhausted"))))
    }

    /// Send a request and decode its JSON body.
    pub(crate) async fn fetch_json<T: DeserializeOwned>(&self, req: &ApiRequest<'_>) -> Result<T> {
        let resp = self.execute(req).await?;
        let body = resp.text().await.map_err(from_reqwest)?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(
                endpoint = %req.endpoint(),
                error = %e,
                body = %truncate(&body, 512),
                "unexpected response body"
            );
            Error::Json(e)
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request description
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy)]
pub(crate) enum Auth<'a> {
    ApiKey,
    Session(&'a str),
}

#[derive(Debug)]
pub(crate) enum Payload {
    Empty,
    Json(Value),
    Multipart(MultipartBody),
}

/// Text fields plus file parts, in insertion order.
#[derive(Debug, Default)]
pub(crate) struct MultipartBody {
    texts: Vec<(&'static str, String)>,
    files: Vec<(&'static str, Attachment)>,
}

impl MultipartBody {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.texts.push((name, value.into()));
        self
    }

    pub(crate) fn files(mut self, name: &'static str, files: &[Attachment]) -> Self {
        self.files.extend(files.iter().map(|file| (name, file.clone())));
        self
    }

    fn to_form(&self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in &self.texts {
            form = form.text(*name, value.clone());
        }
        for (name, file) in &self.files {
            let part = Part::bytes(file.bytes().to_vec()).file_name(file.filename().to_owned());
            let part = match file.mime_type() {
                Some(mime) => part
                    .mime_str(mime)
                    .map_err(|e| Error::Other(format!("invalid MIME type '{mime}': {e}")))?,
                None => part,
            };
            form = form.part(*name, part);
        }
        Ok(form)
    }
}

/// Everything needed to (re)build one API call.
#[derive(Debug)]
pub(crate) struct ApiRequest<'a> {
    /// Human label used in `"<action> failed with status <n>"`.
    pub action: &'static str,
    pub method: Method,
    pub path: String,
    pub auth: Auth<'a>,
    pub payload: Payload,
    pub streaming: bool,
}

impl<'a> ApiRequest<'a> {
    pub(crate) fn new(action: &'static str, method: Method, path: impl Into<String>, auth: Auth<'a>) -> Self {
        Self {
            action,
            method,
            path: path.into(),
            auth,
            payload: Payload::Empty,
            streaming: false,
        }
    }

    pub(crate) fn get(action: &'static str, path: impl Into<String>, auth: Auth<'a>) -> Self {
        Self::new(action, Method::GET, path, auth)
    }

    pub(crate) fn post(action: &'static str, path: impl Into<String>, auth: Auth<'a>) -> Self {
        Self::new(action, Method::POST, path, auth)
    }

    pub(crate) fn delete(action: &'static str, path: impl Into<String>, auth: Auth<'a>) -> Self {
        Self::new(action, Method::DELETE, path, auth)
    }

    pub(crate) fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.payload = Payload::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub(crate) fn multipart(mut self, body: MultipartBody) -> Self {
        self.payload = Payload::Multipart(body);
        self
    }

    pub(crate) fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }

    /// `"POST /api/sdk/v1/llm/stream"`, used in trace events and logs.
    pub(crate) fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::Auth("credential contains characters not allowed in a header".into()))
}

fn bearer(session_token: &str) -> Result<HeaderValue> {
    header_value(&format!("Bearer {session_token}"))
}

/// Build the error for a non-2xx response.
async fn api_error(action: &str, resp: Response) -> Error {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Error::Api {
        status,
        message: failure_message(action, status, &body),
    }
}

/// The body's `message` string when present, else a generic line.
pub(crate) fn failure_message(action: &str, status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| format!("{action} failed with status {status}"))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
