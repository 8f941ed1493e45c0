//! Byte sources the consumer can read from.

use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use pl_domain::error::{Error, Result};
use reqwest::StatusCode;

/// A sequential producer of binary chunks with an explicit end of stream.
///
/// A source is owned by exactly one [`consume`](crate::consume) call, which
/// calls [`release`](Self::release) exactly once when it is done with it,
/// whatever the outcome.
#[async_trait]
pub trait ByteSource: Send {
    /// The next chunk, or `None` once the stream has ended.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;

    /// Free the underlying transport resources.
    fn release(&mut self);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// reqwest response body
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Reads the body of a `reqwest::Response` chunk by chunk.
#[derive(Debug)]
pub struct ResponseSource {
    response: Option<reqwest::Response>,
}

impl ResponseSource {
    /// Wrap a response whose body can be streamed.
    ///
    /// Returns `None` for statuses that never carry a body (204, 205, 304),
    /// which [`consume`](crate::consume) reports as
    /// [`Error::StreamUnsupported`].
    pub fn from_response(response: reqwest::Response) -> Option<Self> {
        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED => None,
            _ => Some(Self {
                response: Some(response),
            }),
        }
    }

    pub fn is_released(&self) -> bool {
        self.response.is_none()
    }
}

#[async_trait]
impl ByteSource for ResponseSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        match self.response.as_mut() {
            Some(response) => response.chunk().await.map_err(from_reqwest),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        if self.response.take().is_some() {
            tracing::trace!("response body released");
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generic chunk stream
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Adapts any `Stream` of byte chunks (e.g. `reqwest::Response::bytes_stream`
/// mapped into the domain error, or an in-memory fixture).
pub struct StreamSource<S> {
    inner: Option<S>,
}

impl<S> StreamSource<S>
where
    S: Stream<Item = Result<Bytes>> + Unpin + Send,
{
    pub fn new(inner: S) -> Self {
        Self { inner: Some(inner) }
    }

    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }
}

#[async_trait]
impl<S> ByteSource for StreamSource<S>
where
    S: Stream<Item = Result<Bytes>> + Unpin + Send,
{
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        match self.inner.as_mut() {
            Some(inner) => inner.next().await.transpose(),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.inner = None;
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error conversion helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert a `reqwest::Error` into a domain `Error`.
///
/// Timeout errors become `Error::Timeout`; everything else becomes
/// `Error::Http`.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
