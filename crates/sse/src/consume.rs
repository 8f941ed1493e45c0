use std::time::Instant;

use pl_domain::error::{Error, Result};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::buffer::LineBuffer;
use crate::frame::{FrameParser, LineOutcome};
use crate::source::ByteSource;

/// How a [`consume`] call ended (errors are returned separately).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The source reached end of stream.
    Completed,
    /// The cancellation token fired; the source was released early.
    Cancelled,
}

impl StreamOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamOutcome::Completed => "completed",
            StreamOutcome::Cancelled => "cancelled",
        }
    }
}

/// Read `source` to the end, calling `on_event(name, payload)` for every
/// well-formed frame in arrival order.
///
/// * `source` is `None` when the transport provided no readable body; this
///   fails with [`Error::StreamUnsupported`] before anything is read.
/// * `on_event` runs synchronously; the next read starts only after it
///   returns.
/// * `cancel` is checked before every read and raced against a pending read.
///   A chunk that has already been read is always fully dispatched; text
///   after its last newline is discarded.
///
/// The source is released exactly once on every path. Read errors are
/// returned unchanged after the release. An unterminated line left at end of
/// stream is discarded.
pub async fn consume<S, F>(
    source: Option<S>,
    mut on_event: F,
    cancel: Option<&CancellationToken>,
) -> Result<StreamOutcome>
where
    S: ByteSource,
    F: FnMut(&str, Value),
{
    let mut source = ReleaseOnDrop(source.ok_or(Error::StreamUnsupported)?);

    let result = drive(&mut source.0, &mut on_event, cancel).await;
    drop(source);
    result
}

/// Owns the source for the duration of a [`consume`] call and releases it
/// when dropped. This covers a panicking handler or read, and a caller that
/// drops the `consume` future before it finishes.
struct ReleaseOnDrop<S: ByteSource>(S);

impl<S: ByteSource> Drop for ReleaseOnDrop<S> {
    fn drop(&mut self) {
        self.0.release();
    }
}

async fn drive<S, F>(
    source: &mut S,
    on_event: &mut F,
    cancel: Option<&CancellationToken>,
) -> Result<StreamOutcome>
where
    S: ByteSource,
    F: FnMut(&str, Value),
{
    let start = Instant::now();
    let mut lines = LineBuffer::new();
    let mut parser = FrameParser::new();
    let mut emitted = 0usize;
    let mut dropped = 0usize;

    loop {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            tracing::debug!(
                emitted,
                discarded_chars = lines.pending().len(),
                "event stream cancelled"
            );
            lines.clear();
            parser.reset();
            return Ok(StreamOutcome::Cancelled);
        }

        let chunk = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!(emitted, "event stream cancelled while reading");
                    lines.clear();
                    parser.reset();
                    return Ok(StreamOutcome::Cancelled);
                }
                chunk = source.next_chunk() => chunk,
            },
            None => source.next_chunk().await,
        };

        let chunk = match chunk {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(emitted, error = %e, "event stream read failed");
                return Err(e);
            }
        };

        for line in lines.push(&chunk) {
            match parser.feed_line(&line) {
                LineOutcome::Frame(frame) => {
                    emitted += 1;
                    on_event(&frame.event, frame.data);
                }
                LineOutcome::Dropped(reason) => {
                    dropped += 1;
                    tracing::debug!(?reason, "event frame dropped");
                }
                LineOutcome::EventNamed | LineOutcome::Ignored => {}
            }
        }
    }

    if !lines.is_empty() {
        tracing::debug!(
            discarded_chars = lines.pending().len(),
            "unterminated line discarded at end of stream"
        );
        lines.clear();
    }

    tracing::debug!(
        emitted,
        dropped,
        duration_ms = start.elapsed().as_millis() as u64,
        "event stream completed"
    );
    Ok(StreamOutcome::Completed)
}
