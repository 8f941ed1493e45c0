//! End-to-end behaviour of `consume` against scripted byte sources.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use pl_domain::error::{Error, Result};
use pl_sse::{consume, ByteSource, CancellationToken, StreamOutcome};
use serde_json::{json, Value};

// ── Scripted source ─────────────────────────────────────────────────────

enum Step {
    Chunk(Bytes),
    Fail(&'static str),
    /// Never resolves; only cancellation can end the read.
    Hang,
}

#[derive(Default, Clone)]
struct Counters {
    reads: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl Counters {
    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
    fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

struct ScriptedSource {
    steps: VecDeque<Step>,
    counters: Counters,
}

impl ScriptedSource {
    fn new(steps: Vec<Step>) -> (Self, Counters) {
        let counters = Counters::default();
        let source = Self {
            steps: steps.into(),
            counters: counters.clone(),
        };
        (source, counters)
    }

    fn from_chunks(chunks: &[&[u8]]) -> (Self, Counters) {
        Self::new(
            chunks
                .iter()
                .map(|c| Step::Chunk(Bytes::copy_from_slice(c)))
                .collect(),
        )
    }
}

#[async_trait]
impl ByteSource for ScriptedSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        match self.steps.pop_front() {
            Some(Step::Chunk(bytes)) => Ok(Some(bytes)),
            Some(Step::Fail(msg)) => Err(Error::Http(msg.into())),
            Some(Step::Hang) => std::future::pending().await,
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

async fn collect(chunks: &[&[u8]]) -> (Vec<(String, Value)>, Counters) {
    let (source, counters) = ScriptedSource::from_chunks(chunks);
    let mut events = Vec::new();
    let outcome = consume(
        Some(source),
        |name, data| events.push((name.to_owned(), data)),
        None,
    )
    .await
    .unwrap();
    assert_eq!(outcome, StreamOutcome::Completed);
    (events, counters)
}

// ── Ordering and framing ────────────────────────────────────────────────

#[tokio::test]
async fn three_chunk_llm_stream_delivers_in_order() {
    let (events, counters) = collect(&[
        b"event: text_delta\ndata: {\"delta\":\"Hel\"}\n",
        b"event: text_delta\ndata: {\"delta\":\"lo\"}\n",
        b"event: complete\ndata: {\"text\":\"Hello\"}\n",
    ])
    .await;

    assert_eq!(
        events,
        vec![
            ("text_delta".to_owned(), json!({"delta": "Hel"})),
            ("text_delta".to_owned(), json!({"delta": "lo"})),
            ("complete".to_owned(), json!({"text": "Hello"})),
        ]
    );
    assert_eq!(counters.releases(), 1);
}

#[tokio::test]
async fn many_frames_in_one_chunk_keep_source_order() {
    let mut body = String::new();
    for i in 0..50 {
        body.push_str(&format!("event: n\ndata: {i}\n\n"));
    }
    let (events, _) = collect(&[body.as_bytes()]).await;
    let seen: Vec<i64> = events.iter().map(|(_, v)| v.as_i64().unwrap()).collect();
    assert_eq!(seen, (0..50).collect::<Vec<_>>());
}

#[tokio::test]
async fn line_split_across_chunks_yields_one_frame() {
    let (events, _) = collect(&[
        b"event: tex",
        b"t_delta\ndata: {\"delta\":\"x\"}\n",
    ])
    .await;
    assert_eq!(events, vec![("text_delta".to_owned(), json!({"delta": "x"}))]);
}

#[tokio::test]
async fn event_name_survives_chunk_boundary() {
    let (events, _) = collect(&[b"event: complete\n", b"data: {\"text\":\"done\"}\n"]).await;
    assert_eq!(events, vec![("complete".to_owned(), json!({"text": "done"}))]);
}

#[tokio::test]
async fn multibyte_character_split_across_chunks() {
    let body = "event: text_delta\ndata: {\"delta\":\"héllo\"}\n".as_bytes();
    let cut = body.iter().position(|b| *b == 0xC3).unwrap() + 1;
    let (first, second) = body.split_at(cut);

    let (events, _) = collect(&[first, second]).await;
    assert_eq!(events, vec![("text_delta".to_owned(), json!({"delta": "héllo"}))]);
}

#[tokio::test]
async fn byte_at_a_time_delivery_matches_single_chunk() {
    let body = "event: a\ndata: {\"v\":\"ünïcødé ✓\"}\n\nevent: b\ndata: [1,2]\n";
    let singles: Vec<&[u8]> = body.as_bytes().chunks(1).collect();

    let (split, _) = collect(&singles).await;
    let (whole, _) = collect(&[body.as_bytes()]).await;
    assert_eq!(split, whole);
    assert_eq!(split.len(), 2);
}

#[tokio::test]
async fn crlf_framing_is_tolerated() {
    let (events, _) = collect(&[b"event: complete\r\ndata: {\"ok\":true}\r\n\r\n"]).await;
    assert_eq!(events, vec![("complete".to_owned(), json!({"ok": true}))]);
}

// ── Drop rules ──────────────────────────────────────────────────────────

#[tokio::test]
async fn sentinel_never_reaches_handler() {
    let (events, _) = collect(&[
        b"event: text_delta\ndata: </stream>\n",
        b"event: complete\ndata:   </stream>  \n",
    ])
    .await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn invalid_json_is_skipped_without_error() {
    let (events, _) = collect(&[
        b"event: text_delta\ndata: {not valid json}\n",
        b"event: complete\ndata: {\"text\":\"after\"}\n",
    ])
    .await;
    assert_eq!(events, vec![("complete".to_owned(), json!({"text": "after"}))]);
}

#[tokio::test]
async fn data_without_event_is_skipped() {
    let (events, _) = collect(&[b"data: {\"orphan\":true}\n\n"]).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn second_data_line_under_one_event_is_dropped() {
    let (events, _) = collect(&[b"event: text_delta\ndata: {\"delta\":\"a\"}\ndata: {\"delta\":\"b\"}\n"])
        .await;
    assert_eq!(events, vec![("text_delta".to_owned(), json!({"delta": "a"}))]);
}

#[tokio::test]
async fn data_after_sentinel_under_same_event_is_dropped() {
    let (events, _) = collect(&[b"event: text_delta\ndata: </stream>\ndata: {\"delta\":\"b\"}\n"])
        .await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn unterminated_trailing_line_is_discarded() {
    let (events, _) = collect(&[b"event: complete\ndata: {\"text\":\"no newline\"}"]).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn empty_stream_completes_cleanly() {
    let (events, counters) = collect(&[]).await;
    assert!(events.is_empty());
    assert_eq!(counters.reads(), 1);
    assert_eq!(counters.releases(), 1);
}

// ── Errors ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_source_is_stream_unsupported() {
    let mut called = false;
    let err = consume(None::<ScriptedSource>, |_, _| called = true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StreamUnsupported));
    assert!(!called);
}

#[tokio::test]
async fn read_error_propagates_after_release() {
    let (source, counters) = ScriptedSource::new(vec![
        Step::Chunk(Bytes::from_static(b"event: text_delta\ndata: {\"delta\":\"a\"}\nevent: te")),
        Step::Fail("connection reset"),
        Step::Chunk(Bytes::from_static(b"xt_delta\ndata: {\"delta\":\"b\"}\n")),
    ]);

    let mut events = Vec::new();
    let err = consume(Some(source), |name, data| events.push((name.to_owned(), data)), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(ref msg) if msg == "connection reset"));
    assert_eq!(events.len(), 1);
    assert_eq!(counters.reads(), 2);
    assert_eq!(counters.releases(), 1);
}

// ── Cancellation ────────────────────────────────────────────────────────

#[tokio::test]
async fn cancelled_before_first_read_reads_nothing() {
    let (source, counters) = ScriptedSource::from_chunks(&[b"event: a\ndata: 1\n"]);
    let token = CancellationToken::new();
    token.cancel();

    let mut calls = 0;
    let outcome = consume(Some(source), |_, _| calls += 1, Some(&token))
        .await
        .unwrap();

    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert_eq!(calls, 0);
    assert_eq!(counters.reads(), 0);
    assert_eq!(counters.releases(), 1);
}

#[tokio::test]
async fn cancel_after_n_frames_stops_at_n() {
    let (source, counters) = ScriptedSource::from_chunks(&[
        b"event: n\ndata: 1\n",
        b"event: n\ndata: 2\n",
        b"event: n\ndata: 3\nevent: n\ndata: 4",
        b"\nevent: n\ndata: 5\n",
    ]);
    let token = CancellationToken::new();
    let handler_token = token.clone();

    let mut seen = Vec::new();
    let outcome = consume(
        Some(source),
        |_, data| {
            seen.push(data);
            if seen.len() == 2 {
                handler_token.cancel();
            }
        },
        Some(&token),
    )
    .await
    .unwrap();

    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert_eq!(seen, vec![json!(1), json!(2)]);
    assert_eq!(counters.reads(), 2);
    assert_eq!(counters.releases(), 1);
}

#[tokio::test]
async fn cancel_during_pending_read_releases_source() {
    let (source, counters) = ScriptedSource::new(vec![
        Step::Chunk(Bytes::from_static(b"event: n\ndata: 1\nevent: n\ndata: ")),
        Step::Hang,
    ]);
    let token = CancellationToken::new();

    let task = {
        let token = token.clone();
        tokio::spawn(async move {
            let mut seen = Vec::new();
            let outcome = consume(Some(source), |_, data| seen.push(data), Some(&token)).await;
            (outcome, seen)
        })
    };

    while counters.reads() < 2 {
        tokio::task::yield_now().await;
    }
    token.cancel();

    let (outcome, seen) = task.await.unwrap();
    assert_eq!(outcome.unwrap(), StreamOutcome::Cancelled);
    assert_eq!(seen, vec![json!(1)]);
    assert_eq!(counters.releases(), 1);
}

#[tokio::test]
async fn concurrent_streams_do_not_interfere() {
    let (a, _) = ScriptedSource::from_chunks(&[b"event: a\n", b"data: 1\n"]);
    let (b, _) = ScriptedSource::from_chunks(&[b"data: 2\n", b"event: b\ndata: 3\n"]);

    let mut from_a = Vec::new();
    let mut from_b = Vec::new();
    let (ra, rb) = tokio::join!(
        consume(Some(a), |n, d| from_a.push((n.to_owned(), d)), None),
        consume(Some(b), |n, d| from_b.push((n.to_owned(), d)), None),
    );
    ra.unwrap();
    rb.unwrap();

    assert_eq!(from_a, vec![("a".to_owned(), json!(1))]);
    assert_eq!(from_b, vec![("b".to_owned(), json!(3))]);
}

#[tokio::test]
async fn panicking_handler_still_releases_source() {
    let (source, counters) = ScriptedSource::from_chunks(&[b"event: n\ndata: 1\n", b"event: n\ndata: 2\n"]);

    let joined = tokio::spawn(async move {
        consume(Some(source), |_, _| panic!("handler failed"), None).await
    })
    .await;

    assert!(joined.unwrap_err().is_panic());
    assert_eq!(counters.reads(), 1);
    assert_eq!(counters.releases(), 1);
}

#[tokio::test]
async fn dropped_consume_future_releases_source() {
    let (source, counters) = ScriptedSource::new(vec![
        Step::Chunk(Bytes::from_static(b"event: n\ndata: 1\n")),
        Step::Hang,
    ]);

    let mut seen = Vec::new();
    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        consume(Some(source), |_, data| seen.push(data), None),
    )
    .await;

    assert!(timed_out.is_err());
    assert_eq!(seen, vec![json!(1)]);
    assert_eq!(counters.reads(), 2);
    assert_eq!(counters.releases(), 1);
}
