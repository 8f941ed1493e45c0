//! Incremental event-stream consumer for the host's streaming endpoints.
//!
//! The host frames its streams as `event: <name>` / `data: <json>` line
//! pairs over a chunked HTTP body. [`consume`] reads a [`ByteSource`]
//! chunk by chunk, reassembles lines across chunk boundaries (including
//! multi-byte characters split between chunks), runs each line through a
//! two-state [`FrameParser`], and hands every well-formed frame to the
//! caller's handler in order.
//!
//! Frames that cannot be delivered (no preceding `event:` line, the
//! `</stream>` sentinel, payloads that are not JSON) are dropped silently so
//! a long-lived stream survives heartbeats and the occasional bad frame.
//! Only transport failures reach the caller.

mod buffer;
mod consume;
mod decoder;
mod frame;
mod source;

pub use buffer::LineBuffer;
pub use consume::{consume, StreamOutcome};
pub use decoder::Utf8Decoder;
pub use frame::{
    Frame, FrameParser, FrameState, LineOutcome, MalformedFrame, DATA_PREFIX, EVENT_PREFIX,
    STREAM_SENTINEL,
};
pub use source::{from_reqwest, ByteSource, ResponseSource, StreamSource};

pub use tokio_util::sync::CancellationToken;
