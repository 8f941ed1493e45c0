//! Line-level frame state machine.
//!
//! ```text
//!                event: <name>
//!   AwaitingEvent ───────────────▶ HaveEvent(name)
//!        ▲   │ data: ...  (drop)       │ event: <other>  (rename)
//!        │   └──────┘                  │
//!        └─────────────────────────────┘
//!              data: ...  (emit or drop; name consumed)
//! ```

use serde_json::Value;

pub const EVENT_PREFIX: &str = "event: ";
pub const DATA_PREFIX: &str = "data: ";

/// Data payload marking a heartbeat or terminator. Never decoded.
pub const STREAM_SENTINEL: &str = "</stream>";

/// One named, decoded event.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub event: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FrameState {
    #[default]
    AwaitingEvent,
    HaveEvent(String),
}

/// Why a `data:` line produced no frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedFrame {
    /// No `event:` line since the last frame.
    MissingEvent,
    /// The payload was [`STREAM_SENTINEL`].
    Sentinel,
    /// The payload was not valid JSON.
    InvalidJson,
}

/// Result of feeding one line to the [`FrameParser`].
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Frame(Frame),
    /// An `event:` line set (or cleared) the pending event name.
    EventNamed,
    Dropped(MalformedFrame),
    /// Blank separators, comments, `id:`/`retry:` fields and anything else.
    Ignored,
}

#[derive(Debug, Default)]
pub struct FrameParser {
    state: FrameState,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    /// Feed one complete line (without its `\n`).
    ///
    /// An `event:` line overwrites any name that has not been consumed yet.
    /// A `data:` line always consumes the pending name, whether or not it
    /// yields a frame, so a second `data:` line under the same `event:` is
    /// dropped as [`MalformedFrame::MissingEvent`].
    pub fn feed_line(&mut self, line: &str) -> LineOutcome {
        if let Some(rest) = line.strip_prefix(EVENT_PREFIX) {
            let name = rest.trim();
            self.state = if name.is_empty() {
                FrameState::AwaitingEvent
            } else {
                FrameState::HaveEvent(name.to_owned())
            };
            return LineOutcome::EventNamed;
        }

        let Some(rest) = line.strip_prefix(DATA_PREFIX) else {
            return LineOutcome::Ignored;
        };

        let event = match std::mem::take(&mut self.state) {
            FrameState::AwaitingEvent => {
                return LineOutcome::Dropped(MalformedFrame::MissingEvent)
            }
            FrameState::HaveEvent(name) => name,
        };

        let payload = rest.trim();
        if payload == STREAM_SENTINEL {
            return LineOutcome::Dropped(MalformedFrame::Sentinel);
        }

        match serde_json::from_str(payload) {
            Ok(data) => LineOutcome::Frame(Frame { event, data }),
            Err(_) => LineOutcome::Dropped(MalformedFrame::InvalidJson),
        }
    }

    pub fn reset(&mut self) {
        self.state = FrameState::AwaitingEvent;
    }
}
