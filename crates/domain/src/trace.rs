use serde::Serialize;

/// Structured trace events emitted across all Paralegal SDK crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ApiCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
        attempt: u32,
    },
    StreamOpened {
        endpoint: String,
    },
    StreamFinished {
        endpoint: String,
        outcome: String,
        frames: usize,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "pl_event");
    }
}
