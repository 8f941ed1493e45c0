use std::time::Instant;

use pl_domain::error::Result;
use pl_domain::trace::TraceEvent;
use pl_sse::{consume, CancellationToken, ResponseSource, StreamOutcome};
use serde_json::Value;

use crate::client::{ApiRequest, ParalegalClient};

impl ParalegalClient {
    /// Open an SSE endpoint and feed every well-formed frame to `on_frame`.
    ///
    /// Cancellation is honoured while the request is in flight as well as
    /// while the body is being read. Non-2xx responses fail before any frame
    /// is delivered.
    pub(crate) async fn run_stream<F>(
        &self,
        req: ApiRequest<'_>,
        mut on_frame: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<StreamOutcome>
    where
        F: FnMut(&str, Value),
    {
        let endpoint = req.endpoint();
        let start = Instant::now();

        let response = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!(endpoint = %endpoint, "stream cancelled before response");
                    return Ok(StreamOutcome::Cancelled);
                }
                resp = self.execute(&req) => resp?,
            },
            None => self.execute(&req).await?,
        };

        TraceEvent::StreamOpened {
            endpoint: endpoint.clone(),
        }
        .emit();

        let mut frames = 0usize;
        let result = consume(
            ResponseSource::from_response(response),
            |name, data| {
                frames += 1;
                on_frame(name, data);
            },
            cancel,
        )
        .await;

        TraceEvent::StreamFinished {
            endpoint,
            outcome: match &result {
                Ok(outcome) => outcome.as_str().to_owned(),
                Err(_) => "error".to_owned(),
            },
            frames,
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();

        result
    }
}
