//! Client SDK for the AI Paralegal host API.
//!
//! [`ParalegalClient`] covers token exchange, Ask-AI, result submission,
//! LLM generation, OCR, file upload, MarkItDown conversion and document
//! storage. The two streaming endpoints (`stream_llm`, `stream_ocr`) read
//! Server-Sent Events through `pl-sse` and deliver typed events to a
//! callback; both take an optional [`CancellationToken`].
//!
//! ```no_run
//! # async fn run() -> pl_domain::error::Result<()> {
//! use pl_client::{LlmRequestOptions, LlmStreamCollector, ParalegalClient};
//! use pl_domain::config::ClientConfig;
//!
//! let client = ParalegalClient::new(&ClientConfig::with_base_url("https://host.example.com"))?;
//! let session = client.start_session("exchange-token").await?;
//!
//! let mut collector = LlmStreamCollector::new();
//! client
//!     .stream_llm(
//!         &session.session_token,
//!         "Summarise the lease",
//!         &LlmRequestOptions::default(),
//!         &[],
//!         |event| collector.push(event),
//!         None,
//!     )
//!     .await?;
//! println!("{}", collector.into_result()?.data.text);
//! # Ok(())
//! # }
//! ```

mod ask;
mod attachment;
mod client;
mod docs;
mod files;
mod llm;
mod ocr;
mod result;
mod session;
mod stream;
pub mod types;

pub use attachment::Attachment;
pub use client::ParalegalClient;
pub use docs::DocContent;
pub use llm::{LlmStreamCollector, LlmStreamEvent};
pub use ocr::{OcrStreamCollector, OcrStreamEvent};
pub use pl_sse::{CancellationToken, StreamOutcome};
pub use session::{LaunchParams, SessionContext};
pub use types::*;
