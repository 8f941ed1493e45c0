//! Streaming commands: print deltas as they arrive, stop cleanly on Ctrl-C.

use std::io::Write;

use pl_client::{
    Attachment, CancellationToken, LlmRequestOptions, LlmStreamCollector, LlmStreamEvent,
    OcrStreamCollector, OcrStreamEvent, ParalegalClient, StreamOutcome,
};

/// A token that fires on the first SIGINT.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received SIGINT, cancelling stream");
            trigger.cancel();
        }
    });
    token
}

pub async fn llm(
    client: &ParalegalClient,
    session_token: &str,
    prompt: &str,
    options: &LlmRequestOptions,
    attachments: &[Attachment],
) -> anyhow::Result<()> {
    let cancel = cancel_on_ctrl_c();
    let mut collector = LlmStreamCollector::new();

    let outcome = client
        .stream_llm(
            session_token,
            prompt,
            options,
            attachments,
            |event| {
                if let LlmStreamEvent::TextDelta(delta) = &event {
                    print!("{delta}");
                    std::io::stdout().flush().ok();
                }
                collector.push(event);
            },
            Some(&cancel),
        )
        .await?;

    // Trailing newline after streamed deltas.
    println!();

    if outcome == StreamOutcome::Cancelled {
        eprintln!("stream cancelled");
    }
    if let Some(usage) = collector.response().and_then(|r| r.data.usage) {
        eprintln!(
            "\x1b[2m[{} prompt / {} completion tokens]\x1b[0m",
            usage.prompt_tokens, usage.completion_tokens
        );
    }
    if let Some(message) = collector.error() {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
    Ok(())
}

pub async fn ocr(
    client: &ParalegalClient,
    session_token: &str,
    files: &[Attachment],
) -> anyhow::Result<()> {
    let cancel = cancel_on_ctrl_c();
    let mut collector = OcrStreamCollector::new();
    let mut current: Option<String> = None;

    let outcome = client
        .stream_ocr(
            session_token,
            files,
            |event| {
                match &event {
                    OcrStreamEvent::TextDelta { filename, delta } => {
                        if current.as_deref() != Some(filename.as_str()) {
                            eprintln!("\x1b[2m== {filename} ==\x1b[0m");
                            current = Some(filename.clone());
                        }
                        print!("{delta}");
                        std::io::stdout().flush().ok();
                    }
                    OcrStreamEvent::FileComplete(extraction) => {
                        println!();
                        tracing::debug!(filename = %extraction.filename, "extraction complete");
                    }
                    OcrStreamEvent::Complete(_) | OcrStreamEvent::Error(_) => {}
                }
                collector.push(event);
            },
            Some(&cancel),
        )
        .await?;

    if outcome == StreamOutcome::Cancelled {
        println!();
        eprintln!("stream cancelled");
    }
    if let Some(message) = collector.error() {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
    Ok(())
}
