//! One-shot commands. Each prints the host's response as JSON unless the
//! command has a plain-text form.

use anyhow::Context as _;
use pl_client::{
    AskAiRequest, Attachment, DocContent, DocCreateOptions, LaunchParams, LlmRequestOptions, SessionAskAiRequest,
};
use serde_json::Value;

use super::{build_client, print_json, read_attachments, stream, Command, Context, DocsCommand, LlmArgs};

pub async fn run(ctx: Context, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Session { token, launch_url } => session(&ctx, token, launch_url).await,
        Command::Ask {
            prompt,
            firm_id,
            matter_id,
            load_matter_facts,
        } => {
            let client = ctx.client()?;
            let load_matter_facts = load_matter_facts.then_some(true);
            let resp = match (firm_id, matter_id) {
                (Some(firm_id), Some(matter_id)) => {
                    client
                        .ask_ai(&AskAiRequest {
                            prompt,
                            firm_id,
                            matter_id,
                            load_matter_facts,
                        })
                        .await?
                }
                _ => {
                    client
                        .ask_ai_with_session(
                            ctx.session_token()?,
                            &SessionAskAiRequest {
                                prompt,
                                load_matter_facts,
                            },
                        )
                        .await?
                }
            };
            print_json(&resp)
        }
        Command::Llm(args) => llm(&ctx, args).await,
        Command::Ocr {
            files,
            stream: streaming,
            json,
        } => {
            let client = ctx.client()?;
            let token = ctx.session_token()?;
            let files = read_attachments(&files).await?;
            if streaming {
                return stream::ocr(&client, token, &files).await;
            }
            let resp = client.extract_text(token, &files).await?;
            if json {
                print_json(&resp)
            } else {
                println!("{}", resp.combined_text());
                Ok(())
            }
        }
        Command::Upload { files } => {
            let client = ctx.client()?;
            let files = read_attachments(&files).await?;
            print_json(&client.upload_files(ctx.session_token()?, &files).await?)
        }
        Command::Markdown { files } => {
            let client = ctx.client()?;
            let files = read_attachments(&files).await?;
            print_json(&client.convert_to_markdown(ctx.session_token()?, &files).await?)
        }
        Command::Docs(cmd) => docs(&ctx, cmd).await,
        Command::Submit { result } => {
            let client = ctx.client()?;
            let resp = client
                .submit_result(ctx.session_token()?, parse_result(&result))
                .await?;
            print_json(&resp)
        }
        // Handled in main before a client is needed.
        Command::Config(_) => Ok(()),
    }
}

async fn session(ctx: &Context, token: Option<String>, launch_url: Option<String>) -> anyhow::Result<()> {
    let (client, token) = match launch_url {
        Some(url) => {
            let params = LaunchParams::from_url(&url)?;
            let client = build_client(&params.client_config(&ctx.config.client))?;
            (client, token.or(params.token))
        }
        None => (ctx.client()?, token),
    };
    let token = token.context("an exchange token is required (argument or ?token= in --launch-url)")?;

    let resp = client.exchange_token(&token).await?;
    tracing::debug!(firm_id = %resp.firm_id, matter_id = %resp.matter_id, "token exchanged");
    print_json(&resp)
}

async fn llm(ctx: &Context, args: LlmArgs) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let token = ctx.session_token()?;
    let attachments = read_attachments(&args.attachments).await?;
    let options = LlmRequestOptions {
        system_instructions: args.system_instructions,
        provider: args.provider,
        model: args.model,
        temperature: args.temperature,
        max_tokens: args.max_tokens,
    };

    if args.stream {
        return stream::llm(&client, token, &args.prompt, &options, &attachments).await;
    }

    let resp = client.ask_llm(token, &args.prompt, &options, &attachments).await?;
    if args.json {
        print_json(&resp)
    } else {
        println!("{}", resp.data.text);
        Ok(())
    }
}

async fn docs(ctx: &Context, cmd: DocsCommand) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let token = ctx.session_token()?;

    match cmd {
        DocsCommand::List => print_json(&client.list_docs(token).await?),
        DocsCommand::Get { id } => print_json(&client.get_doc(token, &id).await?),
        DocsCommand::Create {
            markdown,
            markdown_file,
            filename,
            format,
        } => {
            let markdown = match (markdown, markdown_file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => anyhow::bail!("--markdown or --markdown-file is required"),
            };
            let options = DocCreateOptions {
                markdown,
                filename,
                format,
            };
            print_json(&client.create_doc(token, &options).await?)
        }
        DocsCommand::Upload { files } => {
            let files = read_attachments(&files).await?;
            print_json(&client.upload_docs(token, &files).await?)
        }
        DocsCommand::Update { id, content, file } => {
            let content = match (content, file) {
                (Some(text), _) => DocContent::Text(text),
                (None, Some(path)) => DocContent::File(
                    Attachment::from_path(&path)
                        .await
                        .with_context(|| format!("reading {}", path.display()))?,
                ),
                (None, None) => anyhow::bail!("--content or --file is required"),
            };
            print_json(&client.update_doc(token, &id, content).await?)
        }
        DocsCommand::Delete { id } => {
            client.delete_doc(token, &id).await?;
            eprintln!("deleted {id}");
            Ok(())
        }
        DocsCommand::ToMarkdown { id } => {
            let resp = client.doc_to_markdown(token, &id).await?;
            println!("{}", resp.data.markdown);
            Ok(())
        }
    }
}

/// JSON objects are submitted as objects; everything else as the raw string.
fn parse_result(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => value,
        _ => Value::String(raw.to_owned()),
    }
}
