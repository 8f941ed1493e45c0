pub mod commands;
pub mod config;
pub mod stream;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use pl_client::{Attachment, ParalegalClient};
use pl_domain::config::{ClientConfig, Config, ConfigSeverity};

/// paralegal: command-line client for the AI Paralegal host SDK API.
#[derive(Debug, Parser)]
#[command(name = "paralegal", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Host origin; overrides the config file and PARALEGAL_BASE_URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Session token for session-authenticated commands.
    #[arg(long, global = true, env = "PARALEGAL_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Exchange a launch token for a session and print it as JSON.
    Session {
        /// One-time exchange token issued by the host.
        token: Option<String>,
        /// Full launch URL (`?token=…&baseUrl=…&apiKey=…`) instead of a bare token.
        #[arg(long)]
        launch_url: Option<String>,
    },
    /// Ask the firm's AI a question about a matter.
    Ask {
        prompt: String,
        /// Use API-key auth for this firm instead of the session.
        #[arg(long, requires = "matter_id")]
        firm_id: Option<String>,
        #[arg(long, requires = "firm_id")]
        matter_id: Option<String>,
        /// Include stored matter facts in the context.
        #[arg(long)]
        load_matter_facts: bool,
    },
    /// Generate text with the host's LLM gateway.
    Llm(LlmArgs),
    /// Extract text from documents and images.
    Ocr {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print text as it is extracted.
        #[arg(long)]
        stream: bool,
        /// Print the full response as JSON instead of plain text.
        #[arg(long, conflicts_with = "stream")]
        json: bool,
    },
    /// Upload files to the host for this session.
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert files to Markdown.
    Markdown {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Document storage.
    #[command(subcommand)]
    Docs(DocsCommand),
    /// Submit the app's result. JSON objects are sent as objects, anything
    /// else as a string.
    Submit { result: String },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct LlmArgs {
    pub prompt: String,
    #[arg(long = "system")]
    pub system_instructions: Option<String>,
    /// Provider id, e.g. "openai" or "anthropic".
    #[arg(long)]
    pub provider: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub temperature: Option<f64>,
    #[arg(long)]
    pub max_tokens: Option<u32>,
    /// Attach a file (repeatable). Switches the request to multipart.
    #[arg(long = "attach")]
    pub attachments: Vec<PathBuf>,
    /// Print tokens as they are generated.
    #[arg(long)]
    pub stream: bool,
    #[arg(long, conflicts_with = "stream")]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum DocsCommand {
    /// List stored documents.
    List,
    /// Show one document with its content.
    Get { id: String },
    /// Create a document from Markdown.
    Create {
        #[arg(long, required_unless_present = "markdown_file", conflicts_with = "markdown_file")]
        markdown: Option<String>,
        #[arg(long)]
        markdown_file: Option<PathBuf>,
        #[arg(long)]
        filename: Option<String>,
        /// Output format, e.g. "docx".
        #[arg(long)]
        format: Option<String>,
    },
    /// Upload existing documents.
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Replace a document's text or file.
    Update {
        id: String,
        #[arg(long, required_unless_present = "file", conflicts_with = "file")]
        content: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Delete a document.
    Delete { id: String },
    /// Print a document converted to Markdown.
    ToMarkdown { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `PARALEGAL_CONFIG` (or
/// `paralegal.toml` by default), then apply environment overrides.
/// Returns the parsed [`Config`] and the path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path =
        std::env::var("PARALEGAL_CONFIG").unwrap_or_else(|_| "paralegal.toml".into());
    let mut config = load_config_from(&config_path)?;
    config.apply_env_overrides();
    Ok((config, config_path))
}

/// Parse `path` as TOML; a missing file yields defaults.
pub fn load_config_from(path: &str) -> anyhow::Result<Config> {
    if !Path::new(path).exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading {path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {path}: {e}"))
}

/// Validate `cfg` and build a client. Warnings are logged, errors abort.
pub fn build_client(cfg: &ClientConfig) -> anyhow::Result<ParalegalClient> {
    let issues = Config { client: cfg.clone() }.validate();
    for issue in &issues {
        if issue.severity == ConfigSeverity::Warning {
            tracing::warn!(field = %issue.field, "{}", issue.message);
        }
    }
    if let Some(err) = issues.iter().find(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!("invalid configuration: {err}");
    }
    Ok(ParalegalClient::new(cfg)?)
}

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub config: Config,
    pub session_token: Option<String>,
}

impl Context {
    pub fn new(mut config: Config, base_url: Option<String>, session_token: Option<String>) -> Self {
        if let Some(url) = base_url {
            config.client.base_url = url;
        }
        Self {
            config,
            session_token: session_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn client(&self) -> anyhow::Result<ParalegalClient> {
        build_client(&self.config.client)
    }

    pub fn session_token(&self) -> anyhow::Result<&str> {
        self.session_token
            .as_deref()
            .context("a session token is required (--session-token or PARALEGAL_SESSION_TOKEN)")
    }
}

pub async fn read_attachments(paths: &[PathBuf]) -> anyhow::Result<Vec<Attachment>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = Attachment::from_path(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| anyhow::anyhow!("serializing response: {e}"))?;
    println!("{json}");
    Ok(())
}
