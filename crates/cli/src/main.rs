use clap::Parser;
use tracing_subscriber::EnvFilter;

use pl_cli::cli::{Cli, Command, ConfigCommand, Context};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        command,
        base_url,
        session_token,
    } = Cli::parse();

    init_cli_tracing();

    match command {
        Command::Config(ConfigCommand::Validate) => {
            let (config, config_path) = pl_cli::cli::load_config()?;
            let valid = pl_cli::cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            let (config, _config_path) = pl_cli::cli::load_config()?;
            pl_cli::cli::config::show(&config)
        }
        command => {
            let (config, _) = pl_cli::cli::load_config()?;
            let ctx = Context::new(config, base_url, session_token);
            pl_cli::cli::commands::run(ctx, command).await
        }
    }
}

/// Initialize compact stderr-only tracing.
///
/// Defaults to `warn` level so diagnostic output does not pollute stdout.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
