//! Toolgate - multi-server tool gateway CLI
//!
#![doc = "Main entry point for the Toolgate CLI."]

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use toolgate::cli::{Cli, Commands};
use toolgate::commands;
use toolgate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Login => {
            tracing::info!("Starting authorization flow");
            commands::login::run_login(config).await?;
            Ok(())
        }
        Commands::Ask { question } => {
            tracing::info!("Answering one-shot question");
            commands::ask::run_ask(config, question).await?;
            Ok(())
        }
        Commands::Chat => {
            tracing::info!("Starting interactive chat mode");
            commands::chat::run_chat(config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "toolgate=debug"
    } else {
        "toolgate=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
