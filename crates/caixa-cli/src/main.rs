//! Caixa CLI
//!
//! Command-line entry point for the Caixa bookkeeping server.

#![forbid(unsafe_code)]

use anyhow::Result;
use caixa_api::CaixaConfig;
use caixa_cli::cli::{Cli, Command};
use caixa_cli::{commands, config_handlers};
use clap::Parser;

const CONFIG_COMMAND_FILTER: &str = "warn";

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

fn load_config(path: Option<&str>) -> Result<CaixaConfig> {
    let config = CaixaConfig::load(path)?;
    init_tracing(&config.logging.filter);
    tracing::debug!(backend = ?config.store.backend, "configuration loaded");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Serve { bind } => {
            let config = load_config(config_path)?;
            commands::serve(config, bind).await?;
        }
        Command::Resolve { name } => {
            let config = load_config(config_path)?;
            commands::resolve(&config, &name).await?;
        }
        Command::Balance { name } => {
            let config = load_config(config_path)?;
            commands::balance(&config, &name).await?;
        }
        Command::Config { action } => {
            init_tracing(CONFIG_COMMAND_FILTER);
            config_handlers::handle_config_command(config_path, action)?;
        }
    }
    Ok(())
}
