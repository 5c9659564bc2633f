mod cli;
mod commands;
mod terminal;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use orderstamp::config::{default_config_path, load_config, load_config_or_default};
use orderstamp::Config;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn load(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            let path = default_config_path()
                .ok_or_else(|| anyhow!("Could not determine the home directory"))?;
            Ok(load_config_or_default(&path)?)
        }
    }
}

/// `RUST_LOG` wins over the configured level. `log` records from the
/// database layer are forwarded into tracing.
fn init_tracing(log_level: &str) -> Result<()> {
    tracing_log::LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load(&cli)?;
    init_tracing(&config.log_level)?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting orderstamp");
    commands::run(cli.command, &config).await
}
