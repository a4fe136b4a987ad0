//! txrisk server
//!
//! Starts the HTTP API for transaction risk analysis.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use txrisk_api::{config::ServiceConfig, init_tracing, start_server};

/// Transaction sanctions-risk analysis server
#[derive(Debug, Parser)]
#[command(name = "txrisk-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "TXRISK_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address as host:port, overriding the file
    #[arg(short, long, env = "TXRISK_BIND")]
    bind: Option<String>,

    /// SQLite database path, overriding the file
    #[arg(short, long, env = "TXRISK_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    run(Cli::parse()).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.config.is_none() {
        tracing::warn!("No config file given, using defaults and environment credentials");
    }

    let mut config = ServiceConfig::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("loading {}", path.display()),
        None => "loading default configuration".to_string(),
    })?;

    if let Some(bind) = &cli.bind {
        config.set_bind(bind)?;
    }
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    start_server(config).await?;
    Ok(())
}
