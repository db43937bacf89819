#![forbid(unsafe_code)]
//! HTTP server for the star registry

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use starregistry::api::{run_api_server, Node};
use starregistry::blockchain::Blockchain;
use starregistry::clock::SystemClock;
use starregistry::config::{load_config_from, DEFAULT_CONFIG_PATH};
use starregistry::crypto::Secp256k1Verifier;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Overrides server.api_port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    tracing_subscriber::fmt::init();

    let mut config = load_config_from(&cli.config)?;
    if let Some(port) = cli.port {
        config.server.api_port = port;
    }

    // The chain is rebuilt from genesis on every start.
    let blockchain = Blockchain::with_settings(
        Arc::new(Secp256k1Verifier::new()),
        Arc::new(SystemClock),
        config.registry.clone(),
    )?;
    info!(
        window_secs = config.registry.challenge_window_secs,
        "star registry ready"
    );

    let node = Arc::new(Node::new(blockchain));
    run_api_server(node, &config.server).await
}
