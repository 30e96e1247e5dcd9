use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tokio::net::TcpListener;

use herald::{Config, Raft};

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[derive(Parser)]
#[command(name = "herald")]
#[command(about = "Heartbeat-driven leader election among a fixed set of peers")]
struct Cli {
    /// Host this node is known by in the peer list
    #[arg(long)]
    host: Option<String>,

    /// Listening port
    #[arg(short, long)]
    port: Option<u16>,

    /// JSON configuration file (peers and timings)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma-separated list of peer addresses (host:port), replacing the configured registry
    #[arg(long)]
    peers: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(peers) = &cli.peers {
        config.set_peers(peers)?;
    }
    config.validate()?;

    let raft = Raft::new(config.to_raft_config())?;
    for peer in raft.registry().others() {
        info!("Registered peer: {peer}");
    }

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to listen on port {}", config.port))?;
    info!("Listening as {}", config.port);

    raft.start(listener).wait().await;
    Ok(())
}
