//! HTTP API server for sentio.

use clap::Parser;
use sentio::server::ChatServer;
use sentio::{ChatSession, SentioConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Sentio: emotion-aware chat companion API.
#[derive(Parser)]
#[command(name = "sentio-server", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port (0 picks a free one).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = SentioConfig::load_or_default(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let _log_guard = sentio::logging::init(&config.logging)?;
    info!("sentio-server v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        backend = config.classifier.backend.name(),
        model_dir = %config.classifier.model_dir.display(),
        "classifier configured"
    );

    let session = Arc::new(ChatSession::new(&config)?);
    let server = ChatServer::start(session, &config.server).await?;
    println!("Listening on http://{}  (Ctrl+C to stop)", server.addr());

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown();
    Ok(())
}
