// NetBank - Web Server
// REST API over the ledger with Axum

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use netbank::{http, Ledger, Target};

/// NetBank API server
#[derive(Parser, Debug)]
#[command(name = "netbank-server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Database file (overrides NETBANK_DB and the NETBANK_ENV target)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Milliseconds to wait for another writer's lock (default 5000)
    #[arg(long)]
    busy_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    netbank::init_tracing();

    let args = Args::parse();
    let target = Target::from_env();
    let busy_timeout = args.busy_timeout_ms.map(Duration::from_millis);
    let config = target.resolve(args.db, busy_timeout);

    tracing::info!("NetBank Server v{}", netbank::VERSION);
    tracing::info!(env = target.as_str(), database = %config.describe(), "opening ledger");

    let ledger = Arc::new(Ledger::open(config).context("Failed to open ledger")?);
    let app = http::router(ledger);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", args.listen))?;

    tracing::info!("Server running on http://{}", args.listen);

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
