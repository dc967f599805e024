//! SuiteBridge Gateway Server
//!
//! Starts the HTTP surface fronting the ERP query gateway.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use suitebridge_coordinator::Coordinator;
use suitebridge_equity::EquityEngine;
use suitebridge_server::{AppState, build};

/// Waits for Ctrl+C or SIGTERM so in-flight requests drain before exit.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[derive(Parser, Debug)]
#[command(name = "suitebridge-server")]
#[command(about = "HTTP gateway fronting the ERP's SQL-over-REST endpoint", long_about = None)]
struct Args {
    /// Override the configured bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the configured bind port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = suitebridge_config::load()?;

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    info!("bootstrapping ERP lookups");
    let coordinator = Arc::new(Coordinator::bootstrap(&config).await);
    let equity = Arc::new(EquityEngine::new(Arc::clone(&coordinator), &config));

    let state = AppState {
        coordinator,
        equity,
        config: Arc::new(config),
    };

    let app = build(state);

    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}
