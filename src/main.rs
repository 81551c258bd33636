use anyhow::Result;
use clap::Parser;
use log::{error, info};
use obsvc::api;
use obsvc::collector::CollectorStore;
use obsvc::config::load_config;
use obsvc::error::ObsError;
use obsvc::util::logging;
use std::path::PathBuf;
use tokio::net::TcpListener;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "obsvc", version, about = "Periodic collector registry with a status API")]
struct Args {
    /// Path to the configuration file (TOML, JSON or YAML)
    #[arg(short, long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args.config)?;
    logging::init(config.log_level);

    info!("obsvc {} starting", obsvc::VERSION);

    let store = CollectorStore::new();
    let app = api::router(store.clone(), &[]);

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .map_err(ObsError::from)?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ObsError::Server(e.to_string()))?;

    store.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        // without a signal handler, run until killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
