mod config;
mod error;
mod models;
mod routes;
mod storage;
mod upload;

use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use clap::Parser;
use tokio::{fs, net::TcpListener};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Args, Config};

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

/// Serves `app` on every interface until Ctrl-C.
async fn run(app: Router, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    config::load_profile(&args.profile);
    let config = Config::from_env()?.with_args(&args);

    fs::create_dir_all(&config.audio_dir).await?;
    fs::create_dir_all(&config.cover_dir).await?;

    info!(
        mode = ?config.mode,
        audio_dir = %config.audio_dir.display(),
        cover_dir = %config.cover_dir.display(),
        "configuration loaded"
    );

    let port = config.port;
    run(routes::app(Arc::new(config)), port).await
}
