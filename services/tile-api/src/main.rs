//! NASA tile proxy server.

use anyhow::{anyhow, Result};
use axum::extract::Extension;
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use tile_api::config::ServiceConfig;
use tile_api::state::AppState;
use tile_api::sweeper::CacheSweeper;

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = ServiceConfig::parse();
    config.validate().map_err(|e| anyhow!(e))?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = config.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(config))
}

async fn async_main(config: ServiceConfig) -> Result<()> {
    // Initialize tracing
    let level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow!("Failed to install Prometheus recorder: {}", e))?;

    info!(
        app = %config.app_name,
        environment = %config.environment,
        "Starting tile proxy"
    );

    let addr = config.listen;
    let sweep_interval = config.cache_sweep_interval_secs;
    let state = Arc::new(AppState::new(config).await?);
    let broadcaster = state.tiles.broadcaster().clone();

    let sweeper = CacheSweeper::from_interval_secs(state.cache.clone(), sweep_interval)
        .map(|sweeper| tokio::spawn(sweeper.run_forever()));

    let app = tile_api::build_router(state.clone()).layer(Extension(prometheus_handle));

    info!(address = %addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped, releasing resources");
    if let Some(task) = sweeper {
        task.abort();
    }
    drop(state);
    match Arc::try_unwrap(broadcaster) {
        Ok(broadcaster) => broadcaster.shutdown(),
        Err(_) => warn!("Tile broadcaster still referenced at shutdown"),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
