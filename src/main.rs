use std::net::SocketAddr;
use std::sync::Arc;

use metadata_mirror::{
    AppState, CliTransport, Config, MetadataHub, MetricsRegistry, PlatformClient, Result,
    create_router,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    setup_tracing();

    let config = Config::from_env();

    tracing::info!(
        "Upstream API via '{} curl' (timeout {:?}, {} attempts)",
        config.api.command,
        config.api.call_timeout,
        config.api.retry_attempts
    );
    tracing::info!(
        "Reloads: min interval {:?}, retry delay {:?}, max attempts {}, delete grace {:?}",
        config.cache.min_reload_interval,
        config.scheduler.retry_delay,
        config.scheduler.max_attempts,
        config.cache.delete_grace
    );

    let transport = Arc::new(CliTransport::new(
        config.api.command.clone(),
        config.api.call_timeout,
    ));
    let client = PlatformClient::new(transport, &config.api);
    let metrics = MetricsRegistry::new();
    let metadata = Arc::new(MetadataHub::new(
        Arc::new(client.clone()),
        &config.cache,
    ));

    // Graceful shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let scheduler = metadata.start_scheduler(
        metrics.clone(),
        &config.scheduler,
        shutdown_rx.clone(),
    );
    metadata.preload(&config.preload);

    let state = Arc::new(AppState {
        config: config.clone(),
        metrics,
        metadata,
        client,
    });
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr.parse().map_err(|e| {
        tracing::error!("Invalid server address: {}", e);
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind address: {}", e);
        e
    })?;

    tracing::info!("Metadata mirror starting on {}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  - GET  /health                       - Health check");
    tracing::info!("  - GET  /metrics                      - Prometheus metrics");
    tracing::info!("  - GET  /metadata/{{resource}}          - Cached entities");
    tracing::info!("  - GET  /metadata/{{resource}}/{{guid}}   - One entity");
    tracing::info!("  - POST /metadata/{{resource}}/reload   - Queue a reload");

    let mut server_shutdown = shutdown_rx.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.changed().await;
            tracing::info!("HTTP server shutting down");
        })
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            e
        })?;

    if let Err(e) = scheduler.await {
        tracing::error!("Reload scheduler task failed: {}", e);
    }

    Ok(())
}

fn setup_tracing() {
    // RUST_LOG wins; "info" otherwise
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
