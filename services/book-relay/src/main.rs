//! Relay entry point
//!
//! Wires the pieces together: config from the environment, one upstream
//! feed task owning the book, one hub, and the axum server for
//! downstream subscribers.

use std::sync::Arc;

use book_relay::book::BookState;
use book_relay::config::RelayConfig;
use book_relay::hub::BroadcastHub;
use book_relay::metrics::RelayMetrics;
use book_relay::server::{create_router, AppState};
use book_relay::upstream::UpstreamFeed;
use book_relay::SERVICE_VERSION;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    let config = RelayConfig::from_env()?;
    info!(
        "Starting book relay v{} (upstream: {}, product: {})",
        SERVICE_VERSION, config.upstream_url, config.product_id
    );

    let metrics = Arc::new(RelayMetrics::new());
    // Subscribers that attach before the first upstream frame get an
    // empty book rather than nothing.
    let initial = serde_json::to_string(&BookState::new().snapshot())?;
    let hub = Arc::new(BroadcastHub::new(
        config.queue_capacity,
        config.drop_policy,
        initial,
        metrics.clone(),
    ));

    let feed = UpstreamFeed::new(config.clone(), hub.clone(), metrics.clone());
    let upstream = tokio::spawn(feed.run());

    let app = create_router(AppState { hub, metrics });
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("Relay listening on {}", config.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    upstream.abort();
    info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
