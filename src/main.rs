use fitfighter::{
    build_router, AppConfig, AppState, EventHub, Store, StreamConfig, TokenConfig,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitfighter=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    info!(storage = ?config.storage, "Starting Fit Fighter server");

    let store = Store::from_config(&config.storage).await?;
    let hub = EventHub::new(config.subscriber_buffer);
    let token_config = TokenConfig::new(config.jwt_secret.clone(), config.token_expiration_days);
    let stream_config = StreamConfig {
        heartbeat_interval: config.heartbeat_interval,
    };

    let app = build_router(AppState::new(store, hub, token_config, stream_config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server running on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
