use std::sync::Arc;

use dealflow_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, RedisStore, StoreWriterHandle},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    // Investor data lives in Redis when configured, otherwise in process memory
    let (state, writer_handle): (AppState, Option<StoreWriterHandle>) = match &config.redis_url {
        Some(url) => {
            let client = create_redis_client(url)?;
            let (store, handle) = RedisStore::new(client);
            tracing::info!("Using Redis store");
            (AppState::new(Arc::new(store)), Some(handle))
        }
        None => {
            tracing::warn!("REDIS_URL not set, investor data will not survive restarts");
            (AppState::in_memory(), None)
        }
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = writer_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
