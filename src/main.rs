use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use streamrec_api::{
    config::Config,
    db::{create_redis_client, Cache, InMemoryStore, KeyValueStore, RedisStore},
    routes::{create_router, AppState},
    services::providers::TmdbProvider,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => {
            let client = create_redis_client(url)?;
            let store = RedisStore::connect(client)
                .await
                .context("Failed to connect to Redis")?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("REDIS_URL not set, state will not survive a restart");
            Arc::new(InMemoryStore::new())
        }
    };
    tracing::info!(backend = store.name(), "Store ready");

    let (cache, cache_handle) = Cache::new(store.clone());
    let provider = Arc::new(TmdbProvider::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.metadata_cache_ttl,
    ));

    let bind_address = config.bind_address();
    let app = create_router(AppState::new(config, store, provider));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!(address = %bind_address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cache_handle.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
