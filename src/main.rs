use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fragranceverse_api::{
    api::{create_router, AppState, Collaborators},
    config::Config,
    db::{
        create_memory_pool, create_pool, create_redis_client, Cache, CacheWriterHandle,
        KeyValueStore, MemoryStore, SqliteStore, Table,
    },
    services::{
        providers::{CredentialStore, GeminiProvider},
        HttpImageProbe,
    },
};

/// Opens the durable store, falling back to an in-memory database and then to
/// plain maps. The app keeps working either way.
async fn open_stores(database_url: &str) -> (Arc<dyn KeyValueStore>, Arc<dyn KeyValueStore>) {
    let pool = match create_pool(database_url).await {
        Ok(pool) => Some(pool),
        Err(e) => {
            tracing::error!(error = %e, "Failed to open database, using in-memory SQLite");
            create_memory_pool()
                .await
                .map_err(|e| tracing::error!(error = %e, "In-memory SQLite unavailable"))
                .ok()
        }
    };

    let (images, session): (Arc<dyn KeyValueStore>, Arc<dyn KeyValueStore>) = match pool {
        Some(pool) => (
            Arc::new(SqliteStore::new(pool.clone(), Table::GeneratedImages)),
            Arc::new(SqliteStore::new(pool, Table::SessionValues)),
        ),
        None => (Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new())),
    };
    (images, session)
}

async fn open_cache(redis_url: Option<&str>) -> (Cache, Option<CacheWriterHandle>) {
    let Some(url) = redis_url else {
        return (Cache::in_memory(), None);
    };
    match create_redis_client(url) {
        Ok(client) => {
            let (cache, handle) = Cache::redis(client).await;
            tracing::info!("Response cache backed by Redis");
            (cache, Some(handle))
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid REDIS_URL, keeping the response cache in memory");
            (Cache::in_memory(), None)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fragranceverse_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    if config.api_key.is_none() {
        tracing::warn!("API_KEY is not set; AI features stay unavailable until a key is supplied");
    }

    let credentials = CredentialStore::new(config.api_key.clone());
    let provider = GeminiProvider::new(
        &config.gemini_api_url,
        credentials.clone(),
        Duration::from_secs(config.provider_timeout_secs),
    );
    let (image_store, session_store) = open_stores(&config.database_url).await;
    let (cache, cache_writer) = open_cache(config.redis_url.as_deref()).await;

    let state = AppState::new(
        &config,
        Collaborators {
            model: Arc::new(provider),
            credentials,
            cache,
            image_probe: Arc::new(HttpImageProbe::new(Duration::from_secs(
                config.image_probe_timeout_secs,
            ))),
            image_store,
            session_store,
        },
    )
    .await?;

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}
