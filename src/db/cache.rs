use redis::AsyncCommands;
use redis::Client;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

use crate::error::StorageError;

/// Fingerprint of an AI request. Keys are taken verbatim: two prompts that differ
/// only in whitespace or case are different entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Composed mood or notes prompt
    Prompt(String),
    /// Content hash of an uploaded image
    Vibe(String),
    Similar { brand: String, name: String },
    Enhance(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Prompt(prompt) => write!(f, "prompt:{}", prompt),
            CacheKey::Vibe(hash) => write!(f, "vibe:{}", hash),
            CacheKey::Similar { brand, name } => write!(f, "similar:{}-{}", brand, name),
            CacheKey::Enhance(text) => write!(f, "enhance:{}", text),
        }
    }
}

/// Creates a Redis client for the shared cache backend
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
}

#[derive(Clone)]
enum Backend {
    Memory(Arc<RwLock<HashMap<String, String>>>),
    Redis {
        client: Client,
        write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
    },
}

/// Response cache for AI calls
///
/// Append-only and unbounded: entries never expire and are never invalidated.
/// Two identical requests racing before the first one completes both reach the
/// provider; the cache only short-circuits once a value has been stored.
#[derive(Clone)]
pub struct Cache {
    backend: Backend,
}

/// Handle for gracefully shutting down the Redis cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Sends the shutdown signal; the writer flushes pending writes before exiting.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Process-lifetime cache held in memory
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(RwLock::new(HashMap::new()))),
        }
    }

    /// Redis-backed cache with an async write background task
    ///
    /// Writes go through a channel to a spawned task so storing a response never
    /// delays the reply that produced it.
    pub async fn redis(client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let writer_client = client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(writer_client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            backend: Backend::Redis { client, write_tx },
        };

        (cache, CacheWriterHandle { shutdown_tx })
    }

    /// Background task that drains write messages into Redis
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing remaining writes");
                    write_rx.close();
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(
                                error = %e,
                                "Failed to flush cache write during shutdown"
                            );
                        }
                    }
                    tracing::info!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> Result<(), StorageError> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(msg.key, msg.value).await?;
        Ok(())
    }

    async fn read_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        match &self.backend {
            Backend::Memory(map) => {
                let map = map
                    .read()
                    .map_err(|_| StorageError::Unavailable("cache lock poisoned".to_string()))?;
                Ok(map.get(key).cloned())
            }
            Backend::Redis { client, .. } => {
                let mut conn = client.get_multiplexed_async_connection().await?;
                let cached: Option<String> = conn.get(key).await?;
                Ok(cached)
            }
        }
    }

    /// Retrieves a value from the cache by key
    ///
    /// Backend failures and undecodable entries are logged and reported as a miss.
    pub async fn get_from_cache<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let raw_key = key.to_string();
        let cached = match self.read_raw(&raw_key).await {
            Ok(cached) => cached?,
            Err(e) => {
                tracing::warn!(error = %e, key = %raw_key, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&cached) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    key = %raw_key,
                    "Cache entry undecodable, treating as miss"
                );
                None
            }
        }
    }

    /// Stores a value without waiting for the backend
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        match &self.backend {
            Backend::Memory(map) => match map.write() {
                Ok(mut map) => {
                    map.insert(key.to_string(), json);
                }
                Err(_) => tracing::error!("Cache lock poisoned, dropping write"),
            },
            Backend::Redis { write_tx, .. } => {
                let msg = CacheWriteMessage {
                    key: key.to_string(),
                    value: json,
                };
                if let Err(e) = write_tx.send(msg) {
                    tracing::error!(error = %e, "Failed to send cache write message");
                }
            }
        }
    }
}
