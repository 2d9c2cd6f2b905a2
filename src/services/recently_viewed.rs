use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{db::KeyValueStore, models::PerfumeKey};

const STORE_KEY: &str = "recentlyViewed";
const CAPACITY: usize = 8;

/// Most-recent-first list of viewed items, capped and de-duplicated by identity
///
/// Loaded once from the session store and written back on every view. Store
/// failures are logged; the in-memory list stays authoritative.
#[derive(Clone)]
pub struct RecentlyViewed {
    store: Arc<dyn KeyValueStore>,
    keys: Arc<RwLock<Vec<PerfumeKey>>>,
}

impl RecentlyViewed {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let keys = match store.get(STORE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<PerfumeKey>>(&raw) {
                Ok(mut keys) => {
                    keys.truncate(CAPACITY);
                    keys
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding corrupt recently viewed list");
                    if let Err(e) = store.remove(STORE_KEY).await {
                        tracing::error!(error = %e, "Failed to clear recently viewed list");
                    }
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read recently viewed list");
                Vec::new()
            }
        };

        Self {
            store,
            keys: Arc::new(RwLock::new(keys)),
        }
    }

    pub async fn record(&self, key: PerfumeKey) {
        let snapshot = {
            let mut keys = self.keys.write().await;
            keys.retain(|k| *k != key);
            keys.insert(0, key);
            keys.truncate(CAPACITY);
            keys.clone()
        };

        match serde_json::to_string(&snapshot) {
            Ok(raw) => {
                if let Err(e) = self.store.put(STORE_KEY, &raw).await {
                    tracing::error!(error = %e, "Failed to save recently viewed list");
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to encode recently viewed list"),
        }
    }

    pub async fn keys(&self) -> Vec<PerfumeKey> {
        self.keys.read().await.clone()
    }
}
