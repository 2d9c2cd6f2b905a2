use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StorageError;

/// String key to string value store with async access
///
/// A miss is `Ok(None)`, never an error.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Tables created by the migrations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    /// Generated bottle artwork as data URLs
    GeneratedImages,
    /// Small per-session values such as the recently viewed list
    SessionValues,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::GeneratedImages => "generated_images",
            Table::SessionValues => "session_values",
        }
    }
}

/// One table of the on-device SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    table: Table,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, table: Table) -> Self {
        Self { pool, table }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let sql = format!("SELECT value FROM {} WHERE key = ?", self.table.name());
        let value = sqlx::query_scalar::<_, String>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let sql = format!(
            "INSERT INTO {} (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            self.table.name()
        );
        sqlx::query(&sql)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let sql = format!("DELETE FROM {} WHERE key = ?", self.table.name());
        sqlx::query(&sql).bind(key).execute(&self.pool).await?;
        Ok(())
    }
}

/// In-process fallback used when the database cannot be opened
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StorageError {
    StorageError::Unavailable("memory store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}
