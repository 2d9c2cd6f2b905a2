pub mod cache;
pub mod sqlite;
pub mod store;

mod macros;

pub use cache::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use sqlite::{create_memory_pool, create_pool};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, Table};
