//! Key-value persistence
//!
//! [`KvStore`] is implemented by [`RedisStore`] for deployments and by
//! [`MemoryStore`] for tests and local runs.

pub mod config;
pub mod kv;
pub mod memory;
pub mod redis_store;

use std::sync::Arc;

pub use config::{RedisConfig, StoreConfig};
pub use kv::{escape_glob, glob_to_regex, KvStore, StoreError};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Open the configured backend
pub async fn open(config: &StoreConfig) -> Result<Arc<dyn KvStore>, StoreError> {
    match config {
        StoreConfig::Memory => {
            tracing::warn!("No Redis host configured; using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreConfig::Redis(redis) => Ok(Arc::new(RedisStore::connect(redis).await?)),
    }
}
