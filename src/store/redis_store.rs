//! Redis-backed store
//!
//! Uses a [`ConnectionManager`], which is cheap to clone and reconnects on
//! its own. Each operation clones the handle, so concurrent requests never
//! wait on each other inside this type.

use std::collections::HashSet;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, AsyncIter};

use super::config::RedisConfig;
use super::kv::{KvStore, StoreError};

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect and authenticate. Fails if the server is unreachable.
    pub async fn connect(config: &RedisConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.connection_info())?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!(redis = %config, "Connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        // MGET with no arguments is a protocol error
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut cmd = redis::cmd("MGET");
        for key in keys {
            cmd.arg(key);
        }

        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = cmd.query_async(&mut conn).await?;
        Ok(values)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in entries {
            pipe.set(key, value).ignore();
        }

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut iter: AsyncIter<String> = conn.scan_match(pattern).await?;

        // SCAN may report a key more than once
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        while let Some(key) = iter.next_item().await {
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}
