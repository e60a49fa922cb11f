//! In-memory store
//!
//! Keys are kept in a sorted map, so scans return keys in lexical order.
//! Used by tests and when no Redis host is configured.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::kv::{glob_to_regex, KvStore, StoreError};

/// In-memory [`KvStore`] with failure injection
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        {
            let mut map = store.entries.write();
            for (key, value) in entries {
                map.insert(key.into(), value.into());
            }
        }
        store
    }

    /// Make every subsequent operation fail with [`StoreError::Unavailable`]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store is in failure mode".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        Ok(self.entries.read().get(key).cloned())
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        self.check_available()?;
        let entries = self.entries.read();
        Ok(keys.iter().map(|k| entries.get(k).cloned()).collect())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), StoreError> {
        self.check_available()?;
        let mut map = self.entries.write();
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        let re = glob_to_regex(pattern)?;
        Ok(self
            .entries
            .read()
            .keys()
            .filter(|k| re.is_match(k))
            .cloned()
            .collect())
    }
}
