//! Key-value store abstraction
//!
//! Everything the service persists lives in flat `key -> string` pairs.
//! [`KvStore`] is the seam between the alert model and the backend, so the
//! model can run against Redis in production and [`super::MemoryStore`] in
//! tests.

use async_trait::async_trait;
use regex::Regex;

/// Flat string key-value store
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a single key
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Read several keys at once. The result is positionally aligned with `keys`.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    /// Write a single key
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write several keys as one atomic batch
    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), StoreError>;

    /// List keys matching a glob pattern (`*`, `?` and `\` escapes)
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError>;
}

/// Escape glob metacharacters so `literal` only matches itself inside a pattern.
pub fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Compile a store glob pattern into an anchored regex.
///
/// Supports `*`, `?` and backslash escapes. Character classes are not
/// needed by any caller and are rejected.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, StoreError> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            '\\' => {
                let literal = chars
                    .next()
                    .ok_or_else(|| StoreError::InvalidPattern(pattern.to_string()))?;
                source.push_str(&regex::escape(&literal.to_string()));
            }
            '[' | ']' => return Err(StoreError::InvalidPattern(pattern.to_string())),
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }

    source.push('$');
    Regex::new(&source).map_err(|_| StoreError::InvalidPattern(pattern.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid key pattern '{0}'")]
    InvalidPattern(String),
}
