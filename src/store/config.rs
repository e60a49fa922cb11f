//! Store backend configuration

use std::fmt;

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};

use crate::config::{flag_or, non_empty, parsed_or, ConfigError};

pub const DEFAULT_REDIS_PORT: u16 = 6380;

/// Which backend the service persists to
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// Process-local map, lost on restart
    Memory,
    Redis(RedisConfig),
}

impl StoreConfig {
    /// Build from environment variables
    ///
    /// TEMPALERT_REDIS_HOST=cache.example.net (unset selects the memory store)
    /// TEMPALERT_REDIS_PORT=6380
    /// TEMPALERT_REDIS_USERNAME=default
    /// TEMPALERT_REDIS_PASSWORD=secret
    /// TEMPALERT_REDIS_TLS=true
    /// TEMPALERT_REDIS_INSECURE=false
    /// TEMPALERT_REDIS_DB=0
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(host) = non_empty(&lookup, "TEMPALERT_REDIS_HOST") else {
            return Ok(StoreConfig::Memory);
        };

        Ok(StoreConfig::Redis(RedisConfig {
            host,
            port: parsed_or(&lookup, "TEMPALERT_REDIS_PORT", DEFAULT_REDIS_PORT)?,
            username: non_empty(&lookup, "TEMPALERT_REDIS_USERNAME"),
            password: non_empty(&lookup, "TEMPALERT_REDIS_PASSWORD"),
            tls: flag_or(&lookup, "TEMPALERT_REDIS_TLS", true)?,
            insecure: flag_or(&lookup, "TEMPALERT_REDIS_INSECURE", false)?,
            db: parsed_or(&lookup, "TEMPALERT_REDIS_DB", 0i64)?,
        }))
    }

    pub fn describe(&self) -> String {
        match self {
            StoreConfig::Memory => "in-memory".to_string(),
            StoreConfig::Redis(redis) => redis.to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory
    }
}

/// Connection parameters for a Redis server
#[derive(Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
    /// Skip certificate verification
    pub insecure: bool,
    pub db: i64,
}

impl RedisConfig {
    pub fn connection_info(&self) -> ConnectionInfo {
        let addr = if self.tls {
            ConnectionAddr::TcpTls {
                host: self.host.clone(),
                port: self.port,
                insecure: self.insecure,
                tls_params: None,
            }
        } else {
            ConnectionAddr::Tcp(self.host.clone(), self.port)
        };

        ConnectionInfo {
            addr,
            redis: RedisConnectionInfo {
                db: self.db,
                username: self.username.clone(),
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }
}

// Never print the password.
impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("tls", &self.tls)
            .field("insecure", &self.insecure)
            .field("db", &self.db)
            .finish()
    }
}

impl fmt::Display for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.tls { "rediss" } else { "redis" };
        let auth = if self.password.is_some() { " (password auth)" } else { "" };
        write!(f, "{}://{}:{}/{}{}", scheme, self.host, self.port, self.db, auth)
    }
}
