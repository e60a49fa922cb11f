//! tempalert server
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - TEMPALERT_HOST: Bind address (default: 0.0.0.0)
//! - TEMPALERT_PORT: Port number (default: 8080)
//! - TEMPALERT_TIMEZONE: Zone of stored timestamps (default: Europe/Paris)
//! - RUST_LOG: Log level (default: info)
//!
//! Store configuration (unset host selects the in-memory store):
//! - TEMPALERT_REDIS_HOST: Redis host
//! - TEMPALERT_REDIS_PORT: Redis port (default: 6380)
//! - TEMPALERT_REDIS_USERNAME / TEMPALERT_REDIS_PASSWORD: credentials
//! - TEMPALERT_REDIS_TLS: Use TLS (default: true)
//! - TEMPALERT_REDIS_INSECURE: Skip certificate verification (default: false)
//! - TEMPALERT_REDIS_DB: Database index (default: 0)

use tempalert::api::{run_server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tempalert=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    tracing::info!("tempalert {} configuration:", env!("CARGO_PKG_VERSION"));
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!("  Timezone: {}", config.timezone.name());
    tracing::info!("  Store: {}", config.store.describe());

    run_server(config).await
}
