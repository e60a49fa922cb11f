use axum::{routing::get, Router};
use chrono_tz::Tz;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{device_config, health_check, list_devices, save_device_config, AppState};
use crate::alerts::DEFAULT_TIMEZONE;
use crate::config::{parsed_or, string_or, ConfigError};
use crate::store::{self, StoreConfig};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Zone of stored and displayed timestamps
    pub timezone: Tz,
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timezone: DEFAULT_TIMEZONE,
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Build from environment variables
    ///
    /// TEMPALERT_HOST=0.0.0.0
    /// TEMPALERT_PORT=8080
    /// TEMPALERT_TIMEZONE=Europe/Paris
    /// plus the TEMPALERT_REDIS_* settings read by [`StoreConfig`]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let tz_name = string_or(&lookup, "TEMPALERT_TIMEZONE", DEFAULT_TIMEZONE.name());
        let timezone = tz_name
            .parse::<Tz>()
            .map_err(|e| ConfigError::Timezone(tz_name.clone(), e.to_string()))?;

        Ok(Self {
            host: string_or(&lookup, "TEMPALERT_HOST", &defaults.host),
            port: parsed_or(&lookup, "TEMPALERT_PORT", defaults.port)?,
            timezone,
            store: StoreConfig::from_lookup(&lookup)?,
        })
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Device list
        .route("/", get(list_devices))
        .route("/devices", get(list_devices))
        // Alert configuration
        .route(
            "/device/:device_id",
            get(device_config).post(save_device_config),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = store::open(&config.store).await?;
    let state = Arc::new(AppState::new(store, config.timezone));

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting tempalert server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("tempalert server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
