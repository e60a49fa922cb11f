use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Form, Json,
};
use chrono_tz::Tz;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::alerts::{
    AlertError, AlertForm, AlertService, AlertView, Clock, Device, DeviceRegistry,
};
use crate::store::KvStore;

/// Flash message shown after a successful save
pub const SAVED_MESSAGE: &str = "Data have been successfully recorded";

/// Application state shared across handlers
pub struct AppState {
    pub registry: DeviceRegistry,
    pub alerts: AlertService,
}

impl AppState {
    pub fn new(store: Arc<dyn KvStore>, timezone: Tz) -> Self {
        Self {
            registry: DeviceRegistry::new(Arc::clone(&store)),
            alerts: AlertService::new(store, timezone),
        }
    }

    pub fn with_clock(store: Arc<dyn KvStore>, timezone: Tz, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: DeviceRegistry::new(Arc::clone(&store)),
            alerts: AlertService::with_clock(store, timezone, clock),
        }
    }
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Devices
// ============================================================================

#[derive(Serialize)]
pub struct DevicesResponse {
    pub version: &'static str,
    pub devices: Vec<Device>,
}

pub async fn list_devices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DevicesResponse>, ApiError> {
    let devices = state.registry.list_devices().await?;

    Ok(Json(DevicesResponse {
        version: env!("CARGO_PKG_VERSION"),
        devices,
    }))
}

// ============================================================================
// Device Alert Configuration
// ============================================================================

#[derive(Deserialize)]
pub struct DeviceQuery {
    #[serde(default)]
    pub saved: Option<String>,
}

#[derive(Serialize)]
pub struct DeviceResponse {
    pub version: &'static str,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<&'static str>,
    pub alert: AlertView,
}

pub async fn device_config(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    Query(query): Query<DeviceQuery>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let record = state.alerts.load(&device_id).await?;

    Ok(Json(DeviceResponse {
        version: env!("CARGO_PKG_VERSION"),
        flash: query.saved.map(|_| SAVED_MESSAGE),
        alert: record.view(),
        device_id,
    }))
}

/// Save a submitted form, then redirect back to the device (303 See Other)
pub async fn save_device_config(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Redirect, ApiError> {
    let form: AlertForm = fields.into_iter().collect();
    state.alerts.submit(&device_id, &form).await?;

    Ok(Redirect::to(&format!("{}?saved=1", device_uri(&device_id))))
}

/// Path of a device page. Ids are opaque, so every non-alphanumeric byte is escaped.
pub fn device_uri(device_id: &str) -> String {
    format!("/device/{}", utf8_percent_encode(device_id, NON_ALPHANUMERIC))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

impl From<AlertError> for ApiError {
    fn from(err: AlertError) -> Self {
        match err {
            AlertError::NotFound(_) => ApiError::NotFound(err.to_string()),
            AlertError::Validation { .. } => ApiError::BadRequest(err.to_string()),
            AlertError::InvalidTimestamp { .. } => {
                tracing::error!("Stored alert data is corrupt: {}", err);
                ApiError::Internal(err.to_string())
            }
            AlertError::Store(_) => {
                tracing::error!("Store request failed: {}", err);
                ApiError::Unavailable(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
