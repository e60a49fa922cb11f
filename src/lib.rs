//! tempalert: Device Temperature-Alert Configuration
//!
//! Lets an operator list monitored devices and edit each device's
//! temperature alert (threshold, polling frequency, enabled flag). All
//! state lives in a key-value store as flat `{device_id}_alert_{field}`
//! string pairs.
//!
//! # Features
//!
//! - **Device Discovery**: devices are found by scanning for name keys
//! - **Typed Records**: scattered keys become an [`AlertRecord`] with defaults
//! - **Stable Scheduling**: the next check only moves when the frequency changes
//! - **Atomic Updates**: a submission is validated first, then written in one batch
//! - **Pluggable Store**: Redis over TLS in production, in-memory for tests
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tempalert::alerts::{AlertForm, AlertService, DEFAULT_TIMEZONE};
//! use tempalert::store::MemoryStore;
//!
//! # async fn run() -> Result<(), tempalert::AlertError> {
//! let store = Arc::new(MemoryStore::with_entries([
//!     ("49671_alert_name", "Cold room"),
//!     ("49671_alert_frequency", "24"),
//! ]));
//! let alerts = AlertService::new(store, DEFAULT_TIMEZONE);
//!
//! let form = AlertForm::new()
//!     .with("alert_frequency", "48")
//!     .with("alert_enabled", "on");
//! alerts.submit("49671", &form).await?;
//!
//! let record = alerts.load("49671").await?;
//! println!("Next check: {:?}", record.next_check_at);
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod api;
pub mod config;
pub mod store;

// Re-export commonly used types
pub use alerts::{AlertError, AlertRecord, AlertService, Device, DeviceRegistry};
pub use store::{KvStore, MemoryStore, RedisStore, StoreError};
