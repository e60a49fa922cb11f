//! Device alert configuration
//!
//! Each device's alert settings are scattered over individual store keys
//! (see [`keys`]). This module discovers devices, assembles those keys into
//! an [`AlertRecord`], and turns form submissions back into key writes while
//! keeping the next-check schedule stable.

pub mod keys;
pub mod record;
pub mod registry;
pub mod schedule;
pub mod service;
pub mod update;

pub use keys::{AlertField, FieldKind, FieldValue, UNNAMED_DEVICE};
pub use record::{AlertRecord, AlertView, StoredAlert, UNAVAILABLE};
pub use registry::{Device, DeviceRegistry};
pub use schedule::{Clock, FixedClock, SystemClock, DEFAULT_TIMEZONE};
pub use service::{AlertService, UpdateOutcome};
pub use update::{plan_update, AlertForm, UpdatePlan};

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Device '{0}' not found")]
    NotFound(String),

    #[error("Invalid timestamp '{value}' in {field}")]
    InvalidTimestamp { field: String, value: String },

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
