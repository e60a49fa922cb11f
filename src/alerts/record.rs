//! Alert record: raw store snapshot, parsed record and display view

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use super::keys::{parse_flag, AlertField, UNNAMED_DEVICE};
use super::schedule::{format_display, localize, parse_storage};
use super::AlertError;

/// Sentinel shown when no usable temperature reading is stored
pub const UNAVAILABLE: &str = "unavailable";

/// Raw field values of one device, exactly as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAlert {
    device_id: String,
    fields: BTreeMap<AlertField, String>,
}

impl StoredAlert {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: AlertField, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: AlertField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn raw(&self, field: AlertField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parsed alert configuration of one device
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    pub device_id: String,
    pub name: String,
    /// `None` when the reading is missing or unparseable
    pub current_temperature: Option<f64>,
    pub max_temperature: f64,
    pub enabled: bool,
    pub frequency_hours: Option<i64>,
    pub last_check_at: Option<DateTime<Tz>>,
    pub next_check_at: Option<DateTime<Tz>>,
}

impl AlertRecord {
    /// Parse and default a stored snapshot.
    ///
    /// Only timestamps can fail: every other field degrades to its default.
    pub fn from_stored(stored: &StoredAlert, tz: Tz) -> Result<Self, AlertError> {
        let device_id = stored.device_id().to_string();

        let name = stored
            .raw(AlertField::Name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNNAMED_DEVICE)
            .to_string();

        let current_temperature = stored.raw(AlertField::CurrTemp).and_then(parse_decimal);

        let max_temperature = match stored.raw(AlertField::MaxTemp) {
            Some(raw) => parse_decimal(raw).unwrap_or_else(|| {
                tracing::warn!(
                    device_id = %device_id,
                    value = %raw,
                    "Stored max temperature is not a number; using 0"
                );
                0.0
            }),
            None => 0.0,
        };

        let enabled = stored.raw(AlertField::Enabled).map(parse_flag).unwrap_or(false);

        let frequency_hours = stored
            .raw(AlertField::Frequency)
            .and_then(|raw| raw.trim().parse::<i64>().ok());

        Ok(Self {
            last_check_at: parse_timestamp(stored, AlertField::LastCheck, tz)?,
            next_check_at: parse_timestamp(stored, AlertField::NextCheck, tz)?,
            device_id,
            name,
            current_temperature,
            max_temperature,
            enabled,
            frequency_hours,
        })
    }

    pub fn view(&self) -> AlertView {
        AlertView {
            device_id: self.device_id.clone(),
            name: self.name.clone(),
            current_temperature: self
                .current_temperature
                .map(|t| t.to_string())
                .unwrap_or_else(|| UNAVAILABLE.to_string()),
            max_temperature: self.max_temperature,
            enabled: self.enabled,
            frequency_hours: self.frequency_hours,
            last_check: self.last_check_at.as_ref().map(format_display),
            next_check: self.next_check_at.as_ref().map(format_display),
        }
    }
}

/// Alert record pre-formatted for the form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertView {
    pub device_id: String,
    pub name: String,
    pub current_temperature: String,
    pub max_temperature: f64,
    pub enabled: bool,
    pub frequency_hours: Option<i64>,
    pub last_check: Option<String>,
    pub next_check: Option<String>,
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_timestamp(
    stored: &StoredAlert,
    field: AlertField,
    tz: Tz,
) -> Result<Option<DateTime<Tz>>, AlertError> {
    let Some(raw) = stored.raw(field) else {
        return Ok(None);
    };

    let invalid = || AlertError::InvalidTimestamp {
        field: field.form_name().to_string(),
        value: raw.to_string(),
    };

    let naive = parse_storage(raw).map_err(|_| invalid())?;
    localize(tz, &naive).map(Some).ok_or_else(invalid)
}
