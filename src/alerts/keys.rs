//! Key layout for alert state
//!
//! Every value lives under `{device_id}_alert_{field}`. The older
//! `alert_{device_id}_{field}` layout is not read.

use chrono::NaiveDateTime;

use super::schedule::parse_storage;
use crate::store::escape_glob;

/// Marker between the device id and the field name
pub const KEY_MARKER: &str = "_alert_";

/// Suffix of the key holding a device's display name
pub const NAME_KEY_SUFFIX: &str = "_alert_name";

/// Name shown for devices whose name key is missing or empty
pub const UNNAMED_DEVICE: &str = "Unnamed Device";

/// Stored value of a disabled alert
pub const DISABLED_FLAG: &str = "0";

/// Form name accepted for the enabled checkbox besides `alert_enabled`
pub const LEGACY_SWITCH_NAME: &str = "alertSwitch";

/// One persisted attribute of a device's alert record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlertField {
    Name,
    MaxTemp,
    Enabled,
    Frequency,
    NextCheck,
    LastCheck,
    CurrTemp,
}

impl AlertField {
    pub const ALL: [AlertField; 7] = [
        AlertField::Name,
        AlertField::MaxTemp,
        AlertField::Enabled,
        AlertField::Frequency,
        AlertField::NextCheck,
        AlertField::LastCheck,
        AlertField::CurrTemp,
    ];

    /// Fields an operator may change through the form
    pub const EDITABLE: [AlertField; 4] = [
        AlertField::Name,
        AlertField::MaxTemp,
        AlertField::Enabled,
        AlertField::Frequency,
    ];

    /// Key suffix after the `_alert_` marker
    pub fn suffix(self) -> &'static str {
        match self {
            AlertField::Name => "name",
            AlertField::MaxTemp => "max_temp",
            AlertField::Enabled => "enabled",
            AlertField::Frequency => "frequency",
            AlertField::NextCheck => "next_check",
            AlertField::LastCheck => "last_check",
            AlertField::CurrTemp => "curr_temp",
        }
    }

    /// Name of the matching form input (the key without the device id)
    pub fn form_name(self) -> &'static str {
        match self {
            AlertField::Name => "alert_name",
            AlertField::MaxTemp => "alert_max_temp",
            AlertField::Enabled => "alert_enabled",
            AlertField::Frequency => "alert_frequency",
            AlertField::NextCheck => "alert_next_check",
            AlertField::LastCheck => "alert_last_check",
            AlertField::CurrTemp => "alert_curr_temp",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            AlertField::Name => FieldKind::Text,
            AlertField::MaxTemp | AlertField::CurrTemp => FieldKind::Decimal,
            AlertField::Enabled => FieldKind::Flag,
            AlertField::Frequency => FieldKind::Integer,
            AlertField::NextCheck | AlertField::LastCheck => FieldKind::Timestamp,
        }
    }

    pub fn is_editable(self) -> bool {
        Self::EDITABLE.contains(&self)
    }

    /// Full store key of this field for `device_id`
    pub fn key(self, device_id: &str) -> String {
        format!("{}{}{}", device_id, KEY_MARKER, self.suffix())
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.suffix() == suffix)
    }

    pub fn from_form_name(name: &str) -> Option<Self> {
        if name == LEGACY_SWITCH_NAME {
            return Some(AlertField::Enabled);
        }
        Self::ALL.into_iter().find(|f| f.form_name() == name)
    }

    /// Map a store key back to a field, if it belongs to `device_id`
    pub fn from_key(device_id: &str, key: &str) -> Option<Self> {
        key.strip_prefix(device_id)
            .and_then(|rest| rest.strip_prefix(KEY_MARKER))
            .and_then(Self::from_suffix)
    }
}

/// Scan pattern matching every alert key of `device_id`
pub fn device_pattern(device_id: &str) -> String {
    format!("{}{}*", escape_glob(device_id), KEY_MARKER)
}

/// Scan pattern matching the name key of every device
pub fn name_pattern() -> String {
    format!("*{}", NAME_KEY_SUFFIX)
}

/// Device id encoded in a name key
pub fn device_id_from_name_key(key: &str) -> Option<&str> {
    key.strip_suffix(NAME_KEY_SUFFIX)
        .filter(|id| !id.is_empty())
}

/// Parser selector for a field's raw string value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Decimal,
    Integer,
    Flag,
    Timestamp,
}

/// A field value after parsing
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Decimal(f64),
    Integer(i64),
    Flag(bool),
    Timestamp(NaiveDateTime),
}

impl FieldKind {
    /// Parse `raw` according to this kind. The error is a human-readable reason.
    pub fn parse(self, raw: &str) -> Result<FieldValue, String> {
        match self {
            FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldKind::Decimal => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(FieldValue::Decimal)
                .ok_or_else(|| format!("'{}' is not a decimal number", raw)),
            FieldKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| format!("'{}' is not an integer", raw)),
            FieldKind::Flag => Ok(FieldValue::Flag(parse_flag(raw))),
            FieldKind::Timestamp => parse_storage(raw)
                .map(FieldValue::Timestamp)
                .map_err(|_| format!("'{}' is not a YYYY-MM-DD HH:MM:SS timestamp", raw)),
        }
    }
}

/// Checkbox and stored flag semantics: anything but an explicit "on" value is off
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}
