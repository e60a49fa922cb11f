//! Form submissions and the writes they produce

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::keys::{AlertField, FieldValue, DISABLED_FLAG};
use super::record::StoredAlert;
use super::schedule::{format_storage, next_check};
use super::AlertError;

/// A submitted form: field name to raw string value, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertForm {
    entries: Vec<(String, String)>,
}

impl AlertForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    /// Submitted value for `field`. The first occurrence wins.
    pub fn value(&self, field: AlertField) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| AlertField::from_form_name(name) == Some(field))
            .map(|(_, value)| value.as_str())
    }

    /// Submitted names that are not editable alert fields
    pub fn ignored_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| !AlertField::from_form_name(name).is_some_and(AlertField::is_editable))
    }
}

impl<K, V> FromIterator<(K, V)> for AlertForm
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Keys to write for one submission
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    pub writes: Vec<(String, String)>,
    /// Set when the frequency changed and the schedule was recomputed
    pub next_check_at: Option<DateTime<Tz>>,
}

/// Validate `form` against the stored snapshot and compute the writes.
///
/// Nothing is written here. Any validation failure rejects the whole
/// submission, so callers can apply the plan as a single batch.
pub fn plan_update(
    existing: &StoredAlert,
    form: &AlertForm,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<UpdatePlan, AlertError> {
    let device_id = existing.device_id();
    let mut writes = Vec::new();
    let mut frequency_hours = None;

    for field in AlertField::EDITABLE {
        let Some(raw) = form.value(field) else {
            continue;
        };

        let parsed = field.kind().parse(raw).map_err(|reason| validation(field, reason))?;
        if let FieldValue::Integer(hours) = parsed {
            if hours < 0 {
                return Err(validation(field, format!("'{}' must not be negative", raw)));
            }
            frequency_hours = Some(hours);
        }

        writes.push((field.key(device_id), raw.to_string()));
    }

    // Unchecked checkboxes are not submitted at all
    if form.value(AlertField::Enabled).is_none() {
        writes.push((AlertField::Enabled.key(device_id), DISABLED_FLAG.to_string()));
    }

    // Compared as strings: "24" -> "024" reschedules too
    let mut next_check_at = None;
    if let (Some(submitted), Some(hours)) = (form.value(AlertField::Frequency), frequency_hours) {
        if existing.raw(AlertField::Frequency) != Some(submitted) {
            let next = next_check(now, tz, hours).ok_or_else(|| {
                validation(
                    AlertField::Frequency,
                    format!("'{}' hours is out of range", submitted),
                )
            })?;
            writes.push((AlertField::NextCheck.key(device_id), format_storage(&next)));
            next_check_at = Some(next);
        }
    }

    Ok(UpdatePlan {
        writes,
        next_check_at,
    })
}

fn validation(field: AlertField, reason: String) -> AlertError {
    AlertError::Validation {
        field: field.form_name().to_string(),
        reason,
    }
}
