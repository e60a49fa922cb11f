//! Store-backed alert operations
//!
//! The service holds no state of its own besides its collaborators. Each
//! call re-reads the store, and each update is one atomic batch write.
//! Concurrent updates of the same device are last-write-wins per key.

use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;

use super::keys::{device_pattern, AlertField};
use super::record::{AlertRecord, StoredAlert};
use super::schedule::{Clock, SystemClock};
use super::update::{plan_update, AlertForm};
use super::AlertError;
use crate::store::KvStore;

/// Result of a successful update
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub written_keys: Vec<String>,
    /// New next check, if the frequency changed
    pub rescheduled: Option<DateTime<Tz>>,
}

pub struct AlertService {
    store: Arc<dyn KvStore>,
    timezone: Tz,
    clock: Arc<dyn Clock>,
}

impl AlertService {
    pub fn new(store: Arc<dyn KvStore>, timezone: Tz) -> Self {
        Self::with_clock(store, timezone, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KvStore>, timezone: Tz, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            timezone,
            clock,
        }
    }

    /// Raw snapshot of every alert key of `device_id`
    pub async fn fetch(&self, device_id: &str) -> Result<StoredAlert, AlertError> {
        let keys = self.store.scan(&device_pattern(device_id)).await?;
        let values = self.store.get_many(&keys).await?;

        let mut stored = StoredAlert::new(device_id);
        for (key, value) in keys.iter().zip(values) {
            match (AlertField::from_key(device_id, key), value) {
                (Some(field), Some(value)) => stored.insert(field, value),
                // Deleted between the scan and the read
                (Some(_), None) => {}
                (None, _) => {
                    tracing::debug!(device_id = %device_id, key = %key, "Ignoring unknown alert key");
                }
            }
        }

        // The pattern also matches keys of ids that extend this one with `_alert_`
        if stored.is_empty() {
            return Err(AlertError::NotFound(device_id.to_string()));
        }

        Ok(stored)
    }

    /// Parsed alert record of `device_id`
    pub async fn load(&self, device_id: &str) -> Result<AlertRecord, AlertError> {
        let stored = self.fetch(device_id).await?;
        AlertRecord::from_stored(&stored, self.timezone)
    }

    /// Apply a form submission on top of the `existing` snapshot.
    ///
    /// Validation runs before anything is written; on success all keys are
    /// written in one batch.
    pub async fn apply_update(
        &self,
        existing: &StoredAlert,
        form: &AlertForm,
    ) -> Result<UpdateOutcome, AlertError> {
        let device_id = existing.device_id();

        for name in form.ignored_names() {
            tracing::debug!(device_id = %device_id, field = %name, "Ignoring non-editable form field");
        }

        let plan = match plan_update(existing, form, self.clock.now(), self.timezone) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::info!(device_id = %device_id, "Rejected alert update: {}", e);
                return Err(e);
            }
        };

        self.store.set_many(&plan.writes).await?;

        if let Some(next) = &plan.next_check_at {
            tracing::info!(device_id = %device_id, next_check = %next, "Rescheduled next check");
        }
        tracing::info!(
            device_id = %device_id,
            keys = plan.writes.len(),
            "Alert configuration saved"
        );

        Ok(UpdateOutcome {
            written_keys: plan.writes.into_iter().map(|(key, _)| key).collect(),
            rescheduled: plan.next_check_at,
        })
    }

    /// Fetch the current snapshot of `device_id` and apply `form` to it
    pub async fn submit(
        &self,
        device_id: &str,
        form: &AlertForm,
    ) -> Result<UpdateOutcome, AlertError> {
        let existing = self.fetch(device_id).await?;
        self.apply_update(&existing, form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::keys::UNNAMED_DEVICE;
    use crate::alerts::schedule::{format_storage, FixedClock, DEFAULT_TIMEZONE};
    use crate::store::{MemoryStore, StoreError};
    use chrono::TimeDelta;

    fn scenario_store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_entries([
            ("49671_alert_name", "Cold room"),
            ("49671_alert_max_temp", "8"),
            ("49671_alert_enabled", "1"),
            ("49671_alert_frequency", "24"),
            ("49671_alert_next_check", "2024-01-01 00:00:00"),
            ("49671_alert_last_check", "2023-12-31 00:00:00"),
            ("49671_alert_curr_temp", "4.2"),
            ("496710_alert_name", "Other device"),
        ]))
    }

    fn scenario_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::at_local(DEFAULT_TIMEZONE, "2024-01-02 00:00:00").unwrap())
    }

    fn service(store: Arc<MemoryStore>, clock: Arc<FixedClock>) -> AlertService {
        AlertService::with_clock(store, DEFAULT_TIMEZONE, clock)
    }

    fn stored_next_check(store: &MemoryStore) -> Option<String> {
        store.snapshot().get("49671_alert_next_check").cloned()
    }

    #[tokio::test]
    async fn test_fetch_only_reads_own_keys() {
        let store = Arc::new(MemoryStore::with_entries([
            ("4_alert_name", "Short id"),
            ("49671_alert_name", "Long id"),
            ("4_alert_legacy", "ignored"),
        ]));
        let svc = service(store, scenario_clock());

        let stored = svc.fetch("4").await.unwrap();
        assert_eq!(stored.raw(AlertField::Name), Some("Short id"));
        assert_eq!(stored.raw(AlertField::Frequency), None);
    }

    #[tokio::test]
    async fn test_foreign_keys_do_not_make_a_device() {
        let store = Arc::new(MemoryStore::with_entries([("4_alert_x_alert_name", "Other")]));
        let svc = service(store.clone(), scenario_clock());

        assert!(matches!(
            svc.fetch("4").await,
            Err(AlertError::NotFound(ref id)) if id == "4"
        ));
        assert!(matches!(
            svc.submit("4", &AlertForm::new().with("alert_frequency", "1"))
                .await,
            Err(AlertError::NotFound(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_load_unknown_device() {
        let svc = service(scenario_store(), scenario_clock());
        assert!(matches!(
            svc.load("12345").await,
            Err(AlertError::NotFound(ref id)) if id == "12345"
        ));
    }

    #[tokio::test]
    async fn test_load_record() {
        let svc = service(scenario_store(), scenario_clock());
        let record = svc.load("49671").await.unwrap();

        assert_eq!(record.name, "Cold room");
        assert_eq!(record.frequency_hours, Some(24));
        assert_eq!(record.current_temperature, Some(4.2));
        assert_eq!(
            record.next_check_at.as_ref().map(format_storage).as_deref(),
            Some("2024-01-01 00:00:00")
        );
    }

    #[tokio::test]
    async fn test_load_without_name_key() {
        let store = Arc::new(MemoryStore::with_entries([("9_alert_frequency", "6")]));
        let svc = service(store, scenario_clock());
        assert_eq!(svc.load("9").await.unwrap().name, UNNAMED_DEVICE);
    }

    #[tokio::test]
    async fn test_scenario_reschedule_then_replay() {
        let store = scenario_store();
        let clock = scenario_clock();
        let svc = service(store.clone(), clock.clone());
        let form = AlertForm::new()
            .with("alert_frequency", "48")
            .with("alert_enabled", "on");

        let outcome = svc.submit("49671", &form).await.unwrap();
        assert!(outcome.rescheduled.is_some());
        assert_eq!(
            stored_next_check(&store).as_deref(),
            Some("2024-01-04 00:00:00")
        );

        // Same frequency again, later: schedule stays put
        clock.advance(TimeDelta::try_hours(5).unwrap());
        let outcome = svc.submit("49671", &form).await.unwrap();
        assert_eq!(outcome.rescheduled, None);
        assert_eq!(
            stored_next_check(&store).as_deref(),
            Some("2024-01-04 00:00:00")
        );
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = scenario_store();
        let svc = service(store, scenario_clock());
        let form = AlertForm::new()
            .with("alert_name", "Walk-in freezer")
            .with("alert_max_temp", "-15.5")
            .with("alert_enabled", "on")
            .with("alert_frequency", "12");

        svc.submit("49671", &form).await.unwrap();
        let record = svc.load("49671").await.unwrap();

        assert_eq!(record.name, "Walk-in freezer");
        assert_eq!(record.max_temperature, -15.5);
        assert!(record.enabled);
        assert_eq!(record.frequency_hours, Some(12));
        // Upstream-owned fields untouched
        assert_eq!(record.current_temperature, Some(4.2));
    }

    #[tokio::test]
    async fn test_recompute_matches_clock() {
        let store = scenario_store();
        let clock = scenario_clock();
        let svc = service(store, clock.clone());

        svc.submit("49671", &AlertForm::new().with("alert_frequency", "6"))
            .await
            .unwrap();
        let record = svc.load("49671").await.unwrap();

        let expected = clock.now() + TimeDelta::try_hours(6).unwrap();
        let actual = record.next_check_at.unwrap();
        assert!((actual.with_timezone(&chrono::Utc) - expected).num_seconds().abs() <= 1);
    }

    #[tokio::test]
    async fn test_unchecked_box_disables() {
        let store = scenario_store();
        let svc = service(store, scenario_clock());
        assert!(svc.load("49671").await.unwrap().enabled);

        svc.submit("49671", &AlertForm::new().with("alert_frequency", "24"))
            .await
            .unwrap();
        assert!(!svc.load("49671").await.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_validation_failure_writes_nothing() {
        let store = scenario_store();
        let svc = service(store.clone(), scenario_clock());
        let before = store.snapshot();

        let form = AlertForm::new()
            .with("alert_name", "Should not be saved")
            .with("alert_frequency", "soon");
        let result = svc.submit("49671", &form).await;

        assert!(matches!(result, Err(AlertError::Validation { .. })));
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_submit_unknown_device() {
        let store = scenario_store();
        let svc = service(store.clone(), scenario_clock());
        let before = store.len();

        let result = svc
            .submit("404", &AlertForm::new().with("alert_frequency", "1"))
            .await;
        assert!(matches!(result, Err(AlertError::NotFound(_))));
        assert_eq!(store.len(), before);
    }

    #[tokio::test]
    async fn test_submit_works_with_bad_stored_timestamp() {
        let store = Arc::new(MemoryStore::with_entries([
            ("3_alert_frequency", "24"),
            ("3_alert_next_check", "garbage"),
        ]));
        let svc = service(store.clone(), scenario_clock());

        assert!(matches!(
            svc.load("3").await,
            Err(AlertError::InvalidTimestamp { .. })
        ));

        svc.submit("3", &AlertForm::new().with("alert_frequency", "48"))
            .await
            .unwrap();
        assert!(svc.load("3").await.is_ok());
    }

    #[tokio::test]
    async fn test_store_failure_then_recovery() {
        let store = scenario_store();
        let svc = service(store.clone(), scenario_clock());

        store.set_failing(true);
        assert!(matches!(
            svc.load("49671").await,
            Err(AlertError::Store(StoreError::Unavailable(_)))
        ));

        store.set_failing(false);
        assert!(svc.load("49671").await.is_ok());
    }
}
