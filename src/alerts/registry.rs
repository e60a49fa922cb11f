//! Device discovery
//!
//! A device exists as soon as its `{id}_alert_name` key does. The registry
//! is read-only and never caches: every call scans the store again.

use std::sync::Arc;

use serde::Serialize;

use super::keys::{device_id_from_name_key, name_pattern, UNNAMED_DEVICE};
use super::AlertError;
use crate::store::KvStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub device_id: String,
    pub name: String,
}

pub struct DeviceRegistry {
    store: Arc<dyn KvStore>,
}

impl DeviceRegistry {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// All devices with a name key, in store scan order
    pub async fn list_devices(&self) -> Result<Vec<Device>, AlertError> {
        let keys: Vec<String> = self
            .store
            .scan(&name_pattern())
            .await?
            .into_iter()
            .filter(|key| device_id_from_name_key(key).is_some())
            .collect();

        let names = self.store.get_many(&keys).await?;

        let devices: Vec<Device> = keys
            .iter()
            .zip(names)
            .filter_map(|(key, name)| {
                device_id_from_name_key(key).map(|device_id| Device {
                    device_id: device_id.to_string(),
                    name: display_name(name),
                })
            })
            .collect();

        tracing::debug!(count = devices.len(), "Listed devices");
        Ok(devices)
    }
}

fn display_name(raw: Option<String>) -> String {
    raw.filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| UNNAMED_DEVICE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};

    #[tokio::test]
    async fn test_list_devices() {
        let store = Arc::new(MemoryStore::with_entries([
            ("49671_alert_name", "Cold room"),
            ("49671_alert_frequency", "24"),
            ("50112_alert_name", "Freezer"),
            ("50112_alert_enabled", "1"),
        ]));
        let registry = DeviceRegistry::new(store);

        let devices = registry.list_devices().await.unwrap();
        assert_eq!(
            devices,
            vec![
                Device {
                    device_id: "49671".to_string(),
                    name: "Cold room".to_string()
                },
                Device {
                    device_id: "50112".to_string(),
                    name: "Freezer".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_name_defaults() {
        let store = Arc::new(MemoryStore::with_entries([("7_alert_name", "")]));
        let registry = DeviceRegistry::new(store);

        let devices = registry.list_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, UNNAMED_DEVICE);
    }

    #[tokio::test]
    async fn test_no_devices_is_not_an_error() {
        let store = Arc::new(MemoryStore::with_entries([("unrelated", "x")]));
        let registry = DeviceRegistry::new(store);

        assert!(registry.list_devices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ids_with_underscores_and_legacy_keys() {
        let store = Arc::new(MemoryStore::with_entries([
            ("lab_2_alert_name", "Lab fridge"),
            ("alert_3_name", "legacy layout"),
            ("_alert_name", "no id"),
        ]));
        let registry = DeviceRegistry::new(store);

        let devices = registry.list_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].device_id, "lab_2");
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(MemoryStore::with_entries([("1_alert_name", "Cellar")]));
        let registry = DeviceRegistry::new(store.clone());

        store.set_failing(true);
        assert!(matches!(
            registry.list_devices().await,
            Err(AlertError::Store(StoreError::Unavailable(_)))
        ));

        store.set_failing(false);
        assert_eq!(registry.list_devices().await.unwrap().len(), 1);
    }
}
