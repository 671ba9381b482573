use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

use super::{Inventory, NewCable, NewDevice, ResourceKind};

#[derive(Default)]
struct State {
    next_id: HashMap<ResourceKind, i64>,
    records: HashMap<ResourceKind, BTreeMap<i64, Value>>,
    creates: HashMap<ResourceKind, usize>,
    fail_after: Option<(ResourceKind, usize)>,
}

/// In-process inventory used for dry-run previews and tests.
///
/// Ids are sequential per kind starting at 1, like a fresh NetBox database.
#[derive(Default)]
pub struct MemoryInventory {
    state: Mutex<State>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the create call for `kind` fail once `successes` creates of that
    /// kind have gone through.
    #[cfg(test)]
    pub fn fail_after(kind: ResourceKind, successes: usize) -> Self {
        Self {
            state: Mutex::new(State {
                fail_after: Some((kind, successes)),
                ..State::default()
            }),
        }
    }

    #[cfg(test)]
    pub async fn count(&self, kind: ResourceKind) -> usize {
        let state = self.state.lock().await;
        state.records.get(&kind).map(|r| r.len()).unwrap_or(0)
    }

    #[cfg(test)]
    pub async fn get(&self, kind: ResourceKind, id: i64) -> Option<Value> {
        let state = self.state.lock().await;
        state.records.get(&kind).and_then(|r| r.get(&id)).cloned()
    }

    async fn insert(&self, kind: ResourceKind, attrs: Value) -> Result<i64> {
        let mut state = self.state.lock().await;

        let fail_after = state.fail_after;
        let done = state.creates.entry(kind).or_insert(0);
        if let Some((fail_kind, successes)) = fail_after {
            if fail_kind == kind && *done >= successes {
                return Err(anyhow!("injected failure creating {}", kind));
            }
        }
        *done += 1;

        let next = state.next_id.entry(kind).or_insert(0);
        *next += 1;
        let id = *next;
        state.records.entry(kind).or_default().insert(id, attrs);
        tracing::debug!("Memory inventory: created {} {}", kind, id);
        Ok(id)
    }
}

#[async_trait]
impl Inventory for MemoryInventory {
    async fn create_site(&self, name: &str) -> Result<i64> {
        self.insert(ResourceKind::Site, json!({ "name": name })).await
    }

    async fn create_manufacturer(&self, name: &str) -> Result<i64> {
        self.insert(ResourceKind::Manufacturer, json!({ "name": name })).await
    }

    async fn create_device_type(&self, name: &str, manufacturer_id: i64, model: &str, price: f64) -> Result<i64> {
        self.insert(
            ResourceKind::DeviceType,
            json!({ "name": name, "manufacturer": manufacturer_id, "model": model, "price": price }),
        )
        .await
    }

    async fn create_device_role(&self, name: &str) -> Result<i64> {
        self.insert(ResourceKind::DeviceRole, json!({ "name": name })).await
    }

    async fn create_rack(&self, name: &str, height: u32, site_id: i64) -> Result<i64> {
        self.insert(
            ResourceKind::Rack,
            json!({ "name": name, "u_height": height, "site": site_id }),
        )
        .await
    }

    async fn create_device(&self, device: &NewDevice) -> Result<i64> {
        self.insert(ResourceKind::Device, serde_json::to_value(device)?).await
    }

    async fn create_interface(&self, name: &str, device_id: i64) -> Result<i64> {
        self.insert(
            ResourceKind::Interface,
            json!({ "name": name, "device": device_id }),
        )
        .await
    }

    async fn create_cable(&self, cable: &NewCable) -> Result<i64> {
        self.insert(ResourceKind::Cable, serde_json::to_value(cable)?).await
    }

    async fn create_custom_field(&self, name: &str, field_type: &str, applies_to: &[&str]) -> Result<i64> {
        self.insert(
            ResourceKind::CustomField,
            json!({ "name": name, "type": field_type, "content_types": applies_to }),
        )
        .await
    }

    async fn list_ids(&self, kind: ResourceKind) -> Result<Vec<i64>> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .get(&kind)
            .map(|r| r.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, kind: ResourceKind, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .records
            .get_mut(&kind)
            .and_then(|r| r.remove(&id))
            .map(|_| ())
            .ok_or_else(|| anyhow!("{} {} not found", kind, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_sequential_per_kind() {
        let inv = MemoryInventory::new();
        assert_eq!(inv.create_site("site").await.unwrap(), 1);
        assert_eq!(inv.create_rack("rack_1", 42, 1).await.unwrap(), 1);
        assert_eq!(inv.create_rack("rack_2", 42, 1).await.unwrap(), 2);
        assert_eq!(inv.list_ids(ResourceKind::Rack).await.unwrap(), vec![1, 2]);
        assert_eq!(inv.get(ResourceKind::Rack, 2).await.unwrap()["name"], "rack_2");
    }

    #[test]
    fn test_delete() {
        tokio_test::block_on(async {
            let inv = MemoryInventory::new();
            let id = inv.create_manufacturer("cisco").await.unwrap();
            tokio_test::assert_ok!(inv.delete(ResourceKind::Manufacturer, id).await);
            assert_eq!(inv.count(ResourceKind::Manufacturer).await, 0);
            tokio_test::assert_err!(inv.delete(ResourceKind::Manufacturer, id).await);
        });
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let inv = MemoryInventory::fail_after(ResourceKind::Interface, 2);
        inv.create_interface("a", 1).await.unwrap();
        inv.create_interface("b", 1).await.unwrap();
        assert!(inv.create_interface("c", 1).await.is_err());
        assert!(inv.create_site("site").await.is_ok());
        assert_eq!(inv.count(ResourceKind::Interface).await, 2);
    }
}
