pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

pub use memory::MemoryInventory;

/// Resource kinds managed in the inventory backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Site,
    Manufacturer,
    DeviceType,
    DeviceRole,
    Rack,
    Device,
    Interface,
    Cable,
    CustomField,
}

impl ResourceKind {
    /// Deletion order: dependents before the things they reference
    pub const CLEANUP_ORDER: [ResourceKind; 9] = [
        ResourceKind::Cable,
        ResourceKind::Interface,
        ResourceKind::Device,
        ResourceKind::Rack,
        ResourceKind::DeviceType,
        ResourceKind::DeviceRole,
        ResourceKind::Manufacturer,
        ResourceKind::Site,
        ResourceKind::CustomField,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Site => "site",
            ResourceKind::Manufacturer => "manufacturer",
            ResourceKind::DeviceType => "device-type",
            ResourceKind::DeviceRole => "device-role",
            ResourceKind::Rack => "rack",
            ResourceKind::Device => "device",
            ResourceKind::Interface => "interface",
            ResourceKind::Cable => "cable",
            ResourceKind::CustomField => "custom-field",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device creation attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDevice {
    pub name: String,
    pub type_id: i64,
    pub role_id: i64,
    pub site_id: i64,
    pub rack_id: Option<i64>,
    pub position: Option<u32>,
}

/// Cable creation attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCable {
    pub interface_a: i64,
    pub interface_b: i64,
    pub length: Option<f64>,
    pub price: Option<f64>,
}

/// The CRUD surface the planner needs from an inventory backend.
///
/// Every create returns the backend-assigned id. Calls are awaited one at a
/// time by the planner.
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn create_site(&self, name: &str) -> Result<i64>;
    async fn create_manufacturer(&self, name: &str) -> Result<i64>;
    async fn create_device_type(&self, name: &str, manufacturer_id: i64, model: &str, price: f64) -> Result<i64>;
    async fn create_device_role(&self, name: &str) -> Result<i64>;
    async fn create_rack(&self, name: &str, height: u32, site_id: i64) -> Result<i64>;
    async fn create_device(&self, device: &NewDevice) -> Result<i64>;
    async fn create_interface(&self, name: &str, device_id: i64) -> Result<i64>;
    async fn create_cable(&self, cable: &NewCable) -> Result<i64>;
    async fn create_custom_field(&self, name: &str, field_type: &str, applies_to: &[&str]) -> Result<i64>;

    async fn list_ids(&self, kind: ResourceKind) -> Result<Vec<i64>>;
    async fn delete(&self, kind: ResourceKind, id: i64) -> Result<()>;
}
