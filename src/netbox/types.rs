use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// --- NetBox API types ---

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Any NetBox object; only the id is read back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbObject {
    pub id: i64,
    #[serde(default)]
    pub display: Option<String>,
}

/// Response of `/api/users/tokens/provision/`
#[derive(Debug, Clone, Deserialize)]
pub struct NbToken {
    pub id: i64,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
}

impl NbToken {
    /// NetBox returns the key in `key`; older versions only in `display`.
    pub fn secret(&self) -> Option<&str> {
        self.key.as_deref().or(self.display.as_deref())
    }
}

// --- Create request types ---

#[derive(Debug, Serialize)]
pub(crate) struct TokenProvision {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SiteCreate {
    pub name: String,
    pub slug: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ManufacturerCreate {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeviceTypeCreate {
    pub manufacturer: i64,
    pub model: String,
    pub slug: String,
    pub custom_fields: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeviceRoleCreate {
    pub name: String,
    pub slug: String,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RackCreate {
    pub name: String,
    pub site: i64,
    pub u_height: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeviceCreate {
    pub name: String,
    pub device_type: i64,
    pub role: i64,
    pub site: i64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rack: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InterfaceCreate {
    pub device: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub iface_type: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Termination {
    pub object_type: String,
    pub object_id: i64,
}

impl Termination {
    pub fn interface(id: i64) -> Self {
        Self {
            object_type: "dcim.interface".to_string(),
            object_id: id,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CableCreate {
    pub a_terminations: Vec<Termination>,
    pub b_terminations: Vec<Termination>,
    pub status: String,
    pub length: Option<f64>,
    pub length_unit: String,
    pub custom_fields: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CustomFieldCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub content_types: Vec<String>,
}
