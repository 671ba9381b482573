use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

use super::types::*;
use crate::inventory::{Inventory, NewCable, NewDevice, ResourceKind};
use crate::topology::planner::PRICE_FIELD;

/// Role color used for every tier role
const ROLE_COLOR: &str = "2196f3";

/// NetBox API client
pub struct NetBoxClient {
    base_url: String,
    token: String,
    client: Client,
}

fn build_http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))
}

fn normalize_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// NetBox slugs: lowercase alphanumerics joined by single hyphens
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// REST collection path for a resource kind
pub fn endpoint(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Site => "/dcim/sites/",
        ResourceKind::Manufacturer => "/dcim/manufacturers/",
        ResourceKind::DeviceType => "/dcim/device-types/",
        ResourceKind::DeviceRole => "/dcim/device-roles/",
        ResourceKind::Rack => "/dcim/racks/",
        ResourceKind::Device => "/dcim/devices/",
        ResourceKind::Interface => "/dcim/interfaces/",
        ResourceKind::Cable => "/dcim/cables/",
        ResourceKind::CustomField => "/extras/custom-fields/",
    }
}

fn price_field(price: Option<f64>) -> HashMap<String, serde_json::Value> {
    HashMap::from([(PRICE_FIELD.to_string(), serde_json::json!(price))])
}

impl NetBoxClient {
    pub fn new(url: String, token: String) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base(&url),
            token,
            client: build_http_client()?,
        })
    }

    /// Exchange username/password for an API token
    pub async fn with_credentials(url: String, username: &str, password: &str) -> Result<Self> {
        let client = build_http_client()?;
        let base_url = normalize_base(&url);
        let resp = client
            .post(format!("{}/api/users/tokens/provision/", base_url))
            .header("Accept", "application/json")
            .json(&TokenProvision {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("NetBox token provisioning failed {}: {}", status, body));
        }

        let token: NbToken = resp.json().await?;
        let secret = token
            .secret()
            .context("NetBox token response carried no key")?
            .to_string();
        tracing::info!("Provisioned NetBox token {} for {}", token.id, username);

        Ok(Self {
            base_url,
            token: secret,
            client,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Helper to perform a GET list request, following `next` links
    async fn list_paginated<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        let mut url = self.api_url(&format!("{}?limit=1000", endpoint));
        let mut items = Vec::new();
        loop {
            let resp = self
                .client
                .get(&url)
                .header("Authorization", self.auth_header())
                .header("Accept", "application/json")
                .send()
                .await?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(anyhow::anyhow!("NetBox API error {}: {}", status, body));
            }

            let page: PaginatedResponse<T> = resp.json().await?;
            items.extend(page.results);
            match page.next {
                Some(next) => url = next,
                None => return Ok(items),
            }
        }
    }

    /// Helper to create a resource via POST and return its id
    async fn create_resource<B: serde::Serialize>(&self, endpoint: &str, body: &B) -> Result<i64> {
        let resp = self
            .client
            .post(self.api_url(endpoint))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("NetBox API create error {} on {}: {}", status, endpoint, body));
        }

        let created: NbObject = resp.json().await?;
        tracing::debug!(
            "NetBox created {} {} ({})",
            endpoint,
            created.id,
            created.display.as_deref().unwrap_or("")
        );
        Ok(created.id)
    }

    /// Test connectivity to NetBox
    pub async fn test_connection(&self) -> bool {
        match self
            .client
            .get(self.api_url("/dcim/sites/?limit=1"))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl Inventory for NetBoxClient {
    async fn create_site(&self, name: &str) -> Result<i64> {
        self.create_resource(endpoint(ResourceKind::Site), &SiteCreate {
            name: name.to_string(),
            slug: slugify(name),
            status: "active".to_string(),
        }).await
    }

    async fn create_manufacturer(&self, name: &str) -> Result<i64> {
        self.create_resource(endpoint(ResourceKind::Manufacturer), &ManufacturerCreate {
            name: name.to_string(),
            slug: slugify(name),
        }).await
    }

    async fn create_device_type(&self, name: &str, manufacturer_id: i64, model: &str, price: f64) -> Result<i64> {
        self.create_resource(endpoint(ResourceKind::DeviceType), &DeviceTypeCreate {
            manufacturer: manufacturer_id,
            model: model.to_string(),
            slug: slugify(name),
            custom_fields: price_field(Some(price)),
        }).await
    }

    async fn create_device_role(&self, name: &str) -> Result<i64> {
        self.create_resource(endpoint(ResourceKind::DeviceRole), &DeviceRoleCreate {
            name: name.to_string(),
            slug: slugify(name),
            color: ROLE_COLOR.to_string(),
        }).await
    }

    async fn create_rack(&self, name: &str, height: u32, site_id: i64) -> Result<i64> {
        self.create_resource(endpoint(ResourceKind::Rack), &RackCreate {
            name: name.to_string(),
            site: site_id,
            u_height: height,
        }).await
    }

    async fn create_device(&self, device: &NewDevice) -> Result<i64> {
        self.create_resource(endpoint(ResourceKind::Device), &DeviceCreate {
            name: device.name.clone(),
            device_type: device.type_id,
            role: device.role_id,
            site: device.site_id,
            status: "planned".to_string(),
            rack: device.rack_id,
            position: device.position,
            face: device.position.map(|_| "front".to_string()),
        }).await
    }

    async fn create_interface(&self, name: &str, device_id: i64) -> Result<i64> {
        self.create_resource(endpoint(ResourceKind::Interface), &InterfaceCreate {
            device: device_id,
            name: name.to_string(),
            iface_type: "1000base-t".to_string(),
        }).await
    }

    async fn create_cable(&self, cable: &NewCable) -> Result<i64> {
        self.create_resource(endpoint(ResourceKind::Cable), &CableCreate {
            a_terminations: vec![Termination::interface(cable.interface_a)],
            b_terminations: vec![Termination::interface(cable.interface_b)],
            status: "connected".to_string(),
            length: cable.length,
            length_unit: "m".to_string(),
            custom_fields: price_field(cable.price),
        }).await
    }

    async fn create_custom_field(&self, name: &str, field_type: &str, applies_to: &[&str]) -> Result<i64> {
        self.create_resource(endpoint(ResourceKind::CustomField), &CustomFieldCreate {
            name: name.to_string(),
            field_type: field_type.to_string(),
            content_types: applies_to.iter().map(|s| s.to_string()).collect(),
        }).await
    }

    async fn list_ids(&self, kind: ResourceKind) -> Result<Vec<i64>> {
        let objects: Vec<NbObject> = self.list_paginated(endpoint(kind)).await?;
        Ok(objects.into_iter().map(|o| o.id).collect())
    }

    async fn delete(&self, kind: ResourceKind, id: i64) -> Result<()> {
        let resp = self
            .client
            .delete(self.api_url(&format!("{}{}/", endpoint(kind), id)))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await?;

        // Deleting a device cascades to its interfaces and cables
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("NetBox {} {} already gone", kind, id);
            return Ok(());
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("NetBox API delete error {} on {} {}: {}", status, kind, id, body));
        }
        tracing::debug!("NetBox deleted {} {}", kind, id);
        Ok(())
    }
}
