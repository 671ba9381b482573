use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::cabling::{link_plan, wire};
use super::cost::{cost_report, CostReport};
use super::devices::create_tier;
use super::model::{Fabric, Tier};
use super::racks::create_racks;
use super::sizing::{plan_tiers, TierModels, TierPlan, TopologyParams};
use crate::error::{PlanError, PlanResult};
use crate::inventory::{Inventory, ResourceKind};
use crate::pricing::{DistanceTable, PriceTable};

/// Custom field carrying prices on device types and cables
pub const PRICE_FIELD: &str = "price";

/// Everything a generation pass needs besides the fabric itself: the
/// inventory, the price and distance tables, and the ids of the shared
/// resources created during setup.
pub struct PlanContext<'a> {
    pub inventory: &'a dyn Inventory,
    pub prices: &'a PriceTable,
    pub distances: &'a DistanceTable,
    pub models: &'a TierModels,
    pub site_id: i64,
    device_types: HashMap<Tier, i64>,
    roles: HashMap<Tier, i64>,
}

impl<'a> PlanContext<'a> {
    /// Create site, manufacturer, price field, one device type per distinct
    /// model and one role per tier.
    pub async fn setup(
        inventory: &'a dyn Inventory,
        prices: &'a PriceTable,
        distances: &'a DistanceTable,
        models: &'a TierModels,
        site_name: &str,
        manufacturer_name: &str,
    ) -> PlanResult<PlanContext<'a>> {
        let site_id = inventory
            .create_site(site_name)
            .await
            .map_err(|e| PlanError::backend(format!("create_site(name={})", site_name), e))?;
        let manufacturer_id = inventory
            .create_manufacturer(manufacturer_name)
            .await
            .map_err(|e| PlanError::backend(format!("create_manufacturer(name={})", manufacturer_name), e))?;
        inventory
            .create_custom_field(PRICE_FIELD, "decimal", &["dcim.devicetype", "dcim.cable"])
            .await
            .map_err(|e| PlanError::backend(format!("create_custom_field(name={})", PRICE_FIELD), e))?;

        let mut by_model: HashMap<String, i64> = HashMap::new();
        let mut device_types = HashMap::new();
        let mut roles = HashMap::new();
        for tier in Tier::ALL {
            let model = models.for_tier(tier);
            let type_id = match by_model.get(model) {
                Some(id) => *id,
                None => {
                    let price = prices.device(model)?;
                    let id = inventory
                        .create_device_type(model, manufacturer_id, model, price)
                        .await
                        .map_err(|e| {
                            PlanError::backend(format!("create_device_type(name={}, price={})", model, price), e)
                        })?;
                    by_model.insert(model.to_string(), id);
                    id
                }
            };
            device_types.insert(tier, type_id);

            let role = tier.role_name();
            let role_id = inventory
                .create_device_role(&role)
                .await
                .map_err(|e| PlanError::backend(format!("create_device_role(name={})", role), e))?;
            roles.insert(tier, role_id);
        }

        tracing::info!(
            "Setup complete: site={} manufacturer={} device_types={}",
            site_id,
            manufacturer_id,
            by_model.len()
        );

        Ok(PlanContext {
            inventory,
            prices,
            distances,
            models,
            site_id,
            device_types,
            roles,
        })
    }

    pub fn device_type(&self, tier: Tier) -> PlanResult<i64> {
        self.device_types
            .get(&tier)
            .copied()
            .ok_or_else(|| PlanError::config(format!("no device type registered for {} tier", tier)))
    }

    pub fn role(&self, tier: Tier) -> PlanResult<i64> {
        self.roles
            .get(&tier)
            .copied()
            .ok_or_else(|| PlanError::config(format!("no device role registered for {} tier", tier)))
    }
}

/// Result of a completed planning run
#[derive(Debug)]
pub struct PlanOutcome {
    pub plan: TierPlan,
    pub fabric: Fabric,
    pub cost: CostReport,
    pub generated_at: DateTime<Utc>,
}

/// Drives one planning run: sizing, setup, racks, devices tier by tier,
/// cabling, costing.
pub struct Planner<'a> {
    inventory: &'a dyn Inventory,
    prices: &'a PriceTable,
    distances: &'a DistanceTable,
    site_name: String,
    manufacturer_name: String,
}

impl<'a> Planner<'a> {
    pub fn new(inventory: &'a dyn Inventory, prices: &'a PriceTable, distances: &'a DistanceTable) -> Self {
        Self {
            inventory,
            prices,
            distances,
            site_name: "site".to_string(),
            manufacturer_name: "cisco".to_string(),
        }
    }

    pub fn with_names(mut self, site_name: impl Into<String>, manufacturer_name: impl Into<String>) -> Self {
        self.site_name = site_name.into();
        self.manufacturer_name = manufacturer_name.into();
        self
    }

    pub async fn run(&self, params: &TopologyParams) -> PlanResult<PlanOutcome> {
        let plan = plan_tiers(params)?;

        let ctx = PlanContext::setup(
            self.inventory,
            self.prices,
            self.distances,
            &params.models,
            &self.site_name,
            &self.manufacturer_name,
        )
        .await?;

        let mut fabric = Fabric::default();
        fabric.racks = create_racks(&ctx, plan.racks, plan.rack_height).await?;

        for tier in Tier::ALL {
            let count = plan.count(tier);
            if count == 0 {
                tracing::info!("Skipping empty {} tier", tier);
                continue;
            }
            create_tier(&ctx, &mut fabric, tier, count, plan.ports(tier)).await?;
        }

        let passes = link_plan(&plan);
        wire(&ctx, &mut fabric, &passes).await?;

        let unattached = fabric.hosts.iter().filter(|h| fabric.degree(**h) == 0).count();
        if unattached > 0 {
            tracing::warn!("{} hosts left without an edge uplink", unattached);
        }

        let cost = cost_report(&fabric);
        tracing::info!(
            "Plan complete: {} devices, {} cables, total {:.2}",
            fabric.devices.len(),
            fabric.cables.len(),
            cost.grand_total
        );

        Ok(PlanOutcome {
            plan,
            fabric,
            cost,
            generated_at: Utc::now(),
        })
    }
}

/// Delete every resource of every managed kind, dependents first.
/// Returns how many resources of each kind were removed.
pub async fn cleanup(inventory: &dyn Inventory) -> PlanResult<Vec<(ResourceKind, usize)>> {
    let mut removed = Vec::with_capacity(ResourceKind::CLEANUP_ORDER.len());
    for kind in ResourceKind::CLEANUP_ORDER {
        let ids = inventory
            .list_ids(kind)
            .await
            .map_err(|e| PlanError::backend(format!("list_ids(kind={})", kind), e))?;
        for id in &ids {
            inventory
                .delete(kind, *id)
                .await
                .map_err(|e| PlanError::backend(format!("delete(kind={}, id={})", kind, id), e))?;
        }
        if !ids.is_empty() {
            tracing::info!("Deleted {} {} resources", ids.len(), kind);
        }
        removed.push((kind, ids.len()));
    }
    Ok(removed)
}
