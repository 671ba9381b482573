use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{PlanError, PlanResult};
use crate::topology::model::TierPair;

/// Cable type used for every join
pub const DEFAULT_CABLE_TYPE: &str = "rj45_cat_7";

/// Model used for host devices unless overridden
pub const DEFAULT_HOST_MODEL: &str = "dell_poweredge_r450_xs";

/// Model used for switch tiers unless overridden
pub const DEFAULT_SWITCH_MODEL: &str = "generic_switch";

/// Reference rack height the rack price is quoted for
const REFERENCE_RACK_HEIGHT: u32 = 42;

/// Unit prices. Cables are priced per meter, racks per 42U, devices per unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceTable {
    pub cables: HashMap<String, f64>,
    pub rack_42u: f64,
    pub devices: HashMap<String, f64>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            cables: HashMap::from([(DEFAULT_CABLE_TYPE.to_string(), 579.0 / 100.0)]),
            rack_42u: 2000.0,
            devices: HashMap::from([
                (DEFAULT_HOST_MODEL.to_string(), 19399.0),
                (DEFAULT_SWITCH_MODEL.to_string(), 8500.0),
            ]),
        }
    }
}

impl PriceTable {
    /// Load defaults, then overlay any keys present in the JSON file.
    /// A missing file is not an error.
    pub fn load(path: Option<&str>) -> PlanResult<Self> {
        let mut table = Self::default();
        let Some(overrides) = read_overrides::<PriceOverrides>(path)? else {
            return Ok(table);
        };
        table.cables.extend(overrides.cables);
        table.devices.extend(overrides.devices);
        if let Some(rack) = overrides.rack_42u {
            table.rack_42u = rack;
        }
        Ok(table)
    }

    pub fn rack_price(&self, height: u32) -> f64 {
        self.rack_42u * height as f64 / REFERENCE_RACK_HEIGHT as f64
    }

    pub fn cable_per_meter(&self, cable_type: &str) -> PlanResult<f64> {
        self.cables
            .get(cable_type)
            .copied()
            .ok_or_else(|| PlanError::config(format!("no price for cable type '{}'", cable_type)))
    }

    pub fn device(&self, model: &str) -> PlanResult<f64> {
        self.devices
            .get(model)
            .copied()
            .ok_or_else(|| PlanError::config(format!("no price for device model '{}'", model)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PriceOverrides {
    cables: HashMap<String, f64>,
    rack_42u: Option<f64>,
    devices: HashMap<String, f64>,
}

/// Physical distance in meters between tiers sitting in different racks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceTable {
    pub core_to_aggregation: f64,
    pub core_to_edge: f64,
    pub aggregation_to_edge: f64,
    pub edge_to_host: f64,
}

impl Default for DistanceTable {
    fn default() -> Self {
        Self {
            core_to_aggregation: 100.0,
            core_to_edge: 150.0,
            aggregation_to_edge: 20.0,
            edge_to_host: 10.0,
        }
    }
}

impl DistanceTable {
    /// Load defaults; keys present in the JSON file replace them.
    pub fn load(path: Option<&str>) -> PlanResult<Self> {
        Ok(read_overrides::<Self>(path)?.unwrap_or_default())
    }

    pub fn between(&self, pair: TierPair) -> f64 {
        match pair {
            TierPair::CoreAggregation => self.core_to_aggregation,
            TierPair::CoreEdge => self.core_to_edge,
            TierPair::AggregationEdge => self.aggregation_to_edge,
            TierPair::EdgeHost => self.edge_to_host,
        }
    }
}

fn read_overrides<T: serde::de::DeserializeOwned>(path: Option<&str>) -> PlanResult<Option<T>> {
    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    if !Path::new(path).exists() {
        tracing::debug!("Override file {} not found, using defaults", path);
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)
        .map_err(|e| PlanError::config(format!("failed to read {}: {}", path, e)))?;
    let parsed = serde_json::from_str(&data)
        .map_err(|e| PlanError::config(format!("failed to parse {}: {}", path, e)))?;
    tracing::info!("Loaded overrides from {}", path);
    Ok(Some(parsed))
}
