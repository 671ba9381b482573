use std::env;
use std::path::Path;

use crate::error::{PlanError, PlanResult};
use crate::topology::sizing::{RemainderPolicy, SizingPolicy, TierModels, TopologyParams};

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub netbox_url: String,
    pub netbox_token: String,
    pub netbox_username: String,
    pub netbox_password: String,
    pub site_name: String,
    pub manufacturer_name: String,
    pub topology_file: String,
    pub prices_file: String,
    pub distances_file: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            netbox_url: get_env("NETBOX_URL", "http://localhost:8000"),
            netbox_token: get_env("NETBOX_TOKEN", ""),
            netbox_username: get_env("NETBOX_USERNAME", ""),
            netbox_password: get_env("NETBOX_PASSWORD", ""),
            site_name: get_env("SITE_NAME", "site"),
            manufacturer_name: get_env("MANUFACTURER_NAME", "cisco"),
            topology_file: get_env("TOPOLOGY_FILE", "topology.json"),
            prices_file: get_env("PRICES_FILE", "prices.json"),
            distances_file: get_env("DISTANCES_FILE", "distances.json"),
        }
    }

    /// Topology parameters from `TOPOLOGY_FILE` if it exists, else from the
    /// environment.
    pub fn topology_params(&self) -> PlanResult<TopologyParams> {
        if !self.topology_file.is_empty() && Path::new(&self.topology_file).exists() {
            let data = std::fs::read_to_string(&self.topology_file)
                .map_err(|e| PlanError::config(format!("failed to read {}: {}", self.topology_file, e)))?;
            let params = serde_json::from_str(&data)
                .map_err(|e| PlanError::config(format!("failed to parse {}: {}", self.topology_file, e)))?;
            tracing::info!("Topology parameters loaded from {}", self.topology_file);
            return Ok(params);
        }
        topology_params_from_env(|key| env::var(key).ok())
    }
}

/// Build topology parameters from `SIZING_POLICY`, `TREE_LEVEL`,
/// `PORTS_PER_SWITCH`, `CORE_ROUTER_NUMBER`, `PORTS_PER_ROUTER`,
/// `HOST_NUMBER`, `POD_SIZE`, `RACK_HEIGHT`, `REMAINDER_POLICY` and the
/// `*_MODEL` variables.
pub fn topology_params_from_env<F>(lookup: F) -> PlanResult<TopologyParams>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
    let num = |key: &str, default: u32| -> PlanResult<u32> {
        match lookup(key) {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| PlanError::config(format!("{} must be a non-negative integer, got '{}'", key, v))),
            None => Ok(default),
        }
    };

    let sizing = match var("SIZING_POLICY", "fixed_fanout").as_str() {
        "fixed_fanout" => SizingPolicy::FixedFanout {
            tree_level: num("TREE_LEVEL", 3)?,
            ports_per_switch: num("PORTS_PER_SWITCH", 4)?,
        },
        "variable_fanout" => SizingPolicy::VariableFanout {
            core_router_number: num("CORE_ROUTER_NUMBER", 4)?,
            ports_per_router: num("PORTS_PER_ROUTER", 6)?,
            host_number: num("HOST_NUMBER", 16)?,
        },
        other => return Err(PlanError::config(format!("unknown SIZING_POLICY '{}'", other))),
    };

    let remainder = match var("REMAINDER_POLICY", "reject").as_str() {
        "reject" => RemainderPolicy::Reject,
        "truncate" => RemainderPolicy::Truncate,
        other => return Err(PlanError::config(format!("unknown REMAINDER_POLICY '{}'", other))),
    };

    let defaults = TierModels::default();
    let models = TierModels {
        core: var("CORE_MODEL", defaults.core.as_str()),
        aggregation: var("AGGREGATION_MODEL", defaults.aggregation.as_str()),
        edge: var("EDGE_MODEL", defaults.edge.as_str()),
        host: var("HOST_MODEL", defaults.host.as_str()),
    };

    Ok(TopologyParams {
        sizing,
        rack_height: num("RACK_HEIGHT", 42)?,
        pod_size: num("POD_SIZE", 4)?,
        remainder,
        models,
    })
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
