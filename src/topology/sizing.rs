use serde::{Deserialize, Serialize};

use super::cabling::{link_plan, planned_degrees};
use super::model::Tier;
use crate::error::{PlanError, PlanResult};
use crate::pricing::{DEFAULT_HOST_MODEL, DEFAULT_SWITCH_MODEL};

/// How tier cardinalities and port budgets are derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SizingPolicy {
    /// Generalized fat-tree: every switch has `ports_per_switch` ports.
    FixedFanout { tree_level: u32, ports_per_switch: u32 },
    /// Three-level tree whose port budgets follow neighbor-tier sizes.
    VariableFanout {
        core_router_number: u32,
        ports_per_router: u32,
        host_number: u32,
    },
}

impl SizingPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            SizingPolicy::FixedFanout { .. } => "fixed_fanout",
            SizingPolicy::VariableFanout { .. } => "variable_fanout",
        }
    }
}

/// What to do when hosts or pods do not divide evenly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Fail sizing
    #[default]
    Reject,
    /// Floor-divide and leave remainder devices unwired
    Truncate,
}

/// Device model per tier, used for device types and pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierModels {
    pub core: String,
    pub aggregation: String,
    pub edge: String,
    pub host: String,
}

impl Default for TierModels {
    fn default() -> Self {
        Self {
            core: DEFAULT_SWITCH_MODEL.to_string(),
            aggregation: DEFAULT_SWITCH_MODEL.to_string(),
            edge: DEFAULT_SWITCH_MODEL.to_string(),
            host: DEFAULT_HOST_MODEL.to_string(),
        }
    }
}

impl TierModels {
    pub fn for_tier(&self, tier: Tier) -> &str {
        match tier {
            Tier::Core => &self.core,
            Tier::Aggregation => &self.aggregation,
            Tier::Edge => &self.edge,
            Tier::Host => &self.host,
        }
    }
}

/// Capacity parameters for one planning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyParams {
    #[serde(flatten)]
    pub sizing: SizingPolicy,
    pub rack_height: u32,
    #[serde(default = "default_pod_size")]
    pub pod_size: u32,
    #[serde(default)]
    pub remainder: RemainderPolicy,
    #[serde(default)]
    pub models: TierModels,
}

fn default_pod_size() -> u32 {
    4
}

/// Per-tier interface counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierPorts {
    pub core: usize,
    pub aggregation: usize,
    pub edge: usize,
    pub host: usize,
}

/// Concrete tier sizes produced by [`plan_tiers`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierPlan {
    pub policy: &'static str,
    pub tree_level: u32,
    pub core: usize,
    pub aggregation: usize,
    pub edge: usize,
    pub hosts: usize,
    pub pods: usize,
    /// Edge devices a full pod holds
    #[serde(skip)]
    pub pod_edges: usize,
    pub ports: TierPorts,
    pub rack_height: u32,
    pub racks: usize,
}

impl TierPlan {
    pub fn count(&self, tier: Tier) -> usize {
        match tier {
            Tier::Core => self.core,
            Tier::Aggregation => self.aggregation,
            Tier::Edge => self.edge,
            Tier::Host => self.hosts,
        }
    }

    pub fn ports(&self, tier: Tier) -> usize {
        match tier {
            Tier::Core => self.ports.core,
            Tier::Aggregation => self.ports.aggregation,
            Tier::Edge => self.ports.edge,
            Tier::Host => self.ports.host,
        }
    }

    pub fn total_devices(&self) -> usize {
        self.core + self.aggregation + self.edge + self.hosts
    }

    /// Hosts left without an edge uplink after floor division
    pub fn unattached_hosts(&self) -> usize {
        if self.edge == 0 {
            return self.hosts;
        }
        self.hosts % self.edge
    }
}

/// Derive tier counts and port budgets, then check every device's planned
/// connection count fits its port budget.
pub fn plan_tiers(params: &TopologyParams) -> PlanResult<TierPlan> {
    if params.rack_height == 0 {
        return Err(PlanError::sizing("rack_height must be positive"));
    }

    let mut plan = match &params.sizing {
        SizingPolicy::FixedFanout {
            tree_level,
            ports_per_switch,
        } => fixed_fanout(*tree_level, *ports_per_switch, params.pod_size)?,
        SizingPolicy::VariableFanout {
            core_router_number,
            ports_per_router,
            host_number,
        } => variable_fanout(*core_router_number, *ports_per_router, *host_number, params.pod_size)?,
    };

    plan.rack_height = params.rack_height;
    plan.racks = plan.total_devices().div_ceil(params.rack_height as usize);

    check_positive(&plan)?;
    check_remainders(&plan, params.remainder)?;
    check_port_budgets(&plan)?;

    tracing::info!(
        "Sized {} tree with {} policy: core={} aggregation={} edge={} hosts={} pods={} racks={}",
        plan.tree_level,
        plan.policy,
        plan.core,
        plan.aggregation,
        plan.edge,
        plan.hosts,
        plan.pods,
        plan.racks
    );
    Ok(plan)
}

fn half_of_even(value: u32, what: &str) -> PlanResult<usize> {
    if value == 0 || value % 2 != 0 {
        return Err(PlanError::sizing(format!("{} must be a positive even number, got {}", what, value)));
    }
    Ok(value as usize / 2)
}

fn checked_pow(base: usize, exp: u32) -> PlanResult<usize> {
    base.checked_pow(exp)
        .ok_or_else(|| PlanError::sizing(format!("{}^{} overflows", base, exp)))
}

fn fixed_fanout(tree_level: u32, k: u32, pod_size: u32) -> PlanResult<TierPlan> {
    if !(2..=3).contains(&tree_level) {
        return Err(PlanError::sizing(format!("tree_level must be 2 or 3, got {}", tree_level)));
    }
    let half = half_of_even(k, "ports_per_switch")?;

    let core = checked_pow(half, tree_level - 1)?;
    let hosts = 2 * checked_pow(half, tree_level)?;
    let edge = 2 * core;
    let pod_half = half_of_even(pod_size, "pod_size")?;
    let (aggregation, pod_edges) = if tree_level == 3 {
        (edge, pod_half)
    } else {
        (0, pod_size as usize)
    };
    let pods = edge / pod_edges;

    let k = k as usize;
    Ok(TierPlan {
        policy: "fixed_fanout",
        tree_level,
        core,
        aggregation,
        edge,
        hosts,
        pods,
        pod_edges,
        ports: TierPorts {
            core: k,
            aggregation: if tree_level == 3 { k } else { 0 },
            edge: k,
            host: 1,
        },
        rack_height: 0,
        racks: 0,
    })
}

fn variable_fanout(core: u32, ports_per_router: u32, hosts: u32, pod_size: u32) -> PlanResult<TierPlan> {
    let pod_half = half_of_even(pod_size, "pod_size")?;
    let ports = ports_per_router as usize;
    if ports <= pod_half {
        return Err(PlanError::sizing(format!(
            "ports_per_router ({}) leaves no host ports after {} uplinks",
            ports, pod_half
        )));
    }
    if core == 0 || hosts == 0 {
        return Err(PlanError::sizing("core_router_number and host_number must be positive"));
    }

    let core = core as usize;
    let hosts = hosts as usize;
    let hosts_per_pod = pod_half * (ports - pod_half);
    let pods = hosts.div_ceil(hosts_per_pod);
    let aggregation = pods * pod_half;
    let edge = aggregation;

    Ok(TierPlan {
        policy: "variable_fanout",
        tree_level: 3,
        core,
        aggregation,
        edge,
        hosts,
        pods,
        pod_edges: pod_half,
        ports: TierPorts {
            core: aggregation / 2,
            aggregation: core / 2 + edge / pods,
            edge: aggregation / pods + hosts / edge,
            host: 1,
        },
        rack_height: 0,
        racks: 0,
    })
}

fn check_positive(plan: &TierPlan) -> PlanResult<()> {
    let mut counts = vec![
        ("core", plan.core),
        ("edge", plan.edge),
        ("host", plan.hosts),
        ("pod", plan.pods),
        ("core port", plan.ports.core),
        ("edge port", plan.ports.edge),
    ];
    if plan.tree_level == 3 {
        counts.push(("aggregation", plan.aggregation));
        counts.push(("aggregation port", plan.ports.aggregation));
    }
    for (what, value) in counts {
        if value == 0 {
            return Err(PlanError::sizing(format!("derived {} count is zero", what)));
        }
    }
    Ok(())
}

fn check_remainders(plan: &TierPlan, policy: RemainderPolicy) -> PlanResult<()> {
    let mut uneven = Vec::new();
    if plan.hosts % plan.edge != 0 {
        uneven.push(format!(
            "{} hosts over {} edge devices leaves {} hosts unattached",
            plan.hosts,
            plan.edge,
            plan.unattached_hosts()
        ));
    }
    if plan.edge % plan.pod_edges != 0 {
        uneven.push(format!(
            "{} edge devices do not fill pods of {}; {} left over",
            plan.edge,
            plan.pod_edges,
            plan.edge % plan.pod_edges
        ));
    }
    if plan.edge % plan.pods != 0 {
        uneven.push(format!(
            "{} edge devices over {} pods leaves {} outside any pod",
            plan.edge,
            plan.pods,
            plan.edge % plan.pods
        ));
    }
    if plan.tree_level == 3 && plan.aggregation % plan.pods != 0 {
        uneven.push(format!(
            "{} aggregation devices over {} pods leaves {} outside any pod",
            plan.aggregation,
            plan.pods,
            plan.aggregation % plan.pods
        ));
    }

    if uneven.is_empty() {
        return Ok(());
    }
    match policy {
        RemainderPolicy::Reject => Err(PlanError::sizing(uneven.join("; "))),
        RemainderPolicy::Truncate => {
            for msg in &uneven {
                tracing::warn!("Truncating: {}", msg);
            }
            Ok(())
        }
    }
}

fn check_port_budgets(plan: &TierPlan) -> PlanResult<()> {
    let links = link_plan(plan);
    let degrees = planned_degrees(plan, &links);
    for tier in Tier::ALL {
        let ports = plan.ports(tier);
        if let Some((idx, needed)) = degrees
            .for_tier(tier)
            .iter()
            .enumerate()
            .find(|(_, d)| **d > ports)
        {
            return Err(PlanError::sizing(format!(
                "{} needs {} connections but has {} ports",
                tier.device_name(idx),
                needed,
                ports
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(level: u32, k: u32, pod_size: u32) -> TopologyParams {
        TopologyParams {
            sizing: SizingPolicy::FixedFanout {
                tree_level: level,
                ports_per_switch: k,
            },
            rack_height: 42,
            pod_size,
            remainder: RemainderPolicy::Reject,
            models: TierModels::default(),
        }
    }

    fn variable(core: u32, ports: u32, hosts: u32) -> TopologyParams {
        TopologyParams {
            sizing: SizingPolicy::VariableFanout {
                core_router_number: core,
                ports_per_router: ports,
                host_number: hosts,
            },
            rack_height: 42,
            pod_size: 4,
            remainder: RemainderPolicy::Reject,
            models: TierModels::default(),
        }
    }

    #[test]
    fn test_two_level_fixed() {
        let plan = plan_tiers(&fixed(2, 4, 4)).unwrap();
        assert_eq!(plan.core, 2);
        assert_eq!(plan.hosts, 8);
        assert_eq!(plan.edge, 4);
        assert_eq!(plan.aggregation, 0);
        assert_eq!(plan.pods, 1);
        assert_eq!(plan.racks, 1);
        assert_eq!(plan.ports.host, 1);
        assert_eq!(plan.policy, "fixed_fanout");
    }

    #[test]
    fn test_three_level_fixed() {
        let plan = plan_tiers(&fixed(3, 4, 4)).unwrap();
        assert_eq!(plan.core, 4);
        assert_eq!(plan.edge, 8);
        assert_eq!(plan.aggregation, 8);
        assert_eq!(plan.hosts, 16);
        assert_eq!(plan.pods, 4);
        assert_eq!(plan.total_devices(), 36);
    }

    #[test]
    fn test_variable_fanout_example() {
        let plan = plan_tiers(&variable(4, 6, 16)).unwrap();
        assert_eq!(plan.pods, 2);
        assert_eq!(plan.aggregation, 4);
        assert_eq!(plan.edge, 4);
        assert_eq!(plan.ports.core, 2);
        assert_eq!(plan.ports.aggregation, 4);
        assert_eq!(plan.ports.edge, 6);
        assert_eq!(plan.racks, 1);
        assert_eq!(plan.policy, "variable_fanout");
    }

    #[test]
    fn test_rack_count_rounds_up() {
        let mut params = fixed(3, 4, 4);
        params.rack_height = 10;
        assert_eq!(plan_tiers(&params).unwrap().racks, 4);
    }

    #[test]
    fn test_invalid_inputs_are_sizing_errors() {
        for params in [fixed(4, 4, 4), fixed(2, 5, 4), fixed(3, 4, 3), fixed(2, 4, 3), fixed(2, 0, 4), variable(4, 2, 16), variable(0, 6, 16)] {
            let err = plan_tiers(&params).unwrap_err();
            assert_eq!(err.code(), "SIZING", "{:?}", params);
        }
        let mut params = fixed(2, 4, 4);
        params.rack_height = 0;
        assert!(matches!(plan_tiers(&params), Err(PlanError::Sizing(_))));
    }

    #[test]
    fn test_pod_larger_than_edge_tier() {
        let err = plan_tiers(&fixed(2, 4, 8)).unwrap_err();
        assert!(err.to_string().contains("pod count is zero"));
    }

    #[test]
    fn test_port_budget_exceeded() {
        // k=8 three-level: each aggregation device joins half of 16 cores
        let err = plan_tiers(&fixed(3, 8, 8)).unwrap_err();
        assert!(err.to_string().contains("connections but has 8 ports"), "{}", err);
    }

    #[test]
    fn test_uneven_hosts_rejected_or_truncated() {
        let params = variable(4, 6, 17);
        let err = plan_tiers(&params).unwrap_err();
        assert!(err.to_string().contains("unattached"));

        let mut params = params;
        params.remainder = RemainderPolicy::Truncate;
        let plan = plan_tiers(&params).unwrap();
        assert_eq!(plan.pods, 3);
        assert_eq!(plan.edge, 6);
        assert_eq!(plan.unattached_hosts(), 5);
    }

    #[test]
    fn test_partial_pod_rejected_or_truncated() {
        // k=6 two-level: 6 edge devices over pods of 4
        let params = fixed(2, 6, 4);
        let err = plan_tiers(&params).unwrap_err();
        assert_eq!(err.code(), "SIZING");
        assert!(err.to_string().contains("do not fill pods of 4"), "{}", err);

        let mut params = params;
        params.remainder = RemainderPolicy::Truncate;
        let plan = plan_tiers(&params).unwrap();
        assert_eq!(plan.edge, 6);
        assert_eq!(plan.pods, 1);
    }

    #[test]
    fn test_params_from_json() {
        let params: TopologyParams = serde_json::from_str(
            r#"{"policy": "variable_fanout", "core_router_number": 4, "ports_per_router": 6,
                "host_number": 16, "rack_height": 42}"#,
        )
        .unwrap();
        assert_eq!(params, variable(4, 6, 16));

        let params: TopologyParams = serde_json::from_str(
            r#"{"policy": "fixed_fanout", "tree_level": 3, "ports_per_switch": 4,
                "rack_height": 42, "remainder": "truncate", "models": {"core": "arista_7280"}}"#,
        )
        .unwrap();
        assert_eq!(params.remainder, RemainderPolicy::Truncate);
        assert_eq!(params.models.core, "arista_7280");
        assert_eq!(params.models.host, DEFAULT_HOST_MODEL);
    }
}
