use super::model::{Cable, DeviceIdx, Fabric, InterfaceRef, Priceable, Tier, TierPair};
use super::planner::PlanContext;
use super::sizing::TierPlan;
use crate::error::{PlanError, PlanResult};
use crate::inventory::NewCable;
use crate::pricing::DEFAULT_CABLE_TYPE;

/// Length in meters of a cable between two devices in the same rack
pub const SAME_RACK_LENGTH: f64 = 1.0;

/// One cabling pass: (upper, lower) index pairs into the two tier lists,
/// in join order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPass {
    pub pair: TierPair,
    pub links: Vec<(usize, usize)>,
}

/// Even aggregation devices join the first half of the core list, odd ones
/// the second half.
pub fn core_aggregation_links(core: usize, aggregation: usize) -> Vec<(usize, usize)> {
    let half = core / 2;
    let mut links = Vec::new();
    for agg in 0..aggregation {
        let cores = if agg % 2 == 0 { 0..half } else { half..core };
        links.extend(cores.map(|c| (c, agg)));
    }
    links
}

/// Core device `i` joins slot `i mod edges_per_pod` of every pod.
pub fn core_edge_links(core: usize, edge: usize, pods: usize) -> Vec<(usize, usize)> {
    if pods == 0 {
        return Vec::new();
    }
    let per_pod = edge / pods;
    if per_pod == 0 {
        return Vec::new();
    }
    let mut links = Vec::new();
    for c in 0..core {
        for pod in 0..pods {
            links.push((c, pod * per_pod + c % per_pod));
        }
    }
    links
}

/// Full bipartite mesh between the aggregation and edge slices of each pod.
pub fn aggregation_edge_links(aggregation: usize, edge: usize, pods: usize) -> Vec<(usize, usize)> {
    if pods == 0 {
        return Vec::new();
    }
    let agg_per_pod = aggregation / pods;
    let edge_per_pod = edge / pods;
    let mut links = Vec::new();
    for pod in 0..pods {
        for a in pod * agg_per_pod..(pod + 1) * agg_per_pod {
            for e in pod * edge_per_pod..(pod + 1) * edge_per_pod {
                links.push((a, e));
            }
        }
    }
    links
}

/// Edge device `i` takes the contiguous host block `[i*hpe, (i+1)*hpe)`.
/// Remainder hosts are never attached.
pub fn edge_host_links(edge: usize, hosts: usize) -> Vec<(usize, usize)> {
    if edge == 0 {
        return Vec::new();
    }
    let per_edge = hosts / edge;
    let mut links = Vec::new();
    for e in 0..edge {
        links.extend((e * per_edge..(e + 1) * per_edge).map(|h| (e, h)));
    }
    links
}

/// Cabling passes for a sized tree, in execution order.
pub fn link_plan(plan: &TierPlan) -> Vec<LinkPass> {
    let mut passes = Vec::with_capacity(3);
    if plan.tree_level == 3 {
        passes.push(LinkPass {
            pair: TierPair::CoreAggregation,
            links: core_aggregation_links(plan.core, plan.aggregation),
        });
        passes.push(LinkPass {
            pair: TierPair::AggregationEdge,
            links: aggregation_edge_links(plan.aggregation, plan.edge, plan.pods),
        });
    } else {
        passes.push(LinkPass {
            pair: TierPair::CoreEdge,
            links: core_edge_links(plan.core, plan.edge, plan.pods),
        });
    }
    passes.push(LinkPass {
        pair: TierPair::EdgeHost,
        links: edge_host_links(plan.edge, plan.hosts),
    });
    passes
}

/// Connection count per device, by tier, implied by a set of passes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlannedDegrees {
    pub core: Vec<usize>,
    pub aggregation: Vec<usize>,
    pub edge: Vec<usize>,
    pub hosts: Vec<usize>,
}

impl PlannedDegrees {
    pub fn for_tier(&self, tier: Tier) -> &[usize] {
        match tier {
            Tier::Core => &self.core,
            Tier::Aggregation => &self.aggregation,
            Tier::Edge => &self.edge,
            Tier::Host => &self.hosts,
        }
    }

    fn for_tier_mut(&mut self, tier: Tier) -> &mut Vec<usize> {
        match tier {
            Tier::Core => &mut self.core,
            Tier::Aggregation => &mut self.aggregation,
            Tier::Edge => &mut self.edge,
            Tier::Host => &mut self.hosts,
        }
    }
}

pub fn planned_degrees(plan: &TierPlan, passes: &[LinkPass]) -> PlannedDegrees {
    let mut degrees = PlannedDegrees::default();
    for tier in Tier::ALL {
        *degrees.for_tier_mut(tier) = vec![0; plan.count(tier)];
    }
    for pass in passes {
        let (upper, lower) = pass.pair.tiers();
        for &(a, b) in &pass.links {
            degrees.for_tier_mut(upper)[a] += 1;
            degrees.for_tier_mut(lower)[b] += 1;
        }
    }
    degrees
}

/// Join two devices with one cable.
///
/// Takes the first open interface of each side, registers the cable with the
/// inventory, then closes both interfaces. Never retries.
pub async fn join(
    ctx: &PlanContext<'_>,
    fabric: &mut Fabric,
    a: DeviceIdx,
    b: DeviceIdx,
    pair: TierPair,
) -> PlanResult<usize> {
    let a_if = open_interface(fabric, a)?;
    let b_if = open_interface(fabric, b)?;

    let length = if fabric.same_rack(a, b) {
        SAME_RACK_LENGTH
    } else {
        ctx.distances.between(pair)
    };
    let price_per_meter = ctx.prices.cable_per_meter(DEFAULT_CABLE_TYPE)?;
    let price = length * price_per_meter;

    let a_iface = &fabric.device(a).interfaces[a_if];
    let b_iface = &fabric.device(b).interfaces[b_if];
    let description = format!("{} - {}", a_iface.name, b_iface.name);
    let request = NewCable {
        interface_a: a_iface.id,
        interface_b: b_iface.id,
        length: Some(length),
        price: Some(price),
    };

    let id = ctx.inventory.create_cable(&request).await.map_err(|e| {
        PlanError::backend(
            format!(
                "create_cable(a={}, b={}, length={}, price={:.2})",
                request.interface_a, request.interface_b, length, price
            ),
            e,
        )
    })?;

    fabric.devices[a.0].interfaces[a_if].is_open = false;
    fabric.devices[b.0].interfaces[b_if].is_open = false;

    let index = fabric.cables.len();
    fabric.cables.push(Cable {
        id,
        cable_type: DEFAULT_CABLE_TYPE.to_string(),
        pair,
        length,
        price_per_meter,
        endpoints: [
            InterfaceRef { device: a, interface: a_if },
            InterfaceRef { device: b, interface: b_if },
        ],
        priceable: Priceable::new(format!("cable_{}", index + 1), description, price),
    });
    tracing::debug!("Cable {} created for {} ({} m)", id, pair.as_str(), length);
    Ok(index)
}

fn open_interface(fabric: &Fabric, idx: DeviceIdx) -> PlanResult<usize> {
    let device = fabric.device(idx);
    device.first_open_interface().ok_or_else(|| {
        PlanError::capacity(format!(
            "{} has no open interface left ({} total)",
            device.name,
            device.interfaces.len()
        ))
    })
}

/// Execute every pass against the devices already in the fabric.
pub async fn wire(ctx: &PlanContext<'_>, fabric: &mut Fabric, passes: &[LinkPass]) -> PlanResult<()> {
    for pass in passes {
        let (upper, lower) = pass.pair.tiers();
        let before = fabric.cables.len();
        for &(a, b) in &pass.links {
            let a = fabric.tier(upper)[a];
            let b = fabric.tier(lower)[b];
            join(ctx, fabric, a, b, pass.pair).await?;
        }
        tracing::info!(
            "Wired {}: {} cables",
            pass.pair.as_str(),
            fabric.cables.len() - before
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{MemoryInventory, ResourceKind};
    use crate::pricing::{DistanceTable, PriceTable};
    use crate::topology::devices::create_tier;
    use crate::topology::racks::create_racks;
    use crate::topology::sizing::TierModels;
    use std::collections::HashSet;

    #[test]
    fn test_core_aggregation_alternates_halves() {
        let links = core_aggregation_links(4, 4);
        assert_eq!(
            links,
            vec![(0, 0), (1, 0), (2, 1), (3, 1), (0, 2), (1, 2), (2, 3), (3, 3)]
        );
    }

    #[test]
    fn test_core_aggregation_odd_core_count() {
        // second half takes the extra core
        let links = core_aggregation_links(3, 2);
        assert_eq!(links, vec![(0, 0), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_core_edge_round_robin_per_pod() {
        // 2 pods of 3 edges, 4 cores
        let links = core_edge_links(4, 6, 2);
        assert_eq!(
            links,
            vec![(0, 0), (0, 3), (1, 1), (1, 4), (2, 2), (2, 5), (3, 0), (3, 3)]
        );
    }

    #[test]
    fn test_aggregation_edge_mesh_is_pod_local() {
        let links = aggregation_edge_links(4, 4, 2);
        assert_eq!(links, vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)]);
    }

    #[test]
    fn test_edge_host_blocks_drop_remainder() {
        let links = edge_host_links(3, 8);
        assert_eq!(links, vec![(0, 0), (0, 1), (1, 2), (1, 3), (2, 4), (2, 5)]);
        let attached: HashSet<_> = links.iter().map(|(_, h)| *h).collect();
        assert!(!attached.contains(&6) && !attached.contains(&7));
    }

    #[test]
    fn test_zero_divisors_yield_no_links() {
        assert!(core_edge_links(2, 4, 0).is_empty());
        assert!(core_edge_links(2, 1, 2).is_empty());
        assert!(aggregation_edge_links(2, 2, 0).is_empty());
        assert!(edge_host_links(0, 8).is_empty());
    }

    async fn fabric_with(
        ctx: &PlanContext<'_>,
        rack_height: u32,
        racks: usize,
        tiers: &[(Tier, usize, usize)],
    ) -> Fabric {
        let mut fabric = Fabric::default();
        fabric.racks = create_racks(ctx, racks, rack_height).await.unwrap();
        for &(tier, count, ports) in tiers {
            create_tier(ctx, &mut fabric, tier, count, ports).await.unwrap();
        }
        fabric
    }

    #[tokio::test]
    async fn test_join_same_rack_and_cross_rack_lengths() {
        let inv = MemoryInventory::new();
        let prices = PriceTable::default();
        let distances = DistanceTable::default();
        let models = TierModels::default();
        let ctx = PlanContext::setup(&inv, &prices, &distances, &models, "site", "cisco").await.unwrap();

        // rack height 2: edge_switch_1 + host_1 share rack_1, host_2 lands in rack_2
        let mut fabric = fabric_with(&ctx, 2, 2, &[(Tier::Edge, 1, 2), (Tier::Host, 2, 1)]).await;
        let edge = fabric.edge[0];
        let (h1, h2) = (fabric.hosts[0], fabric.hosts[1]);

        let c1 = join(&ctx, &mut fabric, edge, h1, TierPair::EdgeHost).await.unwrap();
        let c2 = join(&ctx, &mut fabric, edge, h2, TierPair::EdgeHost).await.unwrap();

        assert_eq!(fabric.cables[c1].length, SAME_RACK_LENGTH);
        assert_eq!(fabric.cables[c2].length, distances.edge_to_host);
        assert!((fabric.cables[c2].priceable.price - 10.0 * 5.79).abs() < 1e-9);
        assert_eq!(fabric.cables[c1].priceable.description, "edge_switch_1int1 - host_1int1");

        let stored = inv.get(ResourceKind::Cable, fabric.cables[c2].id).await.unwrap();
        assert_eq!(stored["length"], 10.0);
        assert_eq!(fabric.degree(edge), 2);
    }

    #[tokio::test]
    async fn test_join_fails_when_interfaces_exhausted() {
        let inv = MemoryInventory::new();
        let prices = PriceTable::default();
        let distances = DistanceTable::default();
        let models = TierModels::default();
        let ctx = PlanContext::setup(&inv, &prices, &distances, &models, "site", "cisco").await.unwrap();

        let mut fabric = fabric_with(&ctx, 42, 1, &[(Tier::Edge, 1, 1), (Tier::Host, 2, 1)]).await;
        let edge = fabric.edge[0];
        let (h1, h2) = (fabric.hosts[0], fabric.hosts[1]);
        join(&ctx, &mut fabric, edge, h1, TierPair::EdgeHost).await.unwrap();

        let err = join(&ctx, &mut fabric, edge, h2, TierPair::EdgeHost).await.unwrap_err();
        assert_eq!(err.code(), "CAPACITY");
        assert!(err.to_string().contains("edge_switch_1"));
        // failed join consumed nothing
        assert!(fabric.device(h2).interfaces[0].is_open);
        assert_eq!(inv.count(ResourceKind::Cable).await, 1);
    }

    #[tokio::test]
    async fn test_join_backend_failure_keeps_interfaces_open() {
        let inv = MemoryInventory::fail_after(ResourceKind::Cable, 0);
        let prices = PriceTable::default();
        let distances = DistanceTable::default();
        let models = TierModels::default();
        let ctx = PlanContext::setup(&inv, &prices, &distances, &models, "site", "cisco").await.unwrap();

        let mut fabric = fabric_with(&ctx, 42, 1, &[(Tier::Edge, 1, 1), (Tier::Host, 1, 1)]).await;
        let (edge, host) = (fabric.edge[0], fabric.hosts[0]);
        let err = join(&ctx, &mut fabric, edge, host, TierPair::EdgeHost).await.unwrap_err();
        assert_eq!(err.code(), "BACKEND");
        assert!(err.to_string().contains("create_cable"));
        assert!(fabric.cables.is_empty());
        assert_eq!(fabric.device(edge).open_interfaces(), 1);
    }

    #[tokio::test]
    async fn test_wire_follows_pass_order() {
        let inv = MemoryInventory::new();
        let prices = PriceTable::default();
        let distances = DistanceTable::default();
        let models = TierModels::default();
        let ctx = PlanContext::setup(&inv, &prices, &distances, &models, "site", "cisco").await.unwrap();

        let mut fabric = fabric_with(&ctx, 42, 1, &[(Tier::Core, 2, 4), (Tier::Edge, 4, 4), (Tier::Host, 8, 1)]).await;
        let passes = vec![
            LinkPass { pair: TierPair::CoreEdge, links: core_edge_links(2, 4, 1) },
            LinkPass { pair: TierPair::EdgeHost, links: edge_host_links(4, 8) },
        ];
        wire(&ctx, &mut fabric, &passes).await.unwrap();

        assert_eq!(fabric.cables.len(), 2 + 8);
        assert!(fabric.cables[..2].iter().all(|c| c.pair == TierPair::CoreEdge));
        assert!(fabric.cables[2..].iter().all(|c| c.pair == TierPair::EdgeHost));
        // single rack: every cable is a unit-length patch
        assert!(fabric.cables.iter().all(|c| c.length == SAME_RACK_LENGTH));

        let first = &fabric.cables[0].endpoints;
        assert_eq!(fabric.device(first[0].device).name, "core_switch_1");
        assert_eq!(fabric.device(first[1].device).name, "edge_switch_1");
    }
}
