use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

use super::cost::{fabric_categories, round2, CableTypeSummary, CategorySummary, CostReport};
use super::model::Fabric;
use super::planner::PlanOutcome;
use super::sizing::TierPlan;

/// JSON view of a completed run
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub plan: &'a TierPlan,
    pub racks: usize,
    pub devices: usize,
    pub cables: usize,
    pub cost: &'a CostReport,
}

impl<'a> JsonReport<'a> {
    pub fn from_outcome(outcome: &'a PlanOutcome) -> Self {
        Self {
            generated_at: outcome.generated_at,
            plan: &outcome.plan,
            racks: outcome.fabric.racks.len(),
            devices: outcome.fabric.devices.len(),
            cables: outcome.fabric.cables.len(),
            cost: &outcome.cost,
        }
    }
}

/// Plain-text report: every priced entity, then the summary table, then the
/// grand total.
pub fn render_text(fabric: &Fabric, cost: &CostReport) -> String {
    let mut out = String::new();

    for (category, items) in fabric_categories(fabric) {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "== {} ==", category);
        for item in items {
            let _ = writeln!(out, "{} ({}): {:.2}", item.name, item.description, item.price);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "== summary ==");
    for summary in &cost.categories {
        write_category_line(&mut out, summary);
        if summary.category == "cables" {
            for group in &cost.cable_types {
                write_cable_type_line(&mut out, group);
            }
        }
    }
    let _ = writeln!(out, "TOTAL: {:.2}", cost.grand_total_rounded());
    out
}

fn write_category_line(out: &mut String, summary: &CategorySummary) {
    let _ = writeln!(
        out,
        "{:<12} {:>5} x {:>10.2} = {:>12.2}",
        summary.category,
        summary.count,
        summary.unit_price,
        round2(summary.total)
    );
}

fn write_cable_type_line(out: &mut String, group: &CableTypeSummary) {
    let _ = writeln!(
        out,
        "  {:<10} {:>5} cables, {:>8.1} m = {:>12.2}",
        group.cable_type,
        group.count,
        group.total_length,
        round2(group.total_price)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::MemoryInventory;
    use crate::pricing::{DistanceTable, PriceTable};
    use crate::topology::planner::Planner;
    use crate::topology::sizing::{RemainderPolicy, SizingPolicy, TierModels, TopologyParams};

    async fn two_level_outcome() -> PlanOutcome {
        let inv = MemoryInventory::new();
        let prices = PriceTable::default();
        let distances = DistanceTable::default();
        let params = TopologyParams {
            sizing: SizingPolicy::FixedFanout {
                tree_level: 2,
                ports_per_switch: 4,
            },
            rack_height: 42,
            pod_size: 4,
            remainder: RemainderPolicy::Reject,
            models: TierModels::default(),
        };
        Planner::new(&inv, &prices, &distances).run(&params).await.unwrap()
    }

    #[tokio::test]
    async fn test_text_report_lines() {
        let outcome = two_level_outcome().await;
        let text = render_text(&outcome.fabric, &outcome.cost);

        assert!(text.contains("rack_1 (42U): 2000.00"));
        assert!(text.contains("core_switch_1 (generic_switch): 8500.00"));
        assert!(text.contains("host_8 (dell_poweredge_r450_xs): 19399.00"));
        assert!(text.contains("cable_1 (core_switch_1int1 - edge_switch_1int1): 5.79"));
        // two-level fabric has no aggregation section
        assert!(!text.contains("== aggregation =="));
        assert!(text.contains("rj45_cat_7"));

        // 1 rack + 6 switches + 8 hosts + 10 unit-length cables
        let expected = 2000.0 + 6.0 * 8500.0 + 8.0 * 19399.0 + 10.0 * 5.79;
        assert_eq!(outcome.cost.grand_total_rounded(), round2(expected));
        assert!(text.ends_with(&format!("TOTAL: {:.2}\n", round2(expected))));
    }

    #[tokio::test]
    async fn test_json_report_shape() {
        let outcome = two_level_outcome().await;
        let value = serde_json::to_value(JsonReport::from_outcome(&outcome)).unwrap();
        assert_eq!(value["plan"]["policy"], "fixed_fanout");
        assert_eq!(value["plan"]["core"], 2);
        assert_eq!(value["devices"], 14);
        assert_eq!(value["cables"], 10);
        assert_eq!(value["cost"]["cable_types"][0]["total_length"], 10.0);
        assert!(value["generated_at"].is_string());
    }
}
