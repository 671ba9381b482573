use serde::Serialize;

use super::model::{Cable, Fabric, Priceable, Tier};

/// Roll-up of one category of priced entities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub count: usize,
    /// Price of the last entity processed; categories are price-homogeneous
    pub unit_price: f64,
    pub total: f64,
}

/// Cable totals for one cable type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CableTypeSummary {
    pub cable_type: String,
    pub count: usize,
    pub total_length: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostReport {
    pub categories: Vec<CategorySummary>,
    pub cable_types: Vec<CableTypeSummary>,
    pub grand_total: f64,
}

impl CostReport {
    #[cfg(test)]
    pub fn category(&self, name: &str) -> Option<&CategorySummary> {
        self.categories.iter().find(|c| c.category == name)
    }

    /// Grand total rounded for display
    pub fn grand_total_rounded(&self) -> f64 {
        round2(self.grand_total)
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn summarize_category<'a>(category: &str, items: impl IntoIterator<Item = &'a Priceable>) -> CategorySummary {
    let mut summary = CategorySummary {
        category: category.to_string(),
        count: 0,
        unit_price: 0.0,
        total: 0.0,
    };
    for item in items {
        summary.count += 1;
        summary.total += item.price;
        summary.unit_price = item.price;
    }
    summary
}

/// Group cables by type, in order of first appearance
pub fn summarize_cables(cables: &[Cable]) -> Vec<CableTypeSummary> {
    let mut groups: Vec<CableTypeSummary> = Vec::new();
    for cable in cables {
        let group = match groups.iter().position(|g| g.cable_type == cable.cable_type) {
            Some(i) => &mut groups[i],
            None => {
                groups.push(CableTypeSummary {
                    cable_type: cable.cable_type.clone(),
                    count: 0,
                    total_length: 0.0,
                    total_price: 0.0,
                });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };
        group.count += 1;
        group.total_length += cable.length;
        group.total_price += cable.priceable.price;
    }
    groups
}

/// Category name used in reports for a device tier
pub fn tier_category(tier: Tier) -> &'static str {
    match tier {
        Tier::Core => "core",
        Tier::Aggregation => "aggregation",
        Tier::Edge => "edge",
        Tier::Host => "hosts",
    }
}

/// Priced entities of a fabric grouped by category, in report order:
/// racks, each device tier, cables.
pub fn fabric_categories(fabric: &Fabric) -> Vec<(&'static str, Vec<&Priceable>)> {
    let mut categories = Vec::with_capacity(6);
    categories.push(("racks", fabric.racks.iter().map(|r| &r.priceable).collect()));
    for tier in Tier::ALL {
        let items = fabric
            .tier(tier)
            .iter()
            .map(|d| &fabric.device(*d).priceable)
            .collect();
        categories.push((tier_category(tier), items));
    }
    categories.push(("cables", fabric.cables.iter().map(|c| &c.priceable).collect()));
    categories
}

pub fn aggregate(categories: &[(&str, Vec<&Priceable>)], cables: &[Cable]) -> CostReport {
    let categories: Vec<CategorySummary> = categories
        .iter()
        .map(|(name, items)| summarize_category(name, items.iter().copied()))
        .collect();
    let grand_total = categories.iter().map(|c| c.total).sum();
    CostReport {
        categories,
        cable_types: summarize_cables(cables),
        grand_total,
    }
}

pub fn cost_report(fabric: &Fabric) -> CostReport {
    aggregate(&fabric_categories(fabric), &fabric.cables)
}
