use serde::{Deserialize, Serialize};
use std::fmt;

/// Topology tier, in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Core,
    Aggregation,
    Edge,
    Host,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Core, Tier::Aggregation, Tier::Edge, Tier::Host];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Core => "core",
            Tier::Aggregation => "aggregation",
            Tier::Edge => "edge",
            Tier::Host => "host",
        }
    }

    /// Device role name registered in the inventory
    pub fn role_name(&self) -> String {
        format!("{}_role", self.as_str())
    }

    /// Deterministic device name, e.g. `edge_switch_3` or `host_12`
    pub fn device_name(&self, index: usize) -> String {
        match self {
            Tier::Host => format!("host_{}", index + 1),
            _ => format!("{}_switch_{}", self.as_str(), index + 1),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pair of adjacent tiers joined by a cabling pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierPair {
    CoreAggregation,
    CoreEdge,
    AggregationEdge,
    EdgeHost,
}

impl TierPair {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierPair::CoreAggregation => "core-aggregation",
            TierPair::CoreEdge => "core-edge",
            TierPair::AggregationEdge => "aggregation-edge",
            TierPair::EdgeHost => "edge-host",
        }
    }

    /// (upper, lower) tiers joined by this pass
    pub fn tiers(&self) -> (Tier, Tier) {
        match self {
            TierPair::CoreAggregation => (Tier::Core, Tier::Aggregation),
            TierPair::CoreEdge => (Tier::Core, Tier::Edge),
            TierPair::AggregationEdge => (Tier::Aggregation, Tier::Edge),
            TierPair::EdgeHost => (Tier::Edge, Tier::Host),
        }
    }
}

/// Name, description and price shared by every costed entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Priceable {
    pub name: String,
    pub description: String,
    pub price: f64,
}

impl Priceable {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
        }
    }
}

/// Index of a rack in [`Fabric::racks`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RackIdx(pub usize);

/// Index of a device in [`Fabric::devices`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceIdx(pub usize);

/// One interface slot of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct InterfaceRef {
    pub device: DeviceIdx,
    pub interface: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Interface {
    pub id: i64,
    pub name: String,
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
    pub tier: Tier,
    pub model: String,
    pub interfaces: Vec<Interface>,
    pub rack: RackIdx,
    /// 1-based slot in the rack
    pub position: u32,
    pub priceable: Priceable,
}

impl Device {
    /// Index of the first open interface, in creation order
    pub fn first_open_interface(&self) -> Option<usize> {
        self.interfaces.iter().position(|i| i.is_open)
    }

    pub fn open_interfaces(&self) -> usize {
        self.interfaces.iter().filter(|i| i.is_open).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Rack {
    pub id: i64,
    pub name: String,
    pub height: u32,
    /// Slot order; never reordered
    pub devices: Vec<DeviceIdx>,
    pub priceable: Priceable,
}

impl Rack {
    pub fn has_room(&self) -> bool {
        (self.devices.len() as u32) < self.height
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Cable {
    pub id: i64,
    pub cable_type: String,
    pub pair: TierPair,
    pub length: f64,
    pub price_per_meter: f64,
    pub endpoints: [InterfaceRef; 2],
    pub priceable: Priceable,
}

/// Arena holding everything a planning run creates.
///
/// Devices refer to racks and cables refer to interfaces by index, so the
/// arena is the only owner.
#[derive(Debug, Default, Serialize)]
pub struct Fabric {
    pub racks: Vec<Rack>,
    pub devices: Vec<Device>,
    pub cables: Vec<Cable>,
    pub core: Vec<DeviceIdx>,
    pub aggregation: Vec<DeviceIdx>,
    pub edge: Vec<DeviceIdx>,
    pub hosts: Vec<DeviceIdx>,
}

impl Fabric {
    pub fn device(&self, idx: DeviceIdx) -> &Device {
        &self.devices[idx.0]
    }

    pub fn tier(&self, tier: Tier) -> &[DeviceIdx] {
        match tier {
            Tier::Core => &self.core,
            Tier::Aggregation => &self.aggregation,
            Tier::Edge => &self.edge,
            Tier::Host => &self.hosts,
        }
    }

    pub(crate) fn tier_mut(&mut self, tier: Tier) -> &mut Vec<DeviceIdx> {
        match tier {
            Tier::Core => &mut self.core,
            Tier::Aggregation => &mut self.aggregation,
            Tier::Edge => &mut self.edge,
            Tier::Host => &mut self.hosts,
        }
    }

    pub fn same_rack(&self, a: DeviceIdx, b: DeviceIdx) -> bool {
        self.device(a).rack == self.device(b).rack
    }

    /// Number of cables attached to a device
    pub fn degree(&self, idx: DeviceIdx) -> usize {
        let dev = self.device(idx);
        dev.interfaces.len() - dev.open_interfaces()
    }
}
