//! Fat-tree planning: sizing, rack placement, device creation, cabling and
//! costing, in that order.

pub mod cabling;
pub mod cost;
pub mod devices;
pub mod model;
pub mod planner;
pub mod racks;
pub mod report;
pub mod sizing;

pub use planner::{cleanup, PlanOutcome, Planner};
