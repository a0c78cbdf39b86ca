//! Capacity and cost formulas driven by the hostile AI's difficulty.

use crate::host::HostileFaction;

/// Per-faction scaling derived from every hostile AI faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactionScaling {
    /// Highest hostile intensity, clamped to 1..=10
    pub intensity: i32,
    /// Trade urgency that buys one more cargo ship
    pub request_points_per_ship: i32,
    /// Base processed-resource cost of one militia unit
    pub resource_cost: i32,
    /// Per-type cap on militia units
    pub unit_cap: i32,
}

pub fn request_points_per_ship(intensity: i32) -> i32 {
    (11 - intensity) * 10
}

pub fn resource_cost(intensity: i32) -> i32 {
    50 - (intensity as f64).powf(1.5).floor() as i32
}

/// `max(10 + progress / 10)` over hostile factions; 10 with none.
pub fn unit_cap(hostiles: &[HostileFaction]) -> i32 {
    hostiles
        .iter()
        .map(|h| 10 + h.progress / 10)
        .max()
        .unwrap_or(10)
}

impl FactionScaling {
    pub fn from_hostiles(hostiles: &[HostileFaction]) -> Self {
        let intensity = hostiles
            .iter()
            .map(|h| h.intensity)
            .max()
            .unwrap_or(1)
            .clamp(1, 10);
        Self {
            intensity,
            request_points_per_ship: request_points_per_ship(intensity),
            resource_cost: resource_cost(intensity),
            unit_cap: unit_cap(hostiles),
        }
    }
}

impl Default for FactionScaling {
    fn default() -> Self {
        Self::from_hostiles(&[])
    }
}
