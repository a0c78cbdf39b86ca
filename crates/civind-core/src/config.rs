//! Tunable constants for the economy.
//!
//! Defaults match the stock civilian industry; a JSON file may override any
//! subset of fields.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndustryConfig {
    // Stations
    pub grand_station_capacity: i32,
    /// Goods rate a new grand station starts with
    pub grand_station_initial_goods_rate: i32,
    /// Recomputed rate: base + per_trade_station * trade stations
    pub grand_goods_base_rate: i32,
    pub grand_goods_per_trade_station: i32,
    pub trade_station_capacity: i32,
    /// Goods drained from every trade station each second
    pub trade_station_upkeep: i32,
    /// Metal rate added per metal producer on the station's planet
    pub metal_per_producer: i32,

    // Cargo logistics
    pub cargo_ship_capacity: i32,
    pub min_cargo_ships: usize,
    /// Docking proximity
    pub dock_range: i64,
    /// Seconds a ship stays docked
    pub load_time: i32,
    /// Units moved per resource per second while docked
    pub transfer_per_tick: i32,
    pub trade_hop_limit: u32,

    // Militia
    pub militia_cargo_capacity: i32,
    pub outpost_capacity: i32,
    /// Per-resource consumption of a deployed militia
    pub militia_upkeep: i32,
    /// Distance at which a pathing fleet reaches its staging station
    pub staging_range: i64,
    pub militia_max_range: i64,
    pub tractor_range: i64,
    /// How far from the outpost, toward the wormhole, turrets are placed
    pub turret_offset: i64,

    // Placement
    pub placement_radius_start: i64,
    pub placement_radius_growth: i64,
    pub placement_attempts: u32,

    // Cadence
    pub planning_interval_seconds: u32,
}

impl Default for IndustryConfig {
    fn default() -> Self {
        Self {
            grand_station_capacity: 10_000,
            grand_station_initial_goods_rate: 10,
            grand_goods_base_rate: 5,
            grand_goods_per_trade_station: 5,
            trade_station_capacity: 1_000,
            trade_station_upkeep: 1,
            metal_per_producer: 1,
            cargo_ship_capacity: 100,
            min_cargo_ships: 10,
            dock_range: 2_000,
            load_time: 120,
            transfer_per_tick: 1,
            trade_hop_limit: 10,
            militia_cargo_capacity: 500,
            outpost_capacity: 2_000,
            militia_upkeep: 1,
            staging_range: 500,
            militia_max_range: 12_000,
            tractor_range: 3_000,
            turret_offset: 1_500,
            placement_radius_start: 1_000,
            placement_radius_growth: 2,
            placement_attempts: 6,
            planning_interval_seconds: 4,
        }
    }
}

impl IndustryConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("grand_station_capacity", self.grand_station_capacity as i64),
            ("trade_station_capacity", self.trade_station_capacity as i64),
            ("cargo_ship_capacity", self.cargo_ship_capacity as i64),
            ("outpost_capacity", self.outpost_capacity as i64),
            ("dock_range", self.dock_range),
            ("load_time", self.load_time as i64),
            ("transfer_per_tick", self.transfer_per_tick as i64),
            ("staging_range", self.staging_range),
            ("militia_max_range", self.militia_max_range),
            ("placement_radius_start", self.placement_radius_start),
            ("placement_attempts", self.placement_attempts as i64),
            ("planning_interval_seconds", self.planning_interval_seconds as i64),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value <= 0) {
            return Err(ConfigError::Invalid(format!("{} must be positive", name)));
        }
        if self.placement_radius_growth < 2 {
            return Err(ConfigError::Invalid(
                "placement_radius_growth must be at least 2".into(),
            ));
        }
        Ok(())
    }
}
