//! Per-world and per-faction economy records.

use super::common::{EntityId, FactionId, PlanetId};
use serde::{Deserialize, Serialize};

/// Factions with an active civilian industry. Append-only, deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldRegistry {
    pub factions: Vec<FactionId>,
}

impl WorldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the faction was not yet registered.
    pub fn register(&mut self, faction: FactionId) -> bool {
        if self.factions.contains(&faction) {
            return false;
        }
        self.factions.push(faction);
        true
    }
}

/// Per-planet threat values stored as parallel lists, keyed by planet.
///
/// Entries are inserted lazily the first time a planet is touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatTable {
    planets: Vec<PlanetId>,
    threat: Vec<i32>,
    processed: Vec<bool>,
}

impl ThreatTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, planet: PlanetId) -> usize {
        match self.planets.iter().position(|p| *p == planet) {
            Some(index) => index,
            None => {
                self.planets.push(planet);
                self.threat.push(0);
                self.processed.push(false);
                self.planets.len() - 1
            }
        }
    }

    pub fn len(&self) -> usize {
        self.planets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planets.is_empty()
    }

    /// Threat for `planet`; untouched planets are 0.
    pub fn get(&self, planet: PlanetId) -> i32 {
        self.planets
            .iter()
            .position(|p| *p == planet)
            .map(|index| self.threat[index])
            .unwrap_or(0)
    }

    pub fn is_processed(&self, planet: PlanetId) -> bool {
        self.planets
            .iter()
            .position(|p| *p == planet)
            .map(|index| self.processed[index])
            .unwrap_or(false)
    }

    /// Store a value and mark it processed for this tick.
    pub fn record(&mut self, planet: PlanetId, threat: i32) {
        let index = self.slot(planet);
        self.threat[index] = threat;
        self.processed[index] = true;
    }

    pub fn reset_processed(&mut self) {
        self.processed.iter_mut().for_each(|flag| *flag = false);
    }

    /// Planets scored during the current tick, in insertion order.
    pub fn processed_entries(&self) -> impl Iterator<Item = (PlanetId, i32)> + '_ {
        self.planets
            .iter()
            .zip(&self.threat)
            .zip(&self.processed)
            .filter(|(_, processed)| **processed)
            .map(|((planet, threat), _)| (*planet, *threat))
    }

    pub fn entries(&self) -> impl Iterator<Item = (PlanetId, i32)> + '_ {
        self.planets.iter().copied().zip(self.threat.iter().copied())
    }
}

/// Everything one faction's civilian industry owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionEconomy {
    pub faction: FactionId,
    pub grand_station: Option<EntityId>,
    pub trade_stations: Vec<EntityId>,
    pub cargo_ships: Vec<EntityId>,
    /// Grand station, trade stations and deployed militia.
    pub resource_points: Vec<EntityId>,
    pub militia_leaders: Vec<EntityId>,
    /// Accumulated unmet trade urgency ("need more ships").
    pub build_counter: i32,
    /// Accumulated undefended threat ("need more militia").
    pub militia_counter: i32,
    pub threat: ThreatTable,
}

fn insert_unique(list: &mut Vec<EntityId>, id: EntityId) -> bool {
    if list.contains(&id) {
        return false;
    }
    list.push(id);
    true
}

impl FactionEconomy {
    pub fn new(faction: FactionId) -> Self {
        Self {
            faction,
            grand_station: None,
            trade_stations: Vec::new(),
            cargo_ships: Vec::new(),
            resource_points: Vec::new(),
            militia_leaders: Vec::new(),
            build_counter: 0,
            militia_counter: 0,
            threat: ThreatTable::new(),
        }
    }

    pub fn add_trade_station(&mut self, id: EntityId) {
        insert_unique(&mut self.trade_stations, id);
        insert_unique(&mut self.resource_points, id);
    }

    pub fn add_cargo_ship(&mut self, id: EntityId) {
        insert_unique(&mut self.cargo_ships, id);
    }

    pub fn add_militia_leader(&mut self, id: EntityId) {
        insert_unique(&mut self.militia_leaders, id);
    }

    pub fn add_resource_point(&mut self, id: EntityId) -> bool {
        insert_unique(&mut self.resource_points, id)
    }

    /// Swap a militia leader for the entity that replaced it, keeping its slot.
    pub fn replace_militia_leader(&mut self, old: EntityId, new: EntityId) {
        match self.militia_leaders.iter().position(|id| *id == old) {
            Some(index) if !self.militia_leaders.contains(&new) => self.militia_leaders[index] = new,
            Some(index) => {
                self.militia_leaders.remove(index);
            }
            None => {
                insert_unique(&mut self.militia_leaders, new);
            }
        }
        self.resource_points.retain(|id| *id != old);
    }

    /// Drop every reference to `id`. Returns true if anything was removed.
    pub fn forget(&mut self, id: EntityId) -> bool {
        let before = self.trade_stations.len()
            + self.cargo_ships.len()
            + self.resource_points.len()
            + self.militia_leaders.len();
        self.trade_stations.retain(|x| *x != id);
        self.cargo_ships.retain(|x| *x != id);
        self.resource_points.retain(|x| *x != id);
        self.militia_leaders.retain(|x| *x != id);
        let mut removed = before
            != self.trade_stations.len()
                + self.cargo_ships.len()
                + self.resource_points.len()
                + self.militia_leaders.len();
        if self.grand_station == Some(id) {
            self.grand_station = None;
            removed = true;
        }
        removed
    }

    /// Grand station first, then trade stations in creation order.
    pub fn stations(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.grand_station
            .into_iter()
            .chain(self.trade_stations.iter().copied())
    }

    pub fn add_build_points(&mut self, points: i32) {
        self.build_counter = self.build_counter.saturating_add(points);
    }

    pub fn add_militia_points(&mut self, points: i32) {
        self.militia_counter = self.militia_counter.saturating_add(points);
    }
}
