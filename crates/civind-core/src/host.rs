//! Interface to the host strategy simulation.
//!
//! The economy never owns entities, planets or pathfinding. It reads them
//! through [`HostView`] and changes the host only through [`HostWorld`].
//! The planning pass is handed a `HostView` alone, so it cannot mutate.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, FactionId, PlanetId, Point, UnitKind};

/// Host-side classification of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityClass {
    /// Faction capital; anchors the grand station
    King,
    /// Command-center-class structure; anchors a trade station
    CommandCenter,
    /// Metal-producing structure; drives trade-station metal rates
    MetalProducer,
    Wormhole,
    /// A unit spawned by the economy
    Industry(UnitKind),
    Other,
}

/// Snapshot of a live host entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityInfo {
    pub id: EntityId,
    pub faction: FactionId,
    pub planet: PlanetId,
    pub position: Point,
    pub class: EntityClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanetInfo {
    pub id: PlanetId,
    pub controller: Option<FactionId>,
}

impl PlanetInfo {
    pub fn is_controlled_by(&self, faction: FactionId) -> bool {
        self.controller == Some(faction)
    }
}

/// Military strength on a planet, split by stance relative to a viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrengthReport {
    pub hostile: i64,
    pub friendly: i64,
}

/// An AI faction hostile to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostileFaction {
    pub id: FactionId,
    /// Difficulty intensity, 1..=10
    pub intensity: i32,
    /// AI progress
    pub progress: i32,
}

/// A queued attack wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wave {
    pub target: PlanetId,
    pub strength: i64,
}

/// Standing orders a freshly spawned unit starts with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitBehavior {
    #[default]
    Hold,
    AttackEverything,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRequest {
    pub kind: UnitKind,
    pub faction: FactionId,
    pub planet: PlanetId,
    pub point: Point,
    pub behavior: UnitBehavior,
}

/// Movement order emitted by the planning pass and applied by the host later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementIntent {
    MoveToPoint { unit: EntityId, point: Point },
    WormholePath { unit: EntityId, destination: PlanetId },
}

impl MovementIntent {
    pub fn unit(&self) -> EntityId {
        match self {
            MovementIntent::MoveToPoint { unit, .. } | MovementIntent::WormholePath { unit, .. } => *unit,
        }
    }
}

/// Read-only host queries.
pub trait HostView {
    /// Live entity by id; `None` once it has died.
    fn entity(&self, id: EntityId) -> Option<EntityInfo>;

    fn planet(&self, id: PlanetId) -> Option<PlanetInfo>;

    /// Wormhole jumps between two planets; `None` if unreachable.
    fn hops(&self, from: PlanetId, to: PlanetId) -> Option<u32>;

    /// Accurate same-planet distance.
    fn distance(&self, a: Point, b: Point) -> i64 {
        a.distance(&b)
    }

    /// Cheap same-planet distance for ranking.
    fn distance_approx(&self, a: Point, b: Point) -> i64 {
        a.approx_distance(&b)
    }

    fn linked_planets(&self, planet: PlanetId) -> Vec<PlanetId>;

    /// The wormhole on `from` that leads to `to`.
    fn wormhole(&self, from: PlanetId, to: PlanetId) -> Option<EntityId>;

    fn strength(&self, planet: PlanetId, viewer: FactionId) -> StrengthReport;

    fn hostile_factions(&self, faction: FactionId) -> Vec<HostileFaction>;

    /// Waves queued by one AI faction.
    fn queued_waves(&self, ai_faction: FactionId) -> Vec<Wave>;

    /// Units of `kind` in the fleet led by `fleet`. Zero if no such group.
    fn fleet_count(&self, fleet: EntityId, kind: UnitKind) -> u32;

    fn entities_of(&self, faction: FactionId, class: EntityClass) -> Vec<EntityId>;

    /// Player factions that should run a civilian industry.
    fn player_factions(&self) -> Vec<FactionId>;

    /// A free point for `kind` within `radius` of `anchor`.
    fn find_safe_point(&self, kind: UnitKind, planet: PlanetId, anchor: Point, radius: i64) -> Option<Point>;
}

/// Host mutations, available to the authoritative tick only.
pub trait HostWorld: HostView {
    fn spawn(&mut self, request: SpawnRequest) -> Option<EntityId>;

    fn despawn(&mut self, id: EntityId);

    fn add_to_fleet(&mut self, fleet: EntityId, unit: EntityId);

    /// Re-home every member of `from`'s fleet under `to`.
    fn transfer_fleet(&mut self, from: EntityId, to: EntityId);

    /// Queue a movement order; the host applies it at its own boundary.
    fn enqueue(&mut self, intent: MovementIntent);
}
