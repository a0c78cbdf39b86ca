//! Systems - logic that operates on a faction economy and its records.
//!
//! Every system takes the faction's [`FactionEconomy`] plus a
//! [`TickContext`]. Ids that no longer resolve are pruned where they are
//! first touched and the system moves on.

mod cargo;
mod militia;
mod planning;
mod resources;
mod scaling;
mod spawning;
mod stations;
mod threat;
mod trade;

pub use cargo::*;
pub use militia::*;
pub use planning::*;
pub use resources::*;
pub use scaling::*;
pub use spawning::*;
pub use stations::*;
pub use threat::*;
pub use trade::*;

use crate::components::{EntityId, FactionEconomy, PlanetId, Point, UnitKind};
use crate::config::IndustryConfig;
use crate::host::{HostView, HostWorld, SpawnRequest, UnitBehavior};
use crate::store::ComponentStore;

/// Everything a system needs besides the economy it is working on.
pub struct TickContext<'a, H: HostWorld> {
    pub host: &'a mut H,
    pub store: &'a mut ComponentStore,
    pub config: &'a IndustryConfig,
    pub scaling: FactionScaling,
}

impl<'a, H: HostWorld> TickContext<'a, H> {
    pub fn new(host: &'a mut H, store: &'a mut ComponentStore, config: &'a IndustryConfig) -> Self {
        Self {
            host,
            store,
            config,
            scaling: FactionScaling::default(),
        }
    }
}

/// Remove a dead id from the economy and destroy its records.
pub(crate) fn prune(economy: &mut FactionEconomy, store: &mut ComponentStore, id: EntityId) {
    if economy.forget(id) {
        log::trace!("{}: pruned stale {}", economy.faction, id);
    }
    store.remove(id);
}

/// Growing-radius safe-point search followed by a spawn.
pub(crate) fn place_unit<H: HostWorld>(
    economy: &FactionEconomy,
    host: &mut H,
    config: &IndustryConfig,
    kind: UnitKind,
    planet: PlanetId,
    anchor: Point,
    behavior: UnitBehavior,
) -> Option<EntityId> {
    let point = find_placement(host, config, kind, planet, anchor)?;
    let spawned = host.spawn(SpawnRequest {
        kind,
        faction: economy.faction,
        planet,
        point,
        behavior,
    });
    if spawned.is_none() {
        log::warn!(
            "{}: host refused to spawn {} on {}",
            economy.faction,
            kind.type_name(),
            planet
        );
    }
    spawned
}

pub(crate) fn find_placement<H: HostView>(
    host: &H,
    config: &IndustryConfig,
    kind: UnitKind,
    planet: PlanetId,
    anchor: Point,
) -> Option<Point> {
    let mut radius = config.placement_radius_start.max(kind.descriptor().placement_radius);
    for _ in 0..config.placement_attempts {
        if let Some(point) = host.find_safe_point(kind, planet, anchor, radius) {
            return Some(point);
        }
        radius = radius.saturating_mul(config.placement_radius_growth);
    }
    log::warn!(
        "no safe point for {} near ({}, {}) on {}",
        kind.type_name(),
        anchor.x,
        anchor.y,
        planet
    );
    None
}
