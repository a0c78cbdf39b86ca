//! Cargo ship and militia leader spawning.

use super::{place_unit, prune, TickContext};
use crate::components::{EntityId, FactionEconomy, MilitiaUnit, ResourceKind, ResourceLedger, ShipStatus, UnitKind};
use crate::host::{EntityInfo, HostView, HostWorld, UnitBehavior};

fn cargo_ledger(capacity: i32) -> ResourceLedger {
    ResourceKind::ALL
        .iter()
        .fold(ResourceLedger::new(), |ledger, &kind| ledger.with_resource(kind, 0, capacity, 0))
}

fn live_grand_station<H: HostView>(economy: &FactionEconomy, host: &H) -> Option<EntityInfo> {
    economy.grand_station.and_then(|id| host.entity(id))
}

fn spawn_at_grand_station<H: HostWorld>(
    economy: &FactionEconomy,
    ctx: &mut TickContext<'_, H>,
    kind: UnitKind,
) -> Option<EntityId> {
    let grand = live_grand_station(economy, &*ctx.host)?;
    place_unit(
        economy,
        ctx.host,
        ctx.config,
        kind,
        grand.planet,
        grand.position,
        UnitBehavior::Hold,
    )
}

/// Spawn at most one cargo ship this tick.
///
/// Below the minimum fleet size a ship is always spawned. Beyond it, the
/// build counter must cover one request threshold per ship already owned.
pub fn spawn_cargo_ships<H: HostWorld>(economy: &mut FactionEconomy, ctx: &mut TickContext<'_, H>) {
    for ship in economy.cargo_ships.clone() {
        if ctx.host.entity(ship).is_none() {
            prune(economy, ctx.store, ship);
        }
    }

    let owned = economy.cargo_ships.len();
    let threshold = ctx
        .scaling
        .request_points_per_ship
        .saturating_mul(owned as i32);
    let below_minimum = owned < ctx.config.min_cargo_ships;
    if !below_minimum && economy.build_counter < threshold {
        return;
    }

    let Some(ship) = spawn_at_grand_station(economy, ctx, UnitKind::CargoShip) else {
        return;
    };
    ctx.store.attach(ship, cargo_ledger(ctx.config.cargo_ship_capacity));
    ctx.store.attach(ship, ShipStatus::new());
    economy.add_cargo_ship(ship);
    if !below_minimum {
        economy.build_counter = (economy.build_counter - threshold).max(0);
    }
    log::info!(
        "{}: cargo ship {} spawned ({} owned, build counter {})",
        economy.faction,
        ship,
        economy.cargo_ships.len(),
        economy.build_counter
    );
}

/// Spawn a militia leader once enough unanswered threat has piled up.
pub fn spawn_militia<H: HostWorld>(economy: &mut FactionEconomy, ctx: &mut TickContext<'_, H>) {
    for leader in economy.militia_leaders.clone() {
        if ctx.host.entity(leader).is_none() {
            prune(economy, ctx.store, leader);
        }
    }

    let threshold = ctx
        .scaling
        .request_points_per_ship
        .saturating_mul(economy.militia_leaders.len() as i32 + 1);
    if economy.militia_counter < threshold {
        return;
    }

    let Some(leader) = spawn_at_grand_station(economy, ctx, UnitKind::MilitiaLeader) else {
        return;
    };
    ctx.store.attach(leader, cargo_ledger(ctx.config.militia_cargo_capacity));
    ctx.store.attach(leader, MilitiaUnit::new());
    economy.add_militia_leader(leader);
    economy.militia_counter = 0;
    log::info!(
        "{}: militia leader {} spawned ({} fleets)",
        economy.faction,
        leader,
        economy.militia_leaders.len()
    );
}
