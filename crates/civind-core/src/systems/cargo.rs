//! Cargo ship arrivals and per-tick cargo transfer.

use super::{prune, TickContext};
use crate::components::{EntityId, FactionEconomy, ResourceKind, ResourceLedger, ShipState, ShipStatus};
use crate::host::HostWorld;
use crate::store::ComponentStore;

/// Move up to `limit` of `kind` from one ledger to another. Returns the
/// amount moved.
pub fn transfer(from: &mut ResourceLedger, to: &mut ResourceLedger, kind: ResourceKind, limit: i32) -> i32 {
    let space = to.capacity(kind) - to.amount(kind);
    let amount = limit.min(from.amount(kind)).min(space);
    if amount <= 0 {
        return 0;
    }
    from.adjust(kind, -amount);
    to.adjust(kind, amount);
    amount
}

fn reset_ship(store: &mut ComponentStore, ship: EntityId) {
    store.with_mut(ship, |status: &mut ShipStatus| status.reset());
}

/// Dock travelling ships that reached the station they were heading for.
pub fn detect_ship_arrivals<H: HostWorld>(economy: &mut FactionEconomy, ctx: &mut TickContext<'_, H>) {
    for ship in economy.cargo_ships.clone() {
        let (Some(info), Some(status)) = (ctx.host.entity(ship), ctx.store.get::<ShipStatus>(ship)) else {
            prune(economy, ctx.store, ship);
            continue;
        };
        if !status.state.is_travelling() {
            continue;
        }
        let Some(target) = status.travel_target().and_then(|id| ctx.host.entity(id)) else {
            log::debug!("{}: {} lost its route, back to idle", economy.faction, ship);
            reset_ship(ctx.store, ship);
            continue;
        };
        if target.planet != info.planet {
            continue;
        }
        if ctx.host.distance(info.position, target.position) <= ctx.config.dock_range {
            let load_time = ctx.config.load_time;
            ctx.store.with_mut(ship, |status: &mut ShipStatus| status.dock(load_time));
            log::trace!("{}: {} docked at {}", economy.faction, ship, target.id);
        }
    }
}

fn station_ledger<H: HostWorld>(ctx: &TickContext<'_, H>, station: Option<EntityId>) -> Option<(EntityId, ResourceLedger)> {
    let station = station?;
    ctx.host.entity(station)?;
    ctx.store.get::<ResourceLedger>(station).map(|ledger| (station, ledger))
}

/// One tick of loading and unloading for every docked ship.
///
/// Loading skips resources the origin consumes, and the grand station only
/// gives out goods. Unloading pulls from a producing destination that is
/// more than half full until the hold is full, otherwise pushes cargo into
/// it. A ship finishes unloading once a pass moves nothing.
pub fn do_cargo_transfer<H: HostWorld>(economy: &mut FactionEconomy, ctx: &mut TickContext<'_, H>) {
    let per_tick = ctx.config.transfer_per_tick;
    for ship in economy.cargo_ships.clone() {
        let Some(mut status) = ctx.store.get::<ShipStatus>(ship) else {
            continue;
        };
        let docked_at = match status.state {
            ShipState::Loading => status.origin,
            ShipState::Unloading => status.destination,
            _ => continue,
        };
        let (Some(mut cargo), Some((station, mut stock))) =
            (ctx.store.get::<ResourceLedger>(ship), station_ledger(ctx, docked_at))
        else {
            log::debug!("{}: {} lost its dock, back to idle", economy.faction, ship);
            reset_ship(ctx.store, ship);
            continue;
        };

        if status.state == ShipState::Loading {
            status.load_timer -= 1;
            let is_grand = economy.grand_station == Some(station);
            for kind in ResourceKind::ALL {
                if stock.rate(kind) < 0 || (is_grand && kind != ResourceKind::Goods) {
                    continue;
                }
                transfer(&mut stock, &mut cargo, kind, per_tick);
            }
            if status.load_timer <= 0 {
                status.state = ShipState::Enroute;
                status.load_timer = 0;
            }
        } else {
            let mut moved = 0;
            for kind in ResourceKind::ALL {
                let producing = stock.rate(kind) > 0 && stock.fill_ratio(kind) > 0.5;
                if producing {
                    // a producer never takes its own output back
                    if !cargo.is_full(kind) {
                        moved += transfer(&mut stock, &mut cargo, kind, per_tick);
                    }
                } else if cargo.amount(kind) > 0 && !stock.is_full(kind) {
                    moved += transfer(&mut cargo, &mut stock, kind, per_tick);
                }
            }
            if moved == 0 {
                log::trace!("{}: {} finished unloading at {}", economy.faction, ship, station);
                status.reset();
            }
        }

        ctx.store.attach(ship, cargo);
        ctx.store.attach(station, stock);
        ctx.store.attach(ship, status);
    }
}
