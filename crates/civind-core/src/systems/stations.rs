//! Grand station and trade station creation.

use std::collections::HashSet;

use super::{place_unit, prune, TickContext};
use crate::components::{FactionEconomy, PlanetId, ResourceKind, ResourceLedger, UnitKind};
use crate::host::{EntityClass, HostView, HostWorld, UnitBehavior};

/// Make sure the faction has a live grand station, creating one next to a
/// king if needed.
pub fn ensure_grand_station<H: HostWorld>(economy: &mut FactionEconomy, ctx: &mut TickContext<'_, H>) {
    if let Some(id) = economy.grand_station {
        if ctx.host.entity(id).is_some() && ctx.store.has::<ResourceLedger>(id) {
            return;
        }
        log::info!("{}: grand station {} lost", economy.faction, id);
        prune(economy, ctx.store, id);
    }

    for king in ctx.host.entities_of(economy.faction, EntityClass::King) {
        let Some(anchor) = ctx.host.entity(king) else {
            continue;
        };
        let Some(station) = place_unit(
            economy,
            ctx.host,
            ctx.config,
            UnitKind::GrandStation,
            anchor.planet,
            anchor.position,
            UnitBehavior::Hold,
        ) else {
            continue;
        };

        let capacity = ctx.config.grand_station_capacity;
        let ledger = ResourceLedger::new()
            .with_resource(
                ResourceKind::Goods,
                0,
                capacity,
                ctx.config.grand_station_initial_goods_rate,
            )
            .with_resource(ResourceKind::Metal, 0, capacity, 0);
        ctx.store.attach(station, ledger);
        economy.grand_station = Some(station);
        economy.add_resource_point(station);
        log::info!(
            "{}: grand station {} built on {}",
            economy.faction,
            station,
            anchor.planet
        );
        return;
    }
}

fn metal_rate<H: HostView>(economy: &FactionEconomy, host: &H, per_producer: i32, planet: PlanetId) -> i32 {
    let producers = host
        .entities_of(economy.faction, EntityClass::MetalProducer)
        .into_iter()
        .filter_map(|id| host.entity(id))
        .filter(|info| info.planet == planet)
        .count() as i32;
    producers * per_producer
}

/// One trade station per planet holding a command center.
///
/// Existing stations have their metal rate refreshed from the current
/// count of metal producers on their planet.
pub fn ensure_trade_stations<H: HostWorld>(economy: &mut FactionEconomy, ctx: &mut TickContext<'_, H>) {
    let mut covered: HashSet<PlanetId> = HashSet::new();
    for station in economy.trade_stations.clone() {
        let Some(info) = ctx.host.entity(station) else {
            prune(economy, ctx.store, station);
            continue;
        };
        let rate = metal_rate(economy, &*ctx.host, ctx.config.metal_per_producer, info.planet);
        let refreshed = ctx
            .store
            .with_mut(station, |ledger: &mut ResourceLedger| ledger.set_rate(ResourceKind::Metal, rate));
        if refreshed.is_none() {
            prune(economy, ctx.store, station);
            continue;
        }
        covered.insert(info.planet);
    }

    for center in ctx.host.entities_of(economy.faction, EntityClass::CommandCenter) {
        let Some(anchor) = ctx.host.entity(center) else {
            continue;
        };
        if covered.contains(&anchor.planet) {
            continue;
        }
        let Some(station) = place_unit(
            economy,
            ctx.host,
            ctx.config,
            UnitKind::TradeStation,
            anchor.planet,
            anchor.position,
            UnitBehavior::Hold,
        ) else {
            continue;
        };

        let capacity = ctx.config.trade_station_capacity;
        let rate = metal_rate(economy, &*ctx.host, ctx.config.metal_per_producer, anchor.planet);
        let ledger = ResourceLedger::new()
            .with_resource(ResourceKind::Goods, 0, capacity, -ctx.config.trade_station_upkeep)
            .with_resource(ResourceKind::Metal, 0, capacity, rate);
        ctx.store.attach(station, ledger);
        economy.add_trade_station(station);
        covered.insert(anchor.planet);
        log::info!(
            "{}: trade station {} built on {} (metal rate {})",
            economy.faction,
            station,
            anchor.planet,
            rate
        );
    }
}
