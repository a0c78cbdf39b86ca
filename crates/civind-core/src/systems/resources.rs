//! Per-second resource accounting (`do_resources`).

use super::{prune, TickContext};
use crate::components::{FactionEconomy, MilitiaUnit, ResourceKind, ResourceLedger};
use crate::host::HostWorld;

/// Goods the grand station generates given the current trade network.
pub fn grand_station_goods_rate(economy: &FactionEconomy, base: i32, per_station: i32) -> i32 {
    base + per_station * economy.trade_stations.len() as i32
}

/// Apply one second of generation and consumption to every resource point.
///
/// Solvency is all-or-nothing per entity. Deployed militia accumulate what
/// they consumed into their processed-resource counters, but only for kinds
/// whose unit type is still below the faction cap.
pub fn do_resources<H: HostWorld>(economy: &mut FactionEconomy, ctx: &mut TickContext<'_, H>) {
    let goods_rate = grand_station_goods_rate(
        economy,
        ctx.config.grand_goods_base_rate,
        ctx.config.grand_goods_per_trade_station,
    );

    for id in economy.resource_points.clone() {
        if ctx.host.entity(id).is_none() {
            prune(economy, ctx.store, id);
            continue;
        }
        let is_grand = economy.grand_station == Some(id);
        let applied = ctx.store.with_mut(id, |ledger: &mut ResourceLedger| {
            if is_grand {
                ledger.set_rate(ResourceKind::Goods, goods_rate);
            }
            ledger.apply_rates().then(|| ledger.rate)
        });
        let rates = match applied {
            None => {
                prune(economy, ctx.store, id);
                continue;
            }
            Some(None) => {
                log::trace!("{}: {} insolvent this tick", economy.faction, id);
                continue;
            }
            Some(Some(rates)) => rates,
        };

        let Some(unit) = ctx.store.get::<MilitiaUnit>(id) else {
            continue;
        };
        if !unit.state.is_production_site() {
            continue;
        }
        let mut consumed = [0; crate::components::RESOURCE_KINDS];
        for kind in ResourceKind::ALL {
            let rate = rates[kind.index()];
            if rate >= 0 {
                continue;
            }
            let Some(built) = unit.built_unit(kind) else {
                continue;
            };
            if (ctx.host.fleet_count(id, built) as i32) < ctx.scaling.unit_cap {
                consumed[kind.index()] = -rate;
            }
        }
        ctx.store.with_mut(id, |unit: &mut MilitiaUnit| {
            for kind in ResourceKind::ALL {
                unit.add_processed(kind, consumed[kind.index()]);
            }
        });
    }
}
