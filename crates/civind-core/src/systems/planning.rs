//! Movement planning. Reads committed state only and returns intents for
//! the host to apply later.

use super::staging_station;
use crate::components::{FactionEconomy, MilitiaState, MilitiaUnit, ShipStatus};
use crate::config::IndustryConfig;
use crate::host::{HostView, MovementIntent};
use crate::store::ComponentStore;

/// Where a fleet heading for its wormhole should hold: 40% of the militia
/// range out from the station, in the band the deployment check accepts.
fn defensive_offset(max_range: i64) -> i64 {
    max_range * 4 / 10
}

fn plan_ships<H: HostView>(
    economy: &FactionEconomy,
    host: &H,
    store: &ComponentStore,
    config: &IndustryConfig,
    intents: &mut Vec<MovementIntent>,
) {
    for &ship in &economy.cargo_ships {
        let (Some(info), Some(status)) = (host.entity(ship), store.get::<ShipStatus>(ship)) else {
            continue;
        };
        let Some(target) = status.travel_target().and_then(|id| host.entity(id)) else {
            continue;
        };
        if target.planet != info.planet {
            intents.push(MovementIntent::WormholePath {
                unit: ship,
                destination: target.planet,
            });
        } else if host.distance(info.position, target.position) > config.dock_range {
            intents.push(MovementIntent::MoveToPoint {
                unit: ship,
                point: target.position,
            });
        }
    }
}

fn plan_militia<H: HostView>(
    economy: &FactionEconomy,
    host: &H,
    store: &ComponentStore,
    config: &IndustryConfig,
    intents: &mut Vec<MovementIntent>,
) {
    for &leader in &economy.militia_leaders {
        let (Some(info), Some(unit)) = (host.entity(leader), store.get::<MilitiaUnit>(leader)) else {
            continue;
        };
        if !matches!(unit.state, MilitiaState::Pathing | MilitiaState::Enroute) {
            continue;
        }
        let Some(focus) = unit.planet_focus else {
            continue;
        };
        if info.planet != focus {
            intents.push(MovementIntent::WormholePath {
                unit: leader,
                destination: focus,
            });
            continue;
        }
        let Some(goal) = staging_station(economy, host, focus) else {
            continue;
        };

        let point = match (unit.state, unit.wormhole_focus.and_then(|id| host.entity(id))) {
            (MilitiaState::Enroute, Some(wormhole)) => goal
                .position
                .toward(&wormhole.position, defensive_offset(config.militia_max_range)),
            _ => goal.position,
        };
        let settled = match unit.state {
            MilitiaState::Pathing => host.distance(info.position, point) <= config.staging_range,
            _ => info.position == point,
        };
        if !settled {
            intents.push(MovementIntent::MoveToPoint { unit: leader, point });
        }
    }
}

/// Movement intents for every travelling ship and militia fleet.
pub fn plan_movements<H: HostView>(
    economy: &FactionEconomy,
    host: &H,
    store: &ComponentStore,
    config: &IndustryConfig,
) -> Vec<MovementIntent> {
    let mut intents = Vec::new();
    plan_ships(economy, host, store, config, &mut intents);
    plan_militia(economy, host, store, config, &mut intents);
    intents
}
