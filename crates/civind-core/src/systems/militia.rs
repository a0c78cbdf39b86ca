//! Militia dispatch, deployment and unit production.

use std::collections::HashSet;

use super::{place_unit, prune, TickContext};
use crate::components::{
    EntityId, FactionEconomy, MilitiaState, MilitiaUnit, PlanetId, ResourceKind, ResourceLedger, UnitKind,
};
use crate::config::IndustryConfig;
use crate::error::EconomyError;
use crate::host::{EntityInfo, HostView, HostWorld, UnitBehavior};
use crate::store::ComponentStore;

/// The station a militia fleet stages at on `planet`: grand station first,
/// then trade stations in creation order.
pub fn staging_station<H: HostView>(economy: &FactionEconomy, host: &H, planet: PlanetId) -> Option<EntityInfo> {
    economy
        .stations()
        .filter_map(|id| host.entity(id))
        .find(|info| info.planet == planet)
}

/// Whether a fleet heading for its wormhole has reached the defensive band.
///
/// The band is closer than 60% of `max_range` to the station, and either
/// beyond 20% of it or already within tractor range of the wormhole.
pub fn in_defensive_band(station_distance: i64, wormhole_distance: i64, max_range: i64, tractor_range: i64) -> bool {
    station_distance * 10 < max_range * 6
        && (station_distance * 10 > max_range * 2 || wormhole_distance <= tractor_range)
}

/// Insertion sort, highest threat first. Equal threats keep their order.
pub fn sort_threats(threats: &mut [(PlanetId, i32)]) {
    for i in 1..threats.len() {
        let mut j = i;
        while j > 0 && threats[j - 1].1 < threats[j].1 {
            threats.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Send idle militia fleets to the most threatened planets.
///
/// When there are more threatened planets than idle fleets, the least
/// threatened are dropped and their threat is added to the militia counter.
pub fn do_militia_orders<H: HostWorld>(economy: &mut FactionEconomy, ctx: &mut TickContext<'_, H>) {
    for leader in economy.militia_leaders.clone() {
        if ctx.host.entity(leader).is_none() || !ctx.store.has::<MilitiaUnit>(leader) {
            prune(economy, ctx.store, leader);
        }
    }

    let mut threatened: Vec<(PlanetId, i32)> = economy
        .threat
        .processed_entries()
        .filter(|(_, threat)| *threat > 0)
        .collect();
    sort_threats(&mut threatened);

    let mut idle: Vec<(EntityId, PlanetId)> = Vec::new();
    let mut claimed: HashSet<EntityId> = HashSet::new();
    for &leader in &economy.militia_leaders {
        let Some(unit) = ctx.store.get::<MilitiaUnit>(leader) else {
            continue;
        };
        claimed.extend(unit.wormhole_focus);
        if unit.state == MilitiaState::Idle {
            if let Some(info) = ctx.host.entity(leader) {
                idle.push((leader, info.planet));
            }
        }
    }

    while idle.len() < threatened.len() {
        if let Some((planet, threat)) = threatened.pop() {
            log::trace!("{}: no fleet for {} (threat {})", economy.faction, planet, threat);
            economy.add_militia_points(threat);
        }
    }

    let players = ctx.host.player_factions();
    for (planet, threat) in threatened {
        let pick = idle
            .iter()
            .enumerate()
            .filter_map(|(index, (_, at))| ctx.host.hops(*at, planet).map(|hops| (index, hops)))
            .min_by_key(|(_, hops)| *hops)
            .map(|(index, _)| index);
        let Some(index) = pick else {
            continue;
        };
        let (leader, _) = idle.remove(index);

        let wormhole = ctx
            .host
            .linked_planets(planet)
            .into_iter()
            .filter(|neighbour| {
                ctx.host
                    .planet(*neighbour)
                    .map(|p| p.controller.map_or(true, |owner| !players.contains(&owner)))
                    .unwrap_or(false)
            })
            .filter_map(|neighbour| ctx.host.wormhole(planet, neighbour))
            .find(|wormhole| !claimed.contains(wormhole));
        if let Some(wormhole) = wormhole {
            claimed.insert(wormhole);
        }

        ctx.store.with_mut(leader, |unit: &mut MilitiaUnit| {
            unit.state = MilitiaState::Pathing;
            unit.planet_focus = Some(planet);
            unit.wormhole_focus = wormhole;
        });
        log::info!(
            "{}: militia {} sent to {} (threat {}, wormhole {:?})",
            economy.faction,
            leader,
            planet,
            threat,
            wormhole
        );
    }
}

/// Turn a militia leader into a static outpost at its current position.
///
/// Records and fleet membership move to the outpost, and the outpost joins
/// the resource points so it gets supplied.
fn deploy_outpost<H: HostWorld>(
    economy: &mut FactionEconomy,
    ctx: &mut TickContext<'_, H>,
    leader: EntityInfo,
    mut unit: MilitiaUnit,
) {
    let Some(outpost) = place_unit(
        economy,
        ctx.host,
        ctx.config,
        UnitKind::MilitiaOutpost,
        leader.planet,
        leader.position,
        UnitBehavior::Hold,
    ) else {
        ctx.store.attach(leader.id, unit);
        return;
    };

    unit.state = MilitiaState::Defending;
    ctx.store.attach(leader.id, unit);
    ctx.store.transfer(leader.id, outpost);

    let mut ledger = ctx.store.get::<ResourceLedger>(outpost).unwrap_or_default();
    for kind in ResourceKind::ALL {
        ledger.set_capacity(kind, ctx.config.outpost_capacity);
        ledger.set_rate(kind, -ctx.config.militia_upkeep);
    }
    ctx.store.attach(outpost, ledger);

    ctx.host.transfer_fleet(leader.id, outpost);
    ctx.host.despawn(leader.id);
    economy.replace_militia_leader(leader.id, outpost);
    economy.add_resource_point(outpost);
    log::info!(
        "{}: militia {} deployed as outpost {} on {}",
        economy.faction,
        leader.id,
        outpost,
        leader.planet
    );
}

/// Spend processed metal on turrets (defending) or attack ships (patrolling).
///
/// The n-th unit of a type costs `n * resource_cost` and units stop at the
/// faction cap.
fn build_units<H: HostWorld>(economy: &FactionEconomy, ctx: &mut TickContext<'_, H>, site: EntityInfo, unit: &mut MilitiaUnit) {
    let cost = ctx.scaling.resource_cost;
    let cap = ctx.scaling.unit_cap;
    let anchor = match (unit.state, unit.wormhole_focus.and_then(|id| ctx.host.entity(id))) {
        (MilitiaState::Defending, Some(wormhole)) => site
            .position
            .toward(&wormhole.position, ctx.config.turret_offset),
        _ => site.position,
    };
    let behavior = if unit.state == MilitiaState::Patrolling {
        UnitBehavior::AttackEverything
    } else {
        UnitBehavior::Hold
    };

    for kind in ResourceKind::ALL {
        let Some(built) = unit.built_unit(kind) else {
            continue;
        };
        let mut count = ctx.host.fleet_count(site.id, built) as i32;
        while count < cap {
            let price = (count + 1).saturating_mul(cost);
            if unit.processed(ResourceKind::Metal) < price {
                break;
            }
            let Some(spawned) = place_unit(economy, ctx.host, ctx.config, built, site.planet, anchor, behavior) else {
                break;
            };
            unit.add_processed(ResourceKind::Metal, -price);
            ctx.host.add_to_fleet(site.id, spawned);
            count += 1;
            log::debug!(
                "{}: {} built {} #{} for {}",
                economy.faction,
                site.id,
                built.type_name(),
                count,
                price
            );
        }
    }
}

/// Advance every militia fleet one tick.
pub fn do_militia_deployment<H: HostWorld>(economy: &mut FactionEconomy, ctx: &mut TickContext<'_, H>) {
    let max_range = ctx.config.militia_max_range;
    for leader in economy.militia_leaders.clone() {
        let (Some(info), Some(mut unit)) = (ctx.host.entity(leader), ctx.store.get::<MilitiaUnit>(leader)) else {
            prune(economy, ctx.store, leader);
            continue;
        };
        if matches!(
            unit.state,
            MilitiaState::Idle | MilitiaState::Packing | MilitiaState::Assisting
        ) {
            continue;
        }

        let Some(focus) = unit.planet_focus.filter(|p| ctx.host.planet(*p).is_some()) else {
            log::debug!("{}: militia {} has no focus, back to idle", economy.faction, leader);
            unit.revert_to_idle();
            ctx.store.attach(leader, unit);
            continue;
        };

        match unit.state {
            MilitiaState::Pathing | MilitiaState::Enroute => {
                if info.planet != focus {
                    continue;
                }
                let Some(goal) = staging_station(economy, &*ctx.host, focus) else {
                    log::debug!("{}: no station on {}, militia {} idles", economy.faction, focus, leader);
                    unit.revert_to_idle();
                    ctx.store.attach(leader, unit);
                    continue;
                };
                let to_station = ctx.host.distance(info.position, goal.position);
                let wormhole = unit.wormhole_focus.and_then(|id| ctx.host.entity(id));

                if unit.state == MilitiaState::Pathing {
                    if to_station > ctx.config.staging_range {
                        continue;
                    }
                    if wormhole.is_some() {
                        unit.state = MilitiaState::Enroute;
                        ctx.store.attach(leader, unit);
                    } else {
                        deploy_outpost(economy, ctx, info, unit);
                    }
                    continue;
                }

                let to_wormhole = wormhole
                    .map(|w| ctx.host.distance(info.position, w.position))
                    .unwrap_or(0);
                if wormhole.is_none()
                    || in_defensive_band(to_station, to_wormhole, max_range, ctx.config.tractor_range)
                {
                    deploy_outpost(economy, ctx, info, unit);
                }
            }
            MilitiaState::Defending | MilitiaState::Patrolling => {
                build_units(economy, ctx, info, &mut unit);
                ctx.store.attach(leader, unit);
            }
            _ => {}
        }
    }
}

/// Switch a mobile militia fleet to the patrolling posture on its current
/// planet.
pub fn begin_patrol<H: HostView>(
    economy: &mut FactionEconomy,
    store: &mut ComponentStore,
    config: &IndustryConfig,
    host: &H,
    leader: EntityId,
) -> Result<(), EconomyError> {
    if !economy.militia_leaders.contains(&leader) {
        return Err(EconomyError::UnknownEntity(leader));
    }
    let info = host.entity(leader).ok_or(EconomyError::UnknownEntity(leader))?;
    let mut unit = store
        .get::<MilitiaUnit>(leader)
        .ok_or(EconomyError::UnknownEntity(leader))?;
    if !matches!(
        unit.state,
        MilitiaState::Idle | MilitiaState::Pathing | MilitiaState::Enroute
    ) {
        return Err(EconomyError::InvalidState {
            id: leader,
            action: "patrol",
        });
    }

    unit.state = MilitiaState::Patrolling;
    unit.planet_focus = Some(info.planet);
    unit.wormhole_focus = None;
    store.attach(leader, unit);

    let mut ledger = store.get::<ResourceLedger>(leader).unwrap_or_default();
    for kind in ResourceKind::ALL {
        if ledger.capacity(kind) == 0 {
            ledger.set_capacity(kind, config.militia_cargo_capacity);
        }
        ledger.set_rate(kind, -config.militia_upkeep);
    }
    store.attach(leader, ledger);
    economy.add_resource_point(leader);
    log::info!("{}: militia {} patrolling {}", economy.faction, leader, info.planet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{FactionId, Point};
    use crate::host::EntityClass;
    use crate::sandbox::SandboxWorld;

    const PLAYER: FactionId = FactionId(1);

    /// Home 0 - colony 1 - wild 2, with a second wild planet 3 off the colony.
    fn world() -> SandboxWorld {
        let mut host = SandboxWorld::new();
        host.add_planet(Some(PLAYER));
        host.add_planet(Some(PLAYER));
        host.add_planet(None);
        host.add_planet(None);
        host.link(PlanetId(0), PlanetId(1));
        host.link(PlanetId(1), PlanetId(2));
        host.link(PlanetId(1), PlanetId(3));
        host.add_player(PLAYER);
        host
    }

    fn add_leader(
        host: &mut SandboxWorld,
        store: &mut ComponentStore,
        economy: &mut FactionEconomy,
        planet: PlanetId,
        position: Point,
    ) -> EntityId {
        let leader = host
            .spawn(crate::host::SpawnRequest {
                kind: UnitKind::MilitiaLeader,
                faction: PLAYER,
                planet,
                point: position,
                behavior: UnitBehavior::Hold,
            })
            .expect("leader");
        store.attach(
            leader,
            ResourceLedger::new()
                .with_resource(ResourceKind::Goods, 300, 500, 0)
                .with_resource(ResourceKind::Metal, 200, 500, 0),
        );
        store.attach(leader, MilitiaUnit::new());
        economy.add_militia_leader(leader);
        leader
    }

    fn unit(store: &ComponentStore, id: EntityId) -> MilitiaUnit {
        store.get::<MilitiaUnit>(id).expect("militia unit")
    }

    #[test]
    fn test_sort_threats_descending_stable() {
        let mut threats = vec![
            (PlanetId(1), 5),
            (PlanetId(2), 9),
            (PlanetId(3), 5),
            (PlanetId(4), 1),
        ];
        sort_threats(&mut threats);
        let order: Vec<i32> = threats.iter().map(|(p, _)| p.0).collect();
        assert_eq!(order, vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_defensive_band() {
        assert!(in_defensive_band(4_800, 6_000, 12_000, 3_000));
        assert!(!in_defensive_band(7_200, 6_000, 12_000, 3_000));
        assert!(!in_defensive_band(1_000, 6_000, 12_000, 3_000));
        assert!(in_defensive_band(1_000, 2_000, 12_000, 3_000));
    }

    #[test]
    fn test_dispatch_drops_lowest_threats() {
        let mut host = world();
        let mut store = ComponentStore::new();
        let config = IndustryConfig::default();
        let mut economy = FactionEconomy::new(PLAYER);
        let leader = add_leader(&mut host, &mut store, &mut economy, PlanetId(0), Point::ZERO);
        economy.threat.record(PlanetId(0), 4);
        economy.threat.record(PlanetId(1), 30);
        economy.threat.record(PlanetId(2), 7);
        economy.threat.record(PlanetId(3), -5);

        let mut ctx = TickContext::new(&mut host, &mut store, &config);
        do_militia_orders(&mut economy, &mut ctx);

        assert_eq!(economy.militia_counter, 11);
        let unit = unit(&store, leader);
        assert_eq!(unit.state, MilitiaState::Pathing);
        assert_eq!(unit.planet_focus, Some(PlanetId(1)));
        let expected = host.wormhole(PlanetId(1), PlanetId(2));
        assert_eq!(unit.wormhole_focus, expected);
    }

    #[test]
    fn test_dispatch_claims_distinct_wormholes() {
        let mut host = world();
        let mut store = ComponentStore::new();
        let config = IndustryConfig::default();
        let mut economy = FactionEconomy::new(PLAYER);
        let busy = add_leader(&mut host, &mut store, &mut economy, PlanetId(1), Point::ZERO);
        let claimed = host.wormhole(PlanetId(1), PlanetId(2));
        store.with_mut(busy, |u: &mut MilitiaUnit| {
            u.state = MilitiaState::Defending;
            u.planet_focus = Some(PlanetId(1));
            u.wormhole_focus = claimed;
        });
        let near = add_leader(&mut host, &mut store, &mut economy, PlanetId(1), Point::ZERO);
        let far = add_leader(&mut host, &mut store, &mut economy, PlanetId(0), Point::ZERO);
        economy.threat.record(PlanetId(1), 50);

        let mut ctx = TickContext::new(&mut host, &mut store, &config);
        do_militia_orders(&mut economy, &mut ctx);

        assert_eq!(economy.militia_counter, 0);
        let sent = unit(&store, near);
        assert_eq!(sent.planet_focus, Some(PlanetId(1)));
        assert_eq!(sent.wormhole_focus, host.wormhole(PlanetId(1), PlanetId(3)));
        assert_eq!(unit(&store, far).state, MilitiaState::Idle);
    }

    #[test]
    fn test_pathing_without_wormhole_deploys_outpost() {
        let mut host = world();
        let mut store = ComponentStore::new();
        let config = IndustryConfig::default();
        let mut economy = FactionEconomy::new(PLAYER);
        let station = host.add_entity(PLAYER, PlanetId(1), Point::ZERO, EntityClass::Other);
        economy.add_trade_station(station);
        let leader = add_leader(&mut host, &mut store, &mut economy, PlanetId(1), Point::new(300, 0));
        let escort = host.add_entity(PLAYER, PlanetId(1), Point::ZERO, EntityClass::Other);
        host.add_to_fleet(leader, escort);
        store.with_mut(leader, |u: &mut MilitiaUnit| {
            u.state = MilitiaState::Pathing;
            u.planet_focus = Some(PlanetId(1));
        });

        let mut ctx = TickContext::new(&mut host, &mut store, &config);
        do_militia_deployment(&mut economy, &mut ctx);

        assert!(host.entity(leader).is_none());
        assert_eq!(economy.militia_leaders.len(), 1);
        let outpost = economy.militia_leaders[0];
        assert_ne!(outpost, leader);
        assert!(economy.resource_points.contains(&outpost));
        assert!(!store.has::<MilitiaUnit>(leader));
        assert_eq!(unit(&store, outpost).state, MilitiaState::Defending);
        let ledger = store.get::<ResourceLedger>(outpost).expect("ledger");
        assert_eq!(ledger.amount(ResourceKind::Goods), 300);
        assert_eq!(ledger.capacity(ResourceKind::Goods), config.outpost_capacity);
        assert_eq!(ledger.rate(ResourceKind::Metal), -config.militia_upkeep);
        assert_eq!(host.fleet(outpost), &[escort]);
    }

    #[test]
    fn test_pathing_with_wormhole_goes_enroute_then_deploys() {
        let mut host = world();
        let mut store = ComponentStore::new();
        let config = IndustryConfig::default();
        let mut economy = FactionEconomy::new(PLAYER);
        let station = host.add_entity(PLAYER, PlanetId(1), Point::ZERO, EntityClass::Other);
        economy.add_trade_station(station);
        let leader = add_leader(&mut host, &mut store, &mut economy, PlanetId(1), Point::new(100, 0));
        let wormhole = host.wormhole(PlanetId(1), PlanetId(2));
        store.with_mut(leader, |u: &mut MilitiaUnit| {
            u.state = MilitiaState::Pathing;
            u.planet_focus = Some(PlanetId(1));
            u.wormhole_focus = wormhole;
        });

        {
            let mut ctx = TickContext::new(&mut host, &mut store, &config);
            do_militia_deployment(&mut economy, &mut ctx);
            // still next to the station: not in the band yet
            do_militia_deployment(&mut economy, &mut ctx);
        }
        assert_eq!(unit(&store, leader).state, MilitiaState::Enroute);

        host.place(leader, PlanetId(1), Point::new(4_800, 0));
        let mut ctx = TickContext::new(&mut host, &mut store, &config);
        do_militia_deployment(&mut economy, &mut ctx);
        assert!(host.entity(leader).is_none());
        let outpost = economy.militia_leaders[0];
        assert_eq!(unit(&store, outpost).wormhole_focus, wormhole);
    }

    #[test]
    fn test_missing_focus_reverts_to_idle() {
        let mut host = world();
        let mut store = ComponentStore::new();
        let config = IndustryConfig::default();
        let mut economy = FactionEconomy::new(PLAYER);
        let leader = add_leader(&mut host, &mut store, &mut economy, PlanetId(1), Point::ZERO);
        store.with_mut(leader, |u: &mut MilitiaUnit| {
            u.state = MilitiaState::Enroute;
            u.planet_focus = Some(PlanetId(42));
        });

        let mut ctx = TickContext::new(&mut host, &mut store, &config);
        do_militia_deployment(&mut economy, &mut ctx);
        assert_eq!(unit(&store, leader), MilitiaUnit::new());
    }

    #[test]
    fn test_outpost_builds_turrets_with_rising_cost() {
        let mut host = world();
        let mut store = ComponentStore::new();
        let config = IndustryConfig::default();
        let mut economy = FactionEconomy::new(PLAYER);
        let outpost = add_leader(&mut host, &mut store, &mut economy, PlanetId(1), Point::ZERO);
        let wormhole = host.wormhole(PlanetId(1), PlanetId(2));
        store.with_mut(outpost, |u: &mut MilitiaUnit| {
            u.state = MilitiaState::Defending;
            u.planet_focus = Some(PlanetId(1));
            u.wormhole_focus = wormhole;
            u.add_processed(ResourceKind::Metal, 200);
        });

        let mut ctx = TickContext::new(&mut host, &mut store, &config);
        ctx.scaling.resource_cost = 40;
        ctx.scaling.unit_cap = 10;
        do_militia_deployment(&mut economy, &mut ctx);

        // goods turret #1 costs 40, #2 costs 80; metal turret #1 costs 40
        assert_eq!(host.fleet_count(outpost, UnitKind::MilitiaTurret(ResourceKind::Goods)), 2);
        assert_eq!(host.fleet_count(outpost, UnitKind::MilitiaTurret(ResourceKind::Metal)), 1);
        assert_eq!(unit(&store, outpost).processed(ResourceKind::Metal), 40);
        let turret = host.fleet(outpost)[0];
        let position = host.entity(turret).map(|e| e.position).expect("turret");
        assert!(position.x > 0);
    }

    #[test]
    fn test_patrol_builds_attack_ships() {
        let mut host = world();
        let mut store = ComponentStore::new();
        let config = IndustryConfig::default();
        let mut economy = FactionEconomy::new(PLAYER);
        let leader = add_leader(&mut host, &mut store, &mut economy, PlanetId(1), Point::ZERO);
        begin_patrol(&mut economy, &mut store, &config, &host, leader).expect("patrol");
        assert!(economy.resource_points.contains(&leader));
        store.with_mut(leader, |u: &mut MilitiaUnit| u.add_processed(ResourceKind::Metal, 49));

        let mut ctx = TickContext::new(&mut host, &mut store, &config);
        do_militia_deployment(&mut economy, &mut ctx);

        assert_eq!(host.fleet_count(leader, UnitKind::MilitiaShip(ResourceKind::Goods)), 1);
        let ship = host.fleet(leader)[0];
        assert_eq!(host.get(ship).map(|e| e.behavior), Some(UnitBehavior::AttackEverything));
        assert_eq!(
            begin_patrol(&mut economy, &mut store, &config, &host, leader),
            Err(EconomyError::InvalidState {
                id: leader,
                action: "patrol"
            })
        );
    }
}
