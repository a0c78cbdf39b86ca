//! Trade matching: turn station needs into cargo ship routes.
//!
//! Requests are rebuilt from the ledgers on every pass and thrown away
//! afterwards. Matching widens its search one wormhole hop at a time, so
//! nearby pairs are always served before distant ones.

use super::{prune, TickContext};
use crate::components::{EntityId, FactionEconomy, PlanetId, Point, ResourceKind, ResourceLedger, ShipState, ShipStatus};
use crate::host::{HostView, HostWorld};
use crate::store::ComponentStore;

/// One station's need for one resource, valid for a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeRequest {
    pub resource: ResourceKind,
    pub urgency: i32,
    /// The station wants to give the resource away.
    pub export: bool,
    pub station: EntityId,
    pub planet: PlanetId,
    pub position: Point,
    pub processed: bool,
}

/// An idle cargo ship available for assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct IdleShip {
    pub id: EntityId,
    pub planet: PlanetId,
    pub position: Point,
    pub cargo: ResourceLedger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// Ship already carries the cargo.
    Delivery { ship: EntityId, destination: EntityId },
    Pickup {
        ship: EntityId,
        origin: EntityId,
        destination: EntityId,
    },
}

impl Assignment {
    pub fn ship(&self) -> EntityId {
        match self {
            Assignment::Delivery { ship, .. } | Assignment::Pickup { ship, .. } => *ship,
        }
    }

    fn apply(&self, status: &mut ShipStatus) {
        match *self {
            Assignment::Delivery { destination, .. } => status.assign_delivery(destination),
            Assignment::Pickup { origin, destination, .. } => status.assign_pickup(origin, destination),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeOutcome {
    pub assignments: Vec<Assignment>,
    /// Urgency left unserved because no ship was free.
    pub deficit: i32,
}

/// Urgency and direction for one resource on one ledger, before any
/// reduction for ships already on the way.
pub fn base_urgency(ledger: &ResourceLedger, kind: ResourceKind) -> Option<(i32, bool)> {
    let capacity = ledger.capacity(kind);
    if capacity == 0 {
        return None;
    }
    let amount = ledger.amount(kind);
    let rate = ledger.rate(kind);
    let free = (capacity - amount) as f64 / capacity as f64;
    if rate > 0 {
        Some((((1.0 - free) * 4.0).ceil() as i32, true))
    } else if rate < 0 {
        Some((free.ceil() as i32 * 8, false))
    } else {
        Some((1, amount as f64 > capacity as f64 * 0.8))
    }
}

/// Build this pass's requests, in resource-point order.
pub fn generate_requests<H: HostView>(
    economy: &FactionEconomy,
    host: &H,
    store: &ComponentStore,
) -> Vec<TradeRequest> {
    let ships: Vec<ShipStatus> = economy
        .cargo_ships
        .iter()
        .filter_map(|id| store.get::<ShipStatus>(*id))
        .collect();

    let mut requests = Vec::new();
    for &station in &economy.resource_points {
        let (Some(info), Some(ledger)) = (host.entity(station), store.get::<ResourceLedger>(station)) else {
            continue;
        };
        let outbound = ships
            .iter()
            .filter(|s| s.origin == Some(station))
            .filter(|s| matches!(s.state, ShipState::Idle | ShipState::Pathing | ShipState::Enroute))
            .count() as i32;
        let inbound = ships
            .iter()
            .filter(|s| s.destination == Some(station))
            .filter(|s| matches!(s.state, ShipState::Pathing | ShipState::Loading | ShipState::Enroute))
            .count() as i32;

        for kind in ResourceKind::ALL {
            let Some((mut urgency, export)) = base_urgency(&ledger, kind) else {
                continue;
            };
            let rate = ledger.rate(kind);
            if rate > 0 {
                urgency -= outbound;
            } else if rate < 0 {
                urgency -= inbound;
            }
            if urgency <= 0 {
                continue;
            }
            requests.push(TradeRequest {
                resource: kind,
                urgency,
                export,
                station,
                planet: info.planet,
                position: info.position,
                processed: false,
            });
        }
    }
    requests
}

/// Most urgent first. Equal urgencies keep their generation order.
pub fn sort_requests(requests: &mut [TradeRequest]) {
    requests.sort_by(|a, b| b.urgency.cmp(&a.urgency));
}

fn within<H: HostView>(host: &H, from: PlanetId, to: PlanetId, hops: u32) -> bool {
    host.hops(from, to).is_some_and(|h| h <= hops)
}

/// Match sorted requests to idle ships over a growing hop radius.
pub fn match_requests<H: HostView>(
    host: &H,
    requests: &mut [TradeRequest],
    mut ships: Vec<IdleShip>,
    grand_station: Option<EntityId>,
    hop_limit: u32,
) -> TradeOutcome {
    let mut outcome = TradeOutcome::default();
    let grand = grand_station.and_then(|id| host.entity(id));

    'hops: for hops in 0..hop_limit {
        for i in 0..requests.len() {
            if ships.is_empty() {
                break 'hops;
            }
            if requests[i].processed {
                continue;
            }
            let request = requests[i];

            let nearest = ships
                .iter()
                .enumerate()
                .filter_map(|(index, ship)| {
                    let h = host.hops(ship.planet, request.planet).filter(|h| *h <= hops)?;
                    Some((index, (h, host.distance_approx(ship.position, request.position))))
                })
                .min_by_key(|(_, rank)| *rank)
                .map(|(index, _)| index);
            let Some(index) = nearest else {
                continue;
            };
            let ship = ships[index].id;

            if !request.export && ships[index].cargo.fill_ratio(request.resource) > 0.9 {
                outcome.assignments.push(Assignment::Delivery {
                    ship,
                    destination: request.station,
                });
                requests[i].processed = true;
                ships.remove(index);
                continue;
            }

            let counterpart = requests.iter().position(|other| {
                !other.processed
                    && other.station != request.station
                    && other.resource == request.resource
                    && other.export != request.export
                    && within(host, request.planet, other.planet, hops)
            });
            let route = match counterpart {
                Some(j) => {
                    requests[j].processed = true;
                    let other = requests[j].station;
                    if request.export {
                        Some((request.station, other))
                    } else {
                        Some((other, request.station))
                    }
                }
                None => grand
                    .filter(|_| request.resource == ResourceKind::Goods && !request.export)
                    .filter(|g| g.id != request.station && within(host, request.planet, g.planet, hops))
                    .map(|g| (g.id, request.station)),
            };
            let Some((origin, destination)) = route else {
                continue;
            };
            outcome.assignments.push(Assignment::Pickup {
                ship,
                origin,
                destination,
            });
            requests[i].processed = true;
            ships.remove(index);
        }
    }

    if ships.is_empty() {
        outcome.deficit = requests
            .iter()
            .filter(|r| !r.processed)
            .fold(0i32, |sum, r| sum.saturating_add(r.urgency));
    }
    outcome
}

/// Match station needs to idle ships and commit the resulting routes.
///
/// Urgency that could not be served for lack of ships feeds the build
/// counter.
pub fn do_trade_requests<H: HostWorld>(economy: &mut FactionEconomy, ctx: &mut TickContext<'_, H>) {
    for id in economy.resource_points.clone() {
        if ctx.host.entity(id).is_none() || !ctx.store.has::<ResourceLedger>(id) {
            prune(economy, ctx.store, id);
        }
    }
    if economy.resource_points.len() < 2 {
        return;
    }

    let mut requests = generate_requests(economy, &*ctx.host, ctx.store);
    let ships: Vec<IdleShip> = economy
        .cargo_ships
        .iter()
        .filter(|id| ctx.store.get::<ShipStatus>(**id).is_some_and(|s| s.is_idle()))
        .filter_map(|&id| {
            let info = ctx.host.entity(id)?;
            let cargo = ctx.store.get::<ResourceLedger>(id)?;
            Some(IdleShip {
                id,
                planet: info.planet,
                position: info.position,
                cargo,
            })
        })
        .collect();

    sort_requests(&mut requests);
    let idle = ships.len();
    let outcome = match_requests(
        &*ctx.host,
        &mut requests,
        ships,
        economy.grand_station,
        ctx.config.trade_hop_limit,
    );
    for assignment in &outcome.assignments {
        ctx.store
            .with_mut(assignment.ship(), |status: &mut ShipStatus| assignment.apply(status));
    }
    economy.add_build_points(outcome.deficit);

    log::debug!(
        "{}: {} requests, {} idle ships, {} assigned, deficit {}",
        economy.faction,
        requests.len(),
        idle,
        outcome.assignments.len(),
        outcome.deficit
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::FactionId;
    use crate::config::IndustryConfig;
    use crate::host::EntityClass;
    use crate::sandbox::SandboxWorld;
    use std::collections::HashSet;

    const PLAYER: FactionId = FactionId(1);

    fn request(urgency: i32, station: i32) -> TradeRequest {
        TradeRequest {
            resource: ResourceKind::Goods,
            urgency,
            export: false,
            station: EntityId(station),
            planet: PlanetId(0),
            position: Point::ZERO,
            processed: false,
        }
    }

    fn empty_hold() -> ResourceLedger {
        ResourceLedger::new()
            .with_resource(ResourceKind::Goods, 0, 100, 0)
            .with_resource(ResourceKind::Metal, 0, 100, 0)
    }

    /// Planets 0-1-2-3 in a chain, every one owned by the player.
    fn chain() -> SandboxWorld {
        let mut host = SandboxWorld::new();
        for _ in 0..4 {
            host.add_planet(Some(PLAYER));
        }
        for i in 1..4 {
            host.link(PlanetId(i - 1), PlanetId(i));
        }
        host
    }

    #[test]
    fn test_urgency_formulas() {
        let ledger = ResourceLedger::new()
            .with_resource(ResourceKind::Goods, 600, 1_000, 3)
            .with_resource(ResourceKind::Metal, 999, 1_000, -1);
        assert_eq!(base_urgency(&ledger, ResourceKind::Goods), Some((3, true)));
        assert_eq!(base_urgency(&ledger, ResourceKind::Metal), Some((8, false)));

        let full = ResourceLedger::new().with_resource(ResourceKind::Metal, 1_000, 1_000, -1);
        assert_eq!(base_urgency(&full, ResourceKind::Metal), Some((0, false)));
        assert_eq!(base_urgency(&full, ResourceKind::Goods), None);

        let storage = ResourceLedger::new()
            .with_resource(ResourceKind::Goods, 801, 1_000, 0)
            .with_resource(ResourceKind::Metal, 800, 1_000, 0);
        assert_eq!(base_urgency(&storage, ResourceKind::Goods), Some((1, true)));
        assert_eq!(base_urgency(&storage, ResourceKind::Metal), Some((1, false)));
    }

    #[test]
    fn test_sort_is_stable_and_descending() {
        let mut requests = vec![request(5, 1), request(1, 2), request(5, 3), request(3, 4)];
        sort_requests(&mut requests);
        let order: Vec<i32> = requests.iter().map(|r| r.station.0).collect();
        assert_eq!(order, vec![1, 3, 4, 2]);
    }

    #[test]
    fn test_generate_reduces_for_ships_on_the_way() {
        let mut host = chain();
        let mut store = ComponentStore::new();
        let station = host.add_entity(PLAYER, PlanetId(1), Point::ZERO, EntityClass::Other);
        store.attach(
            station,
            ResourceLedger::new()
                .with_resource(ResourceKind::Goods, 0, 1_000, -1)
                .with_resource(ResourceKind::Metal, 1_000, 1_000, 4),
        );
        let mut economy = FactionEconomy::new(PLAYER);
        economy.add_trade_station(station);
        for _ in 0..2 {
            let ship = host.add_entity(PLAYER, PlanetId(0), Point::ZERO, EntityClass::Other);
            let mut status = ShipStatus::new();
            status.assign_pickup(station, EntityId(999));
            store.attach(ship, status);
            economy.add_cargo_ship(ship);
        }
        let inbound = host.add_entity(PLAYER, PlanetId(0), Point::ZERO, EntityClass::Other);
        let mut status = ShipStatus::new();
        status.assign_delivery(station);
        store.attach(inbound, status);
        economy.add_cargo_ship(inbound);

        let requests = generate_requests(&economy, &host, &store);
        assert_eq!(requests.len(), 2);
        assert_eq!((requests[0].resource, requests[0].urgency, requests[0].export), (ResourceKind::Goods, 7, false));
        assert_eq!((requests[1].resource, requests[1].urgency, requests[1].export), (ResourceKind::Metal, 2, true));
    }

    #[test]
    fn test_pairs_nearest_counterpart_first() {
        let mut host = chain();
        let importer = host.add_entity(PLAYER, PlanetId(0), Point::ZERO, EntityClass::Other);
        let near = host.add_entity(PLAYER, PlanetId(1), Point::ZERO, EntityClass::Other);
        let far = host.add_entity(PLAYER, PlanetId(3), Point::ZERO, EntityClass::Other);
        let mk = |station: EntityId, planet: i32, urgency: i32, export: bool| TradeRequest {
            resource: ResourceKind::Metal,
            urgency,
            export,
            station,
            planet: PlanetId(planet),
            position: Point::ZERO,
            processed: false,
        };
        let mut requests = vec![mk(importer, 0, 8, false), mk(far, 3, 4, true), mk(near, 1, 2, true)];
        let ships = vec![IdleShip {
            id: EntityId(500),
            planet: PlanetId(0),
            position: Point::ZERO,
            cargo: empty_hold(),
        }];

        let outcome = match_requests(&host, &mut requests, ships, None, 10);
        assert_eq!(
            outcome.assignments,
            vec![Assignment::Pickup {
                ship: EntityId(500),
                origin: near,
                destination: importer,
            }]
        );
        assert!(requests[0].processed && requests[2].processed);
        assert!(!requests[1].processed);
        // every ship went out, so the leftover urgency is a deficit
        assert_eq!(outcome.deficit, 4);
    }

    #[test]
    fn test_loaded_ship_delivers_directly() {
        let host = chain();
        let mut requests = vec![request(8, 42)];
        let mut cargo = empty_hold();
        cargo.adjust(ResourceKind::Goods, 95);
        let ships = vec![IdleShip {
            id: EntityId(7),
            planet: PlanetId(0),
            position: Point::ZERO,
            cargo,
        }];

        let outcome = match_requests(&host, &mut requests, ships, None, 10);
        assert_eq!(
            outcome.assignments,
            vec![Assignment::Delivery {
                ship: EntityId(7),
                destination: EntityId(42),
            }]
        );
        assert_eq!(outcome.deficit, 0);
    }

    #[test]
    fn test_goods_fall_back_to_grand_station() {
        let mut host = chain();
        let grand = host.add_entity(PLAYER, PlanetId(2), Point::ZERO, EntityClass::Other);
        let mut requests = vec![request(8, 42)];
        let ships = vec![IdleShip {
            id: EntityId(7),
            planet: PlanetId(0),
            position: Point::ZERO,
            cargo: empty_hold(),
        }];

        let outcome = match_requests(&host, &mut requests, ships.clone(), Some(grand), 10);
        assert_eq!(
            outcome.assignments,
            vec![Assignment::Pickup {
                ship: EntityId(7),
                origin: grand,
                destination: EntityId(42),
            }]
        );

        // grand station two hops out is beyond a one-hop search
        let mut requests = vec![request(8, 42)];
        let outcome = match_requests(&host, &mut requests, ships, Some(grand), 2);
        assert!(outcome.assignments.is_empty());
        assert_eq!(outcome.deficit, 0);
    }

    #[test]
    fn test_no_ship_is_assigned_twice() {
        let host = SandboxWorld::generate(11, 10, PLAYER);
        let mut requests = Vec::new();
        for i in 0..20 {
            requests.push(TradeRequest {
                resource: ResourceKind::ALL[i % 2],
                urgency: (i as i32 * 7) % 9 + 1,
                export: i % 3 == 0,
                station: EntityId(1_000 + i as i32),
                planet: PlanetId((i % 10) as i32),
                position: Point::new(i as i32 * 100, 0),
                processed: false,
            });
        }
        sort_requests(&mut requests);
        let ships: Vec<IdleShip> = (0..6)
            .map(|i| IdleShip {
                id: EntityId(2_000 + i),
                planet: PlanetId(i % 10),
                position: Point::ZERO,
                cargo: empty_hold(),
            })
            .collect();

        let outcome = match_requests(&host, &mut requests, ships, None, 10);
        let mut seen = HashSet::new();
        for assignment in &outcome.assignments {
            assert!(seen.insert(assignment.ship()));
            if let Assignment::Pickup { origin, destination, .. } = *assignment {
                let exporter = requests.iter().find(|r| r.station == origin).expect("origin");
                let importer = requests.iter().find(|r| r.station == destination).expect("destination");
                assert_eq!(exporter.resource, importer.resource);
                assert!(exporter.export && !importer.export);
            }
        }
    }

    #[test]
    fn test_no_idle_ships_feeds_build_counter() {
        let mut host = chain();
        let mut store = ComponentStore::new();
        let config = IndustryConfig::default();
        let grand = host.add_entity(PLAYER, PlanetId(0), Point::ZERO, EntityClass::Other);
        let station = host.add_entity(PLAYER, PlanetId(1), Point::ZERO, EntityClass::Other);
        store.attach(
            grand,
            ResourceLedger::new().with_resource(ResourceKind::Goods, 5_000, 10_000, 10),
        );
        store.attach(
            station,
            ResourceLedger::new().with_resource(ResourceKind::Goods, 0, 1_000, -1),
        );
        let mut economy = FactionEconomy::new(PLAYER);
        economy.grand_station = Some(grand);
        economy.add_resource_point(grand);
        economy.add_trade_station(station);

        let mut ctx = TickContext::new(&mut host, &mut store, &config);
        do_trade_requests(&mut economy, &mut ctx);
        // grand exports at 2, the station imports at 8
        assert_eq!(economy.build_counter, 10);
    }

    #[test]
    fn test_idle_ship_gets_route() {
        let mut host = chain();
        let mut store = ComponentStore::new();
        let config = IndustryConfig::default();
        let grand = host.add_entity(PLAYER, PlanetId(0), Point::ZERO, EntityClass::Other);
        let station = host.add_entity(PLAYER, PlanetId(1), Point::ZERO, EntityClass::Other);
        let ship = host.add_entity(PLAYER, PlanetId(1), Point::new(1_500, 0), EntityClass::Other);
        store.attach(
            grand,
            ResourceLedger::new().with_resource(ResourceKind::Goods, 5_000, 10_000, 10),
        );
        store.attach(
            station,
            ResourceLedger::new().with_resource(ResourceKind::Goods, 0, 1_000, -1),
        );
        store.attach(ship, empty_hold());
        store.attach(ship, ShipStatus::new());
        let mut economy = FactionEconomy::new(PLAYER);
        economy.grand_station = Some(grand);
        economy.add_resource_point(grand);
        economy.add_trade_station(station);
        economy.add_cargo_ship(ship);

        let mut ctx = TickContext::new(&mut host, &mut store, &config);
        do_trade_requests(&mut economy, &mut ctx);

        let status = store.get::<ShipStatus>(ship).expect("status");
        assert_eq!(status.state, ShipState::Pathing);
        assert_eq!(status.origin, Some(grand));
        assert_eq!(status.destination, Some(station));
        assert_eq!(economy.build_counter, 0);
    }
}
