//! In-memory host used by tests and the headless harness.
//!
//! `SandboxWorld` implements [`HostWorld`] over a small planet graph.
//! Movement intents are applied by [`SandboxWorld::apply_intents`], which
//! teleports units one wormhole hop (or straight to a point) per call.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::components::{EntityId, FactionId, PlanetId, Point, UnitKind};
use crate::host::{
    EntityClass, EntityInfo, HostView, HostWorld, HostileFaction, MovementIntent, PlanetInfo,
    SpawnRequest, StrengthReport, UnitBehavior, Wave,
};

/// Owner used for wormholes and other unowned entities.
pub const NEUTRAL: FactionId = FactionId(-1);

#[derive(Debug, Clone)]
pub struct SandboxPlanet {
    pub id: PlanetId,
    pub controller: Option<FactionId>,
    pub links: Vec<PlanetId>,
    pub strength: StrengthReport,
}

#[derive(Debug, Clone)]
pub struct SandboxEntity {
    pub info: EntityInfo,
    pub behavior: UnitBehavior,
}

#[derive(Debug, Clone, Default)]
pub struct SandboxWorld {
    planets: Vec<SandboxPlanet>,
    entities: BTreeMap<EntityId, SandboxEntity>,
    fleets: HashMap<EntityId, Vec<EntityId>>,
    wormholes: HashMap<(PlanetId, PlanetId), EntityId>,
    players: Vec<FactionId>,
    hostiles: Vec<HostileFaction>,
    waves: HashMap<FactionId, Vec<Wave>>,
    /// Pending movement orders, applied by `apply_intents`
    pub intents: Vec<MovementIntent>,
    /// Safe-point searches with a smaller radius fail
    pub min_safe_radius: i64,
    next_id: i32,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn add_planet(&mut self, controller: Option<FactionId>) -> PlanetId {
        let id = PlanetId(self.planets.len() as i32);
        self.planets.push(SandboxPlanet {
            id,
            controller,
            links: Vec::new(),
            strength: StrengthReport::default(),
        });
        id
    }

    fn planet_mut(&mut self, id: PlanetId) -> Option<&mut SandboxPlanet> {
        usize::try_from(id.0).ok().and_then(|i| self.planets.get_mut(i))
    }

    fn planet_ref(&self, id: PlanetId) -> Option<&SandboxPlanet> {
        usize::try_from(id.0).ok().and_then(|i| self.planets.get(i))
    }

    /// Connect two planets, placing a wormhole on each side.
    pub fn link(&mut self, a: PlanetId, b: PlanetId) {
        if a == b || self.wormholes.contains_key(&(a, b)) {
            return;
        }
        for (from, to) in [(a, b), (b, a)] {
            let slot = self.planet_ref(from).map(|p| p.links.len()).unwrap_or(0) as i32;
            let position = Point::new(10_000, slot * 2_500 - 5_000);
            let wormhole = self.add_entity(NEUTRAL, from, position, EntityClass::Wormhole);
            self.wormholes.insert((from, to), wormhole);
            if let Some(planet) = self.planet_mut(from) {
                planet.links.push(to);
            }
        }
    }

    pub fn set_strength(&mut self, planet: PlanetId, hostile: i64, friendly: i64) {
        if let Some(p) = self.planet_mut(planet) {
            p.strength = StrengthReport { hostile, friendly };
        }
    }

    pub fn add_player(&mut self, faction: FactionId) {
        if !self.players.contains(&faction) {
            self.players.push(faction);
        }
    }

    pub fn remove_player(&mut self, faction: FactionId) {
        self.players.retain(|f| *f != faction);
    }

    pub fn add_hostile(&mut self, hostile: HostileFaction) {
        self.hostiles.push(hostile);
    }

    pub fn queue_wave(&mut self, ai_faction: FactionId, wave: Wave) {
        self.waves.entry(ai_faction).or_default().push(wave);
    }

    pub fn add_entity(&mut self, faction: FactionId, planet: PlanetId, position: Point, class: EntityClass) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(
            id,
            SandboxEntity {
                info: EntityInfo {
                    id,
                    faction,
                    planet,
                    position,
                    class,
                },
                behavior: UnitBehavior::Hold,
            },
        );
        id
    }

    /// Teleport an entity.
    pub fn place(&mut self, id: EntityId, planet: PlanetId, position: Point) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.info.planet = planet;
            entity.info.position = position;
        }
    }

    /// Kill an entity, as combat would.
    pub fn kill(&mut self, id: EntityId) {
        self.entities.remove(&id);
    }

    pub fn get(&self, id: EntityId) -> Option<&SandboxEntity> {
        self.entities.get(&id)
    }

    /// Live entities of one economy unit type.
    pub fn count_kind(&self, faction: FactionId, kind: UnitKind) -> usize {
        self.entities
            .values()
            .filter(|e| e.info.faction == faction && e.info.class == EntityClass::Industry(kind))
            .count()
    }

    pub fn fleet(&self, leader: EntityId) -> &[EntityId] {
        self.fleets.get(&leader).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn planet_count(&self) -> usize {
        self.planets.len()
    }

    fn path(&self, from: PlanetId, to: PlanetId) -> Option<Vec<PlanetId>> {
        self.planet_ref(from)?;
        self.planet_ref(to)?;
        if from == to {
            return Some(vec![from]);
        }
        let mut previous: HashMap<PlanetId, PlanetId> = HashMap::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);
        while let Some(current) = queue.pop_front() {
            for &next in self.planet_ref(current).map(|p| p.links.as_slice()).unwrap_or(&[]) {
                if !visited.insert(next) {
                    continue;
                }
                previous.insert(next, current);
                if next == to {
                    let mut path = vec![to];
                    let mut step = to;
                    while let Some(&prior) = previous.get(&step) {
                        path.push(prior);
                        step = prior;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// Apply and clear every queued intent. Returns how many were applied.
    pub fn apply_intents(&mut self) -> usize {
        let intents = std::mem::take(&mut self.intents);
        let mut applied = 0;
        for intent in intents {
            match intent {
                MovementIntent::MoveToPoint { unit, point } => {
                    if let Some(entity) = self.entities.get_mut(&unit) {
                        entity.info.position = point;
                        applied += 1;
                    }
                }
                MovementIntent::WormholePath { unit, destination } => {
                    let Some(current) = self.entities.get(&unit).map(|e| e.info.planet) else {
                        continue;
                    };
                    let Some(path) = self.path(current, destination) else {
                        continue;
                    };
                    if let Some(&next) = path.get(1) {
                        let arrival = self
                            .wormholes
                            .get(&(next, current))
                            .and_then(|w| self.entities.get(w))
                            .map(|w| w.info.position)
                            .unwrap_or(Point::ZERO);
                        self.place(unit, next, arrival);
                        applied += 1;
                    }
                }
            }
        }
        applied
    }

    /// Seeded random galaxy: a chain of planets with a few cross links.
    ///
    /// The first half belongs to `player` (king on planet 0, a command
    /// center on every owned planet); the rest is hostile territory.
    pub fn generate(seed: u64, planet_count: usize, player: FactionId) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut world = Self::new();
        let owned = (planet_count / 2).max(1);
        let ai = FactionId(100);

        for i in 0..planet_count {
            let controller = if i < owned { Some(player) } else { None };
            world.add_planet(controller);
        }
        for i in 1..planet_count {
            world.link(PlanetId(i as i32 - 1), PlanetId(i as i32));
        }
        for _ in 0..planet_count / 3 {
            let a = rng.gen_range(0..planet_count) as i32;
            let b = rng.gen_range(0..planet_count) as i32;
            world.link(PlanetId(a), PlanetId(b));
        }

        world.add_player(player);
        world.add_hostile(HostileFaction {
            id: ai,
            intensity: rng.gen_range(1..=10),
            progress: rng.gen_range(0..300),
        });

        world.add_entity(player, PlanetId(0), Point::ZERO, EntityClass::King);
        for i in 0..planet_count {
            let planet = PlanetId(i as i32);
            if i < owned {
                let center = Point::new(rng.gen_range(-4_000..4_000), rng.gen_range(-4_000..4_000));
                world.add_entity(player, planet, center, EntityClass::CommandCenter);
                for _ in 0..rng.gen_range(0..3) {
                    let offset = Point::new(rng.gen_range(-800..800), rng.gen_range(-800..800));
                    world.add_entity(player, planet, center + offset, EntityClass::MetalProducer);
                }
                world.set_strength(planet, 0, rng.gen_range(0..5_000));
            } else {
                world.set_strength(planet, rng.gen_range(0..40_000), 0);
                if rng.gen_bool(0.3) {
                    world.queue_wave(
                        ai,
                        Wave {
                            target: PlanetId(rng.gen_range(0..owned) as i32),
                            strength: rng.gen_range(1_000..20_000),
                        },
                    );
                }
            }
        }
        world
    }
}

impl HostView for SandboxWorld {
    fn entity(&self, id: EntityId) -> Option<EntityInfo> {
        self.entities.get(&id).map(|e| e.info)
    }

    fn planet(&self, id: PlanetId) -> Option<PlanetInfo> {
        self.planet_ref(id).map(|p| PlanetInfo {
            id: p.id,
            controller: p.controller,
        })
    }

    fn hops(&self, from: PlanetId, to: PlanetId) -> Option<u32> {
        self.path(from, to).map(|path| path.len() as u32 - 1)
    }

    fn linked_planets(&self, planet: PlanetId) -> Vec<PlanetId> {
        self.planet_ref(planet).map(|p| p.links.clone()).unwrap_or_default()
    }

    fn wormhole(&self, from: PlanetId, to: PlanetId) -> Option<EntityId> {
        self.wormholes
            .get(&(from, to))
            .copied()
            .filter(|id| self.entities.contains_key(id))
    }

    fn strength(&self, planet: PlanetId, _viewer: FactionId) -> StrengthReport {
        self.planet_ref(planet).map(|p| p.strength).unwrap_or_default()
    }

    fn hostile_factions(&self, _faction: FactionId) -> Vec<HostileFaction> {
        self.hostiles.clone()
    }

    fn queued_waves(&self, ai_faction: FactionId) -> Vec<Wave> {
        self.waves.get(&ai_faction).cloned().unwrap_or_default()
    }

    fn fleet_count(&self, fleet: EntityId, kind: UnitKind) -> u32 {
        self.fleets
            .get(&fleet)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|id| self.entities.get(id))
                    .filter(|e| e.info.class == EntityClass::Industry(kind))
                    .count() as u32
            })
            .unwrap_or(0)
    }

    fn entities_of(&self, faction: FactionId, class: EntityClass) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.info.faction == faction && e.info.class == class)
            .map(|e| e.info.id)
            .collect()
    }

    fn player_factions(&self) -> Vec<FactionId> {
        self.players.clone()
    }

    fn find_safe_point(&self, _kind: UnitKind, planet: PlanetId, anchor: Point, radius: i64) -> Option<Point> {
        self.planet_ref(planet)?;
        if radius < self.min_safe_radius {
            return None;
        }
        Some(anchor + Point::new((radius / 2) as i32, 0))
    }
}

impl HostWorld for SandboxWorld {
    fn spawn(&mut self, request: SpawnRequest) -> Option<EntityId> {
        self.planet_ref(request.planet)?;
        let id = self.add_entity(
            request.faction,
            request.planet,
            request.point,
            EntityClass::Industry(request.kind),
        );
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.behavior = request.behavior;
        }
        Some(id)
    }

    fn despawn(&mut self, id: EntityId) {
        self.entities.remove(&id);
    }

    fn add_to_fleet(&mut self, fleet: EntityId, unit: EntityId) {
        let members = self.fleets.entry(fleet).or_default();
        if !members.contains(&unit) {
            members.push(unit);
        }
    }

    fn transfer_fleet(&mut self, from: EntityId, to: EntityId) {
        if let Some(members) = self.fleets.remove(&from) {
            self.fleets.entry(to).or_default().extend(members);
        }
    }

    fn enqueue(&mut self, intent: MovementIntent) {
        self.intents.push(intent);
    }
}
