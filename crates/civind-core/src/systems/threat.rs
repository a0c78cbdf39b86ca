//! Per-planet threat scoring.

use super::TickContext;
use crate::components::{FactionEconomy, FactionId, MilitiaState, MilitiaUnit, PlanetId};
use crate::host::{HostView, HostWorld, Wave};

/// Every wave queued by any AI faction hostile to `faction`.
pub fn incoming_waves<H: HostView>(host: &H, faction: FactionId) -> Vec<Wave> {
    host.hostile_factions(faction)
        .iter()
        .flat_map(|hostile| host.queued_waves(hostile.id))
        .collect()
}

/// Threat on one planet, after `defenders` committed militia fleets.
///
/// Waves count double. Hostile strength on a neighbour we control counts
/// double too, since an attack can be staged from there. The home planet
/// doubles the whole hostile total. Friendly strength only counts on the
/// planet itself.
pub fn planet_threat<H: HostView>(
    host: &H,
    faction: FactionId,
    planet: PlanetId,
    home: Option<PlanetId>,
    waves: &[Wave],
    defenders: usize,
) -> i32 {
    let local = host.strength(planet, faction);
    let mut hostile: i64 = waves
        .iter()
        .filter(|wave| wave.target == planet)
        .map(|wave| wave.strength * 2)
        .sum();
    hostile += local.hostile;
    for linked in host.linked_planets(planet) {
        let mut strength = host.strength(linked, faction).hostile;
        if host.planet(linked).is_some_and(|p| p.is_controlled_by(faction)) {
            strength *= 2;
        }
        hostile += strength;
    }
    if home == Some(planet) {
        hostile *= 2;
    }

    let raw = (hostile - local.friendly) / 1000;
    let mut threat = raw.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    for _ in 0..defenders {
        threat = threat.saturating_sub((threat / 4).max(10));
    }
    threat
}

/// Score every controlled planet the faction's stations touch.
///
/// Overlapping station coverage is scored once per tick.
pub fn do_threat_calculation<H: HostWorld>(economy: &mut FactionEconomy, ctx: &mut TickContext<'_, H>) {
    economy.threat.reset_processed();
    let faction = economy.faction;
    let host = &*ctx.host;

    let home = economy
        .grand_station
        .and_then(|id| host.entity(id))
        .map(|info| info.planet);
    let waves = incoming_waves(host, faction);
    let focuses: Vec<PlanetId> = economy
        .militia_leaders
        .iter()
        .filter_map(|id| ctx.store.get::<MilitiaUnit>(*id))
        .filter(|unit| unit.state != MilitiaState::Idle)
        .filter_map(|unit| unit.planet_focus)
        .collect();

    let mut candidates = Vec::new();
    for station in economy.stations() {
        let Some(info) = host.entity(station) else {
            continue;
        };
        candidates.push(info.planet);
        candidates.extend(host.linked_planets(info.planet));
    }

    for planet in candidates {
        if economy.threat.is_processed(planet) {
            continue;
        }
        if !host.planet(planet).is_some_and(|p| p.is_controlled_by(faction)) {
            continue;
        }
        let defenders = focuses.iter().filter(|focus| **focus == planet).count();
        let threat = planet_threat(host, faction, planet, home, &waves, defenders);
        economy.threat.record(planet, threat);
    }

    log::debug!(
        "{}: threat scored on {} planets, {} threatened",
        economy.faction,
        economy.threat.processed_entries().count(),
        economy.threat.processed_entries().filter(|(_, t)| *t > 0).count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{EntityId, Point, ResourceLedger};
    use crate::config::IndustryConfig;
    use crate::host::{EntityClass, HostileFaction};
    use crate::sandbox::SandboxWorld;
    use crate::store::ComponentStore;

    const PLAYER: FactionId = FactionId(1);
    const AI: FactionId = FactionId(100);

    /// 0 (home) - 1 (colony) - 2 (hostile), all linked in a chain.
    fn world() -> SandboxWorld {
        let mut host = SandboxWorld::new();
        let home = host.add_planet(Some(PLAYER));
        let colony = host.add_planet(Some(PLAYER));
        let wild = host.add_planet(None);
        host.link(home, colony);
        host.link(colony, wild);
        host.add_hostile(HostileFaction {
            id: AI,
            intensity: 5,
            progress: 0,
        });
        host
    }

    #[test]
    fn test_quiet_planet_scores_zero() {
        let host = world();
        assert_eq!(planet_threat(&host, PLAYER, PlanetId(1), Some(PlanetId(0)), &[], 0), 0);
    }

    #[test]
    fn test_hostile_sources_are_weighted() {
        let mut host = world();
        host.set_strength(PlanetId(1), 10_000, 4_000);
        host.set_strength(PlanetId(2), 20_000, 0);
        host.set_strength(PlanetId(0), 3_000, 0);
        let waves = [
            Wave {
                target: PlanetId(1),
                strength: 5_000,
            },
            Wave {
                target: PlanetId(2),
                strength: 50_000,
            },
        ];

        // 10000 + 5000*2 + 20000 (unowned) + 3000*2 (owned) - 4000
        assert_eq!(planet_threat(&host, PLAYER, PlanetId(1), None, &waves, 0), 42);
        // doubled only when scoring the home planet itself
        assert_eq!(planet_threat(&host, PLAYER, PlanetId(1), Some(PlanetId(0)), &waves, 0), 42);
        assert_eq!(planet_threat(&host, PLAYER, PlanetId(1), Some(PlanetId(1)), &waves, 0), 88);
    }

    #[test]
    fn test_each_defender_mitigates_less() {
        let mut host = world();
        host.set_strength(PlanetId(2), 100_000, 0);
        assert_eq!(planet_threat(&host, PLAYER, PlanetId(1), None, &[], 0), 100);
        assert_eq!(planet_threat(&host, PLAYER, PlanetId(1), None, &[], 1), 75);
        assert_eq!(planet_threat(&host, PLAYER, PlanetId(1), None, &[], 2), 57);
        // the floor of 10 applies to small threats
        host.set_strength(PlanetId(2), 12_000, 0);
        assert_eq!(planet_threat(&host, PLAYER, PlanetId(1), None, &[], 1), 2);
    }

    #[test]
    fn test_overwhelming_defence_saturates() {
        let mut host = world();
        host.set_strength(PlanetId(1), 0, i64::MAX / 2);
        assert_eq!(planet_threat(&host, PLAYER, PlanetId(1), None, &[], 0), i32::MIN);
        assert_eq!(planet_threat(&host, PLAYER, PlanetId(1), None, &[], 3), i32::MIN);
    }

    #[test]
    fn test_overlapping_coverage_scored_once() {
        let mut host = world();
        host.set_strength(PlanetId(2), 30_000, 0);
        host.queue_wave(
            AI,
            Wave {
                target: PlanetId(1),
                strength: 1_000,
            },
        );
        let grand = host.add_entity(PLAYER, PlanetId(0), Point::ZERO, EntityClass::Other);
        let station = host.add_entity(PLAYER, PlanetId(1), Point::ZERO, EntityClass::Other);
        let mut store = ComponentStore::new();
        store.attach(grand, ResourceLedger::new());
        store.attach(station, ResourceLedger::new());
        let mut economy = FactionEconomy::new(PLAYER);
        economy.grand_station = Some(grand);
        economy.add_resource_point(grand);
        economy.add_trade_station(station);

        let leader = EntityId(900);
        let mut unit = MilitiaUnit::new();
        unit.state = MilitiaState::Pathing;
        unit.planet_focus = Some(PlanetId(1));
        store.attach(leader, unit);
        economy.add_militia_leader(leader);

        let config = IndustryConfig::default();
        let mut ctx = TickContext::new(&mut host, &mut store, &config);
        do_threat_calculation(&mut economy, &mut ctx);

        let mut scored: Vec<(PlanetId, i32)> = economy.threat.processed_entries().collect();
        scored.sort();
        // planet 2 is not ours, planet 1 is covered by both stations
        assert_eq!(scored.len(), 2);
        // 30000 + 1000*2 = 32, one defender takes off 10
        assert_eq!(scored[1], (PlanetId(1), 22));
        assert_eq!(scored[0], (PlanetId(0), 0));
    }
}
