//! Industry engine - main entry point for running the economy

use std::collections::BTreeMap;

use crate::components::*;
use crate::config::IndustryConfig;
use crate::error::{EconomyError, PersistenceError};
use crate::host::{HostView, HostWorld, MovementIntent};
use crate::store::ComponentStore;
use crate::systems::*;

/// Civilian industry for every player faction in one world
pub struct IndustryEngine {
    /// Factions with an active industry
    pub registry: WorldRegistry,
    /// One economy per registered faction
    pub economies: BTreeMap<FactionId, FactionEconomy>,
    /// Per-entity ledgers, ship status and militia records
    pub components: ComponentStore,
    config: IndustryConfig,

    /// Simulated seconds since start
    sim_time: f64,
    /// Main ticks run so far
    tick_count: u64,
    last_main_tick: f64,
}

impl IndustryEngine {
    pub fn new(config: IndustryConfig) -> Self {
        Self {
            registry: WorldRegistry::new(),
            economies: BTreeMap::new(),
            components: ComponentStore::new(),
            config,
            sim_time: 0.0,
            tick_count: 0,
            last_main_tick: 0.0,
        }
    }

    /// Register player factions the host reports for the first time.
    /// Returns how many were added.
    pub fn observe_factions<H: HostView>(&mut self, host: &H) -> usize {
        let mut added = 0;
        for faction in host.player_factions() {
            if self.registry.register(faction) {
                self.economies.insert(faction, FactionEconomy::new(faction));
                log::info!("{}: civilian industry registered", faction);
                added += 1;
            }
        }
        added
    }

    /// Drop a faction's economy and destroy every record it owns.
    pub fn remove_faction(&mut self, faction: FactionId) -> Result<(), EconomyError> {
        let economy = self
            .economies
            .remove(&faction)
            .ok_or(EconomyError::UnknownFaction(faction))?;
        let owned = economy
            .resource_points
            .iter()
            .chain(&economy.cargo_ships)
            .chain(&economy.militia_leaders)
            .chain(&economy.trade_stations)
            .chain(economy.grand_station.iter());
        for id in owned {
            self.components.remove(*id);
        }
        log::info!("{}: civilian industry removed", faction);
        Ok(())
    }

    /// Advance the clock, running one main tick per whole simulated second
    /// and a planning pass every `planning_interval_seconds` ticks.
    pub fn update<H: HostWorld>(&mut self, host: &mut H, delta_seconds: f64) {
        self.sim_time += delta_seconds.max(0.0);
        let interval = u64::from(self.config.planning_interval_seconds.max(1));

        while self.sim_time - self.last_main_tick >= 1.0 {
            self.tick_main(host);
            self.last_main_tick += 1.0;

            if self.tick_count % interval == 0 {
                let intents = self.tick_planning(&*host);
                log::trace!("planning pass queued {} intents", intents.len());
                for intent in intents {
                    host.enqueue(intent);
                }
            }
        }
    }

    /// The per-second pipeline for every registered faction.
    ///
    /// A faction that cannot be served is logged and skipped; the rest still
    /// run.
    pub fn tick_main<H: HostWorld>(&mut self, host: &mut H) {
        self.observe_factions(&*host);
        let factions = self.registry.factions.clone();
        for faction in factions {
            if let Err(err) = self.tick_faction(host, faction) {
                log::warn!("skipping tick for {}: {}", faction, err);
            }
        }
        self.tick_count += 1;
    }

    /// The per-second pipeline for one faction, in fixed order.
    pub fn tick_faction<H: HostWorld>(&mut self, host: &mut H, faction: FactionId) -> Result<(), EconomyError> {
        if !host.player_factions().contains(&faction) {
            return Err(EconomyError::FactionUnavailable(faction));
        }
        let economy = self
            .economies
            .get_mut(&faction)
            .ok_or(EconomyError::UnknownFaction(faction))?;
        let scaling = FactionScaling::from_hostiles(&host.hostile_factions(faction));
        let mut ctx = TickContext::new(host, &mut self.components, &self.config);
        ctx.scaling = scaling;

        ensure_grand_station(economy, &mut ctx);
        ensure_trade_stations(economy, &mut ctx);
        do_resources(economy, &mut ctx);
        spawn_cargo_ships(economy, &mut ctx);
        spawn_militia(economy, &mut ctx);
        detect_ship_arrivals(economy, &mut ctx);
        do_cargo_transfer(economy, &mut ctx);
        do_trade_requests(economy, &mut ctx);
        do_threat_calculation(economy, &mut ctx);
        do_militia_orders(economy, &mut ctx);
        do_militia_deployment(economy, &mut ctx);
        Ok(())
    }

    /// Movement intents for every faction, from committed state only.
    pub fn tick_planning<H: HostView>(&self, host: &H) -> Vec<MovementIntent> {
        self.economies
            .values()
            .flat_map(|economy| plan_movements(economy, host, &self.components, &self.config))
            .collect()
    }

    /// Put a militia fleet into the patrolling posture.
    pub fn order_patrol<H: HostView>(&mut self, host: &H, faction: FactionId, leader: EntityId) -> Result<(), EconomyError> {
        let economy = self
            .economies
            .get_mut(&faction)
            .ok_or(EconomyError::UnknownFaction(faction))?;
        begin_patrol(economy, &mut self.components, &self.config, host, leader)
    }

    pub fn economy(&self, faction: FactionId) -> Option<&FactionEconomy> {
        self.economies.get(&faction)
    }

    pub fn economy_mut(&mut self, faction: FactionId) -> Option<&mut FactionEconomy> {
        self.economies.get_mut(&faction)
    }

    pub fn config(&self) -> &IndustryConfig {
        &self.config
    }

    /// Get current simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Save engine state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), PersistenceError> {
        crate::persistence::save_engine(
            writer,
            &self.registry,
            &self.economies,
            &self.components,
            self.sim_time,
            self.tick_count,
        )
    }

    /// Load engine state from a reader. Configuration is kept.
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), PersistenceError> {
        let loaded = crate::persistence::load_engine(reader)?;

        self.registry = loaded.registry;
        self.economies = loaded.economies;
        self.components = loaded.components;
        self.sim_time = loaded.sim_time;
        self.tick_count = loaded.tick_count;
        self.last_main_tick = loaded.sim_time.floor();
        Ok(())
    }
}

impl Default for IndustryEngine {
    fn default() -> Self {
        Self::new(IndustryConfig::default())
    }
}
