//! Save/Load for the industry engine
//!
//! Uses bincode for a compact, ordered binary encoding. Every collection is
//! written as an element count followed by the elements; resource arrays
//! are written as `count` + elements per field and tolerate a different
//! resource-kind count on load.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::components::*;
use crate::error::PersistenceError;
use crate::store::ComponentStore;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the engine state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    /// Simulated seconds since start
    pub sim_time: f64,
    pub tick_count: u64,
    pub registry: WorldRegistry,
    /// Economies in faction order
    pub economies: Vec<FactionEconomy>,
    /// Every host entity carrying at least one record
    pub entities: Vec<SerializableEntity>,
}

/// All records attached to one host entity, serialized as optionals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableEntity {
    pub id: EntityId,
    pub ledger: Option<ResourceLedger>,
    pub ship: Option<ShipStatus>,
    pub militia: Option<MilitiaUnit>,
}

/// Extract all records from the store into serializable form
fn serialize_entities(store: &ComponentStore) -> Vec<SerializableEntity> {
    store
        .ids()
        .into_iter()
        .map(|id| SerializableEntity {
            id,
            ledger: store.get::<ResourceLedger>(id),
            ship: store.get::<ShipStatus>(id),
            militia: store.get::<MilitiaUnit>(id),
        })
        .collect()
}

/// Rebuild a store from serialized records
fn deserialize_entities(entities: Vec<SerializableEntity>) -> ComponentStore {
    let mut store = ComponentStore::new();
    for entity in entities {
        if let Some(c) = entity.ledger {
            store.attach(entity.id, c);
        }
        if let Some(c) = entity.ship {
            store.attach(entity.id, c);
        }
        if let Some(c) = entity.militia {
            store.attach(entity.id, c);
        }
    }
    store
}

/// Encode one record (registry, economy, ledger, ship status, militia unit).
pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, PersistenceError> {
    Ok(bincode::serialize(record)?)
}

pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PersistenceError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Save the complete engine to a writer
pub fn save_engine<W: Write>(
    writer: W,
    registry: &WorldRegistry,
    economies: &BTreeMap<FactionId, FactionEconomy>,
    store: &ComponentStore,
    sim_time: f64,
    tick_count: u64,
) -> Result<(), PersistenceError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        sim_time,
        tick_count,
        registry: registry.clone(),
        economies: economies.values().cloned().collect(),
        entities: serialize_entities(store),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load an engine snapshot from a reader
pub fn load_engine<R: Read>(reader: R) -> Result<LoadedEngine, PersistenceError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(PersistenceError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let economies = save_data
        .economies
        .into_iter()
        .map(|economy| (economy.faction, economy))
        .collect();

    Ok(LoadedEngine {
        registry: save_data.registry,
        economies,
        components: deserialize_entities(save_data.entities),
        sim_time: save_data.sim_time,
        tick_count: save_data.tick_count,
    })
}

/// Result of loading an engine snapshot
pub struct LoadedEngine {
    pub registry: WorldRegistry,
    pub economies: BTreeMap<FactionId, FactionEconomy>,
    pub components: ComponentStore,
    pub sim_time: f64,
    pub tick_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::IndustryEngine;
    use crate::sandbox::SandboxWorld;

    #[test]
    fn test_save_load_roundtrip() {
        let player = FactionId(1);
        let mut host = SandboxWorld::generate(3, 8, player);
        let mut engine = IndustryEngine::default();
        for _ in 0..30 {
            engine.update(&mut host, 1.0);
            host.apply_intents();
        }

        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).expect("Save failed");

        let mut loaded_engine = IndustryEngine::default();
        loaded_engine.load(&save_buffer[..]).expect("Load failed");

        assert_eq!(loaded_engine.registry, engine.registry);
        assert_eq!(loaded_engine.economies, engine.economies);
        assert_eq!(loaded_engine.tick_count(), engine.tick_count());
        assert!((loaded_engine.sim_time() - engine.sim_time()).abs() < 0.001);
        assert_eq!(
            serialize_entities(&loaded_engine.components),
            serialize_entities(&engine.components)
        );
    }

    #[test]
    fn test_loaded_engine_keeps_ticking() {
        let player = FactionId(1);
        let mut host = SandboxWorld::generate(5, 6, player);
        let mut engine = IndustryEngine::default();
        engine.update(&mut host, 5.0);

        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).expect("Save failed");
        let mut loaded_engine = IndustryEngine::default();
        loaded_engine.load(&save_buffer[..]).expect("Load failed");

        loaded_engine.update(&mut host, 1.0);
        assert_eq!(loaded_engine.tick_count(), 6);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let data = SaveData {
            version: SAVE_VERSION + 1,
            sim_time: 0.0,
            tick_count: 0,
            registry: WorldRegistry::new(),
            economies: Vec::new(),
            entities: Vec::new(),
        };
        let bytes = bincode::serialize(&data).expect("encode");
        match load_engine(&bytes[..]) {
            Err(PersistenceError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, SAVE_VERSION + 1);
            }
            other => panic!("expected version mismatch, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_records_roundtrip() {
        let mut economy = FactionEconomy::new(FactionId(4));
        economy.grand_station = Some(EntityId(10));
        economy.add_trade_station(EntityId(11));
        economy.add_cargo_ship(EntityId(12));
        economy.add_militia_leader(EntityId(13));
        economy.build_counter = 77;
        economy.threat.record(PlanetId(3), 12);
        let decoded: FactionEconomy = decode_record(&encode_record(&economy).expect("encode")).expect("decode");
        assert_eq!(decoded, economy);

        let mut unit = MilitiaUnit::new();
        unit.state = MilitiaState::Defending;
        unit.planet_focus = Some(PlanetId(3));
        unit.add_processed(ResourceKind::Metal, 45);
        let decoded: MilitiaUnit = decode_record(&encode_record(&unit).expect("encode")).expect("decode");
        assert_eq!(decoded, unit);
    }

    #[test]
    fn test_ledger_layout_is_count_prefixed() {
        let ledger = ResourceLedger::new().with_resource(ResourceKind::Metal, 5, 9, -1);
        let bytes = encode_record(&ledger).expect("encode");
        // three fields of (u64 count + 2 x i32)
        assert_eq!(bytes.len(), 3 * (8 + 2 * 4));
        assert_eq!(&bytes[..8], &(RESOURCE_KINDS as u64).to_le_bytes());
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        let bytes = encode_record(&ShipStatus::new()).expect("encode");
        let result: Result<ShipStatus, _> = decode_record(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(PersistenceError::Bincode(_))));
    }
}
