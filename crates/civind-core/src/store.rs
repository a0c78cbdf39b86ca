//! Arena of per-entity extension records.
//!
//! The host owns the entities; the economy owns the records attached to
//! them. Records live in a `hecs::World`, indexed by the host's [`EntityId`].

use hecs::{Component, Entity, World};
use std::collections::HashMap;

use crate::components::{EntityId, MilitiaUnit, ResourceLedger, ShipStatus};

/// Back-reference from an ECS entity to the host entity it extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostEntity(pub EntityId);

#[derive(Default)]
pub struct ComponentStore {
    world: World,
    index: HashMap<EntityId, Entity>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach or replace a record on `id`.
    pub fn attach<T: Component>(&mut self, id: EntityId, component: T) {
        match self.index.get(&id).copied() {
            Some(entity) if self.world.contains(entity) => {
                if let Err(err) = self.world.insert_one(entity, component) {
                    log::warn!("record for {} not attached: {}", id, err);
                }
            }
            stale => {
                if stale.is_some() {
                    log::warn!("{} had a stale index entry, respawning its records", id);
                }
                let entity = self.world.spawn((HostEntity(id), component));
                self.index.insert(id, entity);
            }
        }
    }

    /// Cloned copy of a record.
    pub fn get<T: Component + Clone>(&self, id: EntityId) -> Option<T> {
        let entity = *self.index.get(&id)?;
        let component = self.world.get::<&T>(entity).ok()?;
        Some((*component).clone())
    }

    /// Run `f` against a record in place.
    pub fn with_mut<T: Component, R>(&mut self, id: EntityId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let entity = *self.index.get(&id)?;
        let mut component = self.world.get::<&mut T>(entity).ok()?;
        Some(f(&mut *component))
    }

    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.index
            .get(&id)
            .and_then(|entity| self.world.entity(*entity).ok())
            .map(|entity| entity.has::<T>())
            .unwrap_or(false)
    }

    pub fn detach<T: Component>(&mut self, id: EntityId) -> Option<T> {
        let entity = *self.index.get(&id)?;
        self.world.remove_one::<T>(entity).ok()
    }

    /// Destroy every record attached to `id`.
    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.index.remove(&id) {
            Some(entity) => self.world.despawn(entity).is_ok(),
            None => false,
        }
    }

    /// Move every record from `from` onto `to`, replacing what `to` had.
    pub fn transfer(&mut self, from: EntityId, to: EntityId) {
        let ledger = self.detach::<ResourceLedger>(from);
        let ship = self.detach::<ShipStatus>(from);
        let militia = self.detach::<MilitiaUnit>(from);
        self.remove(from);
        if let Some(ledger) = ledger {
            self.attach(to, ledger);
        }
        if let Some(ship) = ship {
            self.attach(to, ship);
        }
        if let Some(militia) = militia {
            self.attach(to, militia);
        }
    }

    /// Host ids carrying a `T` record, sorted for deterministic iteration.
    pub fn ids_with<T: Component>(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .world
            .query::<(&HostEntity, &T)>()
            .iter()
            .map(|(_, (host, _))| host.0)
            .collect();
        ids.sort();
        ids
    }

    /// Every tracked host id, sorted.
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.index.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
