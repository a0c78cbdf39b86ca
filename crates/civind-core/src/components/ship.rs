//! Cargo ship lifecycle component.

use super::common::EntityId;
use serde::{Deserialize, Serialize};

/// What a cargo ship is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShipState {
    /// Waiting for a trade assignment
    #[default]
    Idle,
    /// Docked at the origin, taking on cargo
    Loading,
    /// Docked at the destination, handing over cargo
    Unloading,
    /// Travelling to the origin for pickup
    Pathing,
    /// Travelling to the destination for delivery
    Enroute,
}

impl ShipState {
    /// Travelling states are the ones that need movement orders.
    pub fn is_travelling(self) -> bool {
        matches!(self, ShipState::Pathing | ShipState::Enroute)
    }
}

/// Per-cargo-ship status record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipStatus {
    pub state: ShipState,
    /// Pickup station; `None` for direct deliveries.
    pub origin: Option<EntityId>,
    pub destination: Option<EntityId>,
    /// Seconds left on the current dock.
    pub load_timer: i32,
}

impl ShipStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.state == ShipState::Idle
    }

    /// Pick up at `origin`, then deliver to `destination`.
    pub fn assign_pickup(&mut self, origin: EntityId, destination: EntityId) {
        self.state = ShipState::Pathing;
        self.origin = Some(origin);
        self.destination = Some(destination);
        self.load_timer = 0;
    }

    /// Deliver cargo already aboard.
    pub fn assign_delivery(&mut self, destination: EntityId) {
        self.state = ShipState::Enroute;
        self.origin = None;
        self.destination = Some(destination);
        self.load_timer = 0;
    }

    /// The station the ship is currently heading for, if travelling.
    pub fn travel_target(&self) -> Option<EntityId> {
        match self.state {
            ShipState::Pathing => self.origin,
            ShipState::Enroute => self.destination,
            _ => None,
        }
    }

    pub fn dock(&mut self, load_time: i32) {
        self.state = match self.state {
            ShipState::Pathing => ShipState::Loading,
            ShipState::Enroute => ShipState::Unloading,
            other => other,
        };
        self.load_timer = load_time;
    }

    /// Back to Idle with no route.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
