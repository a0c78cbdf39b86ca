//! Militia fleet lifecycle component.

use super::common::{EntityId, PlanetId};
use super::ledger::{resource_array, ResourceArray, ResourceKind};
use super::units::UnitKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MilitiaState {
    #[default]
    Idle,
    /// Heading for the focus planet's staging station
    Pathing,
    /// Heading for the defensive band in front of the claimed wormhole
    Enroute,
    /// Deployed as a static outpost building turrets
    Defending,
    /// Mobile posture building attack ships
    Patrolling,
    /// Reserved
    Packing,
    /// Reserved
    Assisting,
}

impl MilitiaState {
    /// Deployed postures consume resources and build units.
    pub fn is_production_site(self) -> bool {
        matches!(self, MilitiaState::Defending | MilitiaState::Patrolling)
    }
}

/// Per-militia-fleet record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilitiaUnit {
    pub state: MilitiaState,
    pub planet_focus: Option<PlanetId>,
    /// `None` while unassigned or roaming.
    pub wormhole_focus: Option<EntityId>,
    /// Resources consumed so far, spent on unit construction.
    #[serde(with = "resource_array")]
    pub processed_resources: ResourceArray,
}

impl MilitiaUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed(&self, kind: ResourceKind) -> i32 {
        self.processed_resources[kind.index()]
    }

    pub fn add_processed(&mut self, kind: ResourceKind, amount: i32) {
        let slot = &mut self.processed_resources[kind.index()];
        *slot = slot.saturating_add(amount);
    }

    /// Unit type this posture builds for `kind`, if it builds at all.
    pub fn built_unit(&self, kind: ResourceKind) -> Option<UnitKind> {
        match self.state {
            MilitiaState::Defending => Some(UnitKind::MilitiaTurret(kind)),
            MilitiaState::Patrolling => Some(UnitKind::MilitiaShip(kind)),
            _ => None,
        }
    }

    /// Drop all orders. Processed resources are kept.
    pub fn revert_to_idle(&mut self) {
        self.state = MilitiaState::Idle;
        self.planet_focus = None;
        self.wormhole_focus = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_unit_by_posture() {
        let mut unit = MilitiaUnit::new();
        assert_eq!(unit.built_unit(ResourceKind::Metal), None);

        unit.state = MilitiaState::Defending;
        assert_eq!(
            unit.built_unit(ResourceKind::Metal),
            Some(UnitKind::MilitiaTurret(ResourceKind::Metal))
        );

        unit.state = MilitiaState::Patrolling;
        assert_eq!(
            unit.built_unit(ResourceKind::Goods),
            Some(UnitKind::MilitiaShip(ResourceKind::Goods))
        );
    }

    #[test]
    fn test_revert_keeps_processed() {
        let mut unit = MilitiaUnit::new();
        unit.state = MilitiaState::Pathing;
        unit.planet_focus = Some(PlanetId(3));
        unit.wormhole_focus = Some(EntityId(40));
        unit.add_processed(ResourceKind::Metal, 75);

        unit.revert_to_idle();
        assert_eq!(unit.state, MilitiaState::Idle);
        assert_eq!(unit.planet_focus, None);
        assert_eq!(unit.wormhole_focus, None);
        assert_eq!(unit.processed(ResourceKind::Metal), 75);
    }
}
