//! Unit catalogue - every host unit type the economy spawns.

use super::ledger::ResourceKind;
use serde::{Deserialize, Serialize};

/// Unit types owned by the civilian industry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    GrandStation,
    TradeStation,
    CargoShip,
    MilitiaLeader,
    MilitiaOutpost,
    /// Static defence built by a Defending outpost
    MilitiaTurret(ResourceKind),
    /// Mobile ship built by a Patrolling fleet
    MilitiaShip(ResourceKind),
}

/// Static description of a unit type, resolved without string lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitDescriptor {
    /// Host-side type name
    pub type_name: &'static str,
    /// Clearance the host placement search should keep around it
    pub placement_radius: i64,
}

const GRAND_STATION: UnitDescriptor = UnitDescriptor {
    type_name: "GrandStation",
    placement_radius: 600,
};
const TRADE_STATION: UnitDescriptor = UnitDescriptor {
    type_name: "TradeStation",
    placement_radius: 400,
};
const CARGO_SHIP: UnitDescriptor = UnitDescriptor {
    type_name: "CargoShip",
    placement_radius: 80,
};
const MILITIA_LEADER: UnitDescriptor = UnitDescriptor {
    type_name: "MilitiaLeader",
    placement_radius: 150,
};
const MILITIA_OUTPOST: UnitDescriptor = UnitDescriptor {
    type_name: "MilitiaOutpost",
    placement_radius: 300,
};
const TURRETS: [UnitDescriptor; 2] = [
    UnitDescriptor {
        type_name: "MilitiaGoodsTurret",
        placement_radius: 120,
    },
    UnitDescriptor {
        type_name: "MilitiaMetalTurret",
        placement_radius: 120,
    },
];
const SHIPS: [UnitDescriptor; 2] = [
    UnitDescriptor {
        type_name: "MilitiaGoodsShip",
        placement_radius: 60,
    },
    UnitDescriptor {
        type_name: "MilitiaMetalShip",
        placement_radius: 60,
    },
];

impl UnitKind {
    pub fn descriptor(self) -> &'static UnitDescriptor {
        match self {
            UnitKind::GrandStation => &GRAND_STATION,
            UnitKind::TradeStation => &TRADE_STATION,
            UnitKind::CargoShip => &CARGO_SHIP,
            UnitKind::MilitiaLeader => &MILITIA_LEADER,
            UnitKind::MilitiaOutpost => &MILITIA_OUTPOST,
            UnitKind::MilitiaTurret(kind) => &TURRETS[kind.index()],
            UnitKind::MilitiaShip(kind) => &SHIPS[kind.index()],
        }
    }

    pub fn type_name(self) -> &'static str {
        self.descriptor().type_name
    }
}
