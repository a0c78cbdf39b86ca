//! Resource accounting attached to stations, cargo ships and militia.

use serde::{Deserialize, Serialize};

/// Number of resource kinds tracked per entity.
pub const RESOURCE_KINDS: usize = 2;

/// Fixed-length per-kind array.
pub type ResourceArray = [i32; RESOURCE_KINDS];

/// Fungible resources moved around by the civilian economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Goods,
    Metal,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; RESOURCE_KINDS] = [ResourceKind::Goods, ResourceKind::Metal];

    pub fn index(self) -> usize {
        match self {
            ResourceKind::Goods => 0,
            ResourceKind::Metal => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Goods => "Goods",
            ResourceKind::Metal => "Metal",
        }
    }
}

/// Amount, capacity and per-second rate for every resource kind.
///
/// Positive rates generate, negative rates consume. After every accounting
/// step `0 <= amount <= capacity` holds for each kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    #[serde(with = "resource_array")]
    pub amount: ResourceArray,
    #[serde(with = "resource_array")]
    pub capacity: ResourceArray,
    #[serde(with = "resource_array")]
    pub rate: ResourceArray,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: configure one resource kind.
    pub fn with_resource(mut self, kind: ResourceKind, amount: i32, capacity: i32, rate: i32) -> Self {
        let i = kind.index();
        self.capacity[i] = capacity.max(0);
        self.amount[i] = amount.clamp(0, self.capacity[i]);
        self.rate[i] = rate;
        self
    }

    pub fn amount(&self, kind: ResourceKind) -> i32 {
        self.amount[kind.index()]
    }

    pub fn capacity(&self, kind: ResourceKind) -> i32 {
        self.capacity[kind.index()]
    }

    pub fn rate(&self, kind: ResourceKind) -> i32 {
        self.rate[kind.index()]
    }

    pub fn set_rate(&mut self, kind: ResourceKind, rate: i32) {
        self.rate[kind.index()] = rate;
    }

    pub fn set_capacity(&mut self, kind: ResourceKind, capacity: i32) {
        let i = kind.index();
        self.capacity[i] = capacity.max(0);
        self.amount[i] = self.amount[i].min(self.capacity[i]);
    }

    pub fn is_full(&self, kind: ResourceKind) -> bool {
        self.amount(kind) >= self.capacity(kind)
    }

    /// Fill level in `0.0..=1.0`; zero-capacity kinds report empty.
    pub fn fill_ratio(&self, kind: ResourceKind) -> f64 {
        let capacity = self.capacity(kind);
        if capacity <= 0 {
            0.0
        } else {
            self.amount(kind) as f64 / capacity as f64
        }
    }

    /// Adds `delta` (possibly negative), clamped into `0..=capacity`.
    /// Returns the change actually applied.
    pub fn adjust(&mut self, kind: ResourceKind, delta: i32) -> i32 {
        let i = kind.index();
        let before = self.amount[i];
        self.amount[i] = before.saturating_add(delta).clamp(0, self.capacity[i]);
        self.amount[i] - before
    }

    /// Every consumed kind must have at least `|rate|` in stock.
    pub fn is_solvent(&self) -> bool {
        ResourceKind::ALL.iter().all(|&kind| {
            let rate = self.rate(kind);
            rate >= 0 || self.amount(kind) >= -rate
        })
    }

    /// One second of generation and consumption.
    ///
    /// All-or-nothing: an insolvent ledger is left untouched and `false` is
    /// returned.
    pub fn apply_rates(&mut self) -> bool {
        if !self.is_solvent() {
            return false;
        }
        for i in 0..RESOURCE_KINDS {
            self.amount[i] = self.amount[i]
                .saturating_add(self.rate[i])
                .clamp(0, self.capacity[i]);
        }
        true
    }
}

/// Serialises a resource array as `count` followed by `count` elements.
///
/// Decoding tolerates a stored count that differs from [`RESOURCE_KINDS`]:
/// missing trailing kinds are zero, surplus kinds are dropped.
pub(crate) mod resource_array {
    use super::{ResourceArray, RESOURCE_KINDS};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &ResourceArray, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ResourceArray, D::Error> {
        let stored = Vec::<i32>::deserialize(deserializer)?;
        let mut values = [0; RESOURCE_KINDS];
        for (slot, value) in values.iter_mut().zip(stored) {
            *slot = value;
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station() -> ResourceLedger {
        ResourceLedger::new()
            .with_resource(ResourceKind::Goods, 500, 1000, -5)
            .with_resource(ResourceKind::Metal, 990, 1000, 20)
    }

    #[test]
    fn test_apply_rates_clamps_to_capacity() {
        let mut ledger = station();
        assert!(ledger.apply_rates());
        assert_eq!(ledger.amount(ResourceKind::Goods), 495);
        assert_eq!(ledger.amount(ResourceKind::Metal), 1000);
    }

    #[test]
    fn test_insolvent_ledger_is_untouched() {
        let mut ledger = station();
        ledger.amount[ResourceKind::Goods.index()] = 4;
        let before = ledger.clone();
        assert!(!ledger.apply_rates());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_exactly_solvent_drains_to_zero() {
        let mut ledger = ResourceLedger::new().with_resource(ResourceKind::Goods, 5, 100, -5);
        assert!(ledger.apply_rates());
        assert_eq!(ledger.amount(ResourceKind::Goods), 0);
        assert!(!ledger.apply_rates());
    }

    #[test]
    fn test_amount_stays_in_bounds_over_many_steps() {
        let mut ledger = ResourceLedger::new()
            .with_resource(ResourceKind::Goods, 0, 300, 7)
            .with_resource(ResourceKind::Metal, 300, 300, -3);
        for _ in 0..500 {
            ledger.apply_rates();
            for kind in ResourceKind::ALL {
                assert!(ledger.amount(kind) >= 0);
                assert!(ledger.amount(kind) <= ledger.capacity(kind));
            }
        }
    }

    #[test]
    fn test_adjust_reports_applied_delta() {
        let mut ledger = ResourceLedger::new().with_resource(ResourceKind::Metal, 98, 100, 0);
        assert_eq!(ledger.adjust(ResourceKind::Metal, 5), 2);
        assert_eq!(ledger.adjust(ResourceKind::Metal, -150), -100);
        assert_eq!(ledger.amount(ResourceKind::Metal), 0);
    }

    #[test]
    fn test_fill_ratio_zero_capacity() {
        let ledger = ResourceLedger::new();
        assert_eq!(ledger.fill_ratio(ResourceKind::Goods), 0.0);
    }

    #[test]
    fn test_decode_tolerates_short_arrays() {
        // amount: [7], capacity: [9, 9, 9], rate: []
        let mut bytes = Vec::new();
        bytes.extend(bincode::serialize(&vec![7i32]).unwrap());
        bytes.extend(bincode::serialize(&vec![9i32, 9, 9]).unwrap());
        bytes.extend(bincode::serialize(&Vec::<i32>::new()).unwrap());
        let ledger: ResourceLedger = bincode::deserialize(&bytes).unwrap();
        assert_eq!(ledger.amount, [7, 0]);
        assert_eq!(ledger.capacity, [9, 9]);
        assert_eq!(ledger.rate, [0, 0]);
    }
}
