//! Identifiers and geometry shared by every component.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host entity identifier (squad or non-squad).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub i32);

/// Host planet index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanetId(pub i32);

/// Host faction index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(pub i32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "planet#{}", self.0)
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "faction#{}", self.0)
    }
}

/// Integer point on a planet's battlefield plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Euclidean distance, rounded down.
    pub fn distance(&self, other: &Self) -> i64 {
        (self.distance_squared(other) as f64).sqrt() as i64
    }

    /// Octile approximation, within ~9% of [`Point::distance`].
    pub fn approx_distance(&self, other: &Self) -> i64 {
        let dx = (self.x - other.x).unsigned_abs() as i64;
        let dy = (self.y - other.y).unsigned_abs() as i64;
        let (long, short) = if dx > dy { (dx, dy) } else { (dy, dx) };
        long + short * 41 / 100
    }

    /// Point `amount` units from `self` in the direction of `target`.
    /// Returns `target` if it is closer than `amount`.
    pub fn toward(&self, target: &Self, amount: i64) -> Self {
        let length = self.distance(target);
        if length <= amount || length == 0 {
            return *target;
        }
        let scale = amount as f64 / length as f64;
        Self {
            x: self.x + ((target.x - self.x) as f64 * scale).round() as i32,
            y: self.y + ((target.y - self.y) as f64 * scale).round() as i32,
        }
    }
}

impl std::ops::Add for Point {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::Sub for Point {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}
