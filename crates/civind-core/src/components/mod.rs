//! Component definitions for the economy.
//!
//! Components are plain data: ids, ledgers and state records. Behaviour
//! lives in systems.

mod common;
mod faction;
mod ledger;
mod militia;
mod ship;
mod units;

pub use common::*;
pub use faction::*;
pub use ledger::*;
pub use militia::*;
pub use ship::*;
pub use units::*;
