//! Civind Core - Civilian Industry Economy
//!
//! An automated economy for every player faction of a space strategy game:
//! a grand station and trade stations produce and consume resources, cargo
//! ships haul them between stations, and militia fleets are dispatched to
//! the most threatened planets where they fortify and build defences.
//!
//! # Architecture
//!
//! The game world belongs to the host. The economy only extends it:
//! - **Host**: planets, entities, movement and spawning behind [`host::HostWorld`]
//! - **Components**: ledgers, ship status and militia records attached to host ids
//! - **Systems**: per-second pipeline stages that read and update those records
//!
//! # Example
//!
//! ```rust,no_run
//! use civind_core::prelude::*;
//! use civind_core::sandbox::SandboxWorld;
//!
//! let mut host = SandboxWorld::generate(42, 12, FactionId(1));
//! let mut engine = IndustryEngine::default();
//!
//! loop {
//!     engine.update(&mut host, 1.0 / 60.0);
//!     host.apply_intents();
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod persistence;
pub mod sandbox;
pub mod store;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::IndustryConfig;
    pub use crate::engine::IndustryEngine;
    pub use crate::error::{EconomyError, PersistenceError};
    pub use crate::host::{HostView, HostWorld, MovementIntent};
}
