//! Error types.
//!
//! Nothing inside the per-second pipeline is fatal; these errors surface at
//! the edges (a faction the host cannot serve, save files, configuration).

use thiserror::Error;

use crate::components::{EntityId, FactionId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EconomyError {
    #[error("{0} is not available this tick")]
    FactionUnavailable(FactionId),
    #[error("{0} is not registered with the civilian industry")]
    UnknownFaction(FactionId),
    #[error("{0} is not tracked by this economy")]
    UnknownEntity(EntityId),
    #[error("{id} cannot {action} from its current state")]
    InvalidState { id: EntityId, action: &'static str },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
