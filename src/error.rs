//! Error types for environment construction, stepping, simulation and
//! Q-table persistence.

use thiserror::Error;

use crate::Id;

/// Configuration problems detected while building or resetting the
/// environment. These are fatal: nothing degrades silently.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("No traffic signals configured")]
    NoSignals,

    #[error("Traffic signal declared twice: {0}")]
    DuplicateSignal(Id),

    #[error("Traffic signal {signal} declares unknown neighbor {neighbor}")]
    UnknownNeighbor { signal: Id, neighbor: Id },

    #[error("Traffic signal {signal} lists itself as a neighbor")]
    SelfNeighbor { signal: Id },

    #[error("Traffic signal {signal} controls unknown lane {lane}")]
    UnknownLane { signal: Id, lane: Id },

    #[error("Traffic signal {signal} controls no lanes")]
    NoLanes { signal: Id },

    #[error("Traffic signal {signal} has no green phases")]
    NoGreenPhases { signal: Id },

    #[error("Traffic signal {signal}: green phase {index} ({state:?}) is not a valid green state")]
    InvalidGreenPhase { signal: Id, index: usize, state: String },

    #[error("Traffic signal {signal}: phase {index} has {found} links, expected {expected}")]
    PhaseLengthMismatch {
        signal: Id,
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    #[error("Invalid state encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid reward shaping: {0}")]
    InvalidReward(String),

    #[error("Observation for {agent} has length {found} but its space declares {expected}")]
    ObservationShape {
        agent: Id,
        expected: usize,
        found: usize,
    },

    #[error("Observation for {agent} leaves its declared bounds at index {index}")]
    ObservationOutOfBounds { agent: Id, index: usize },
}

/// Errors raised by the turn-based environment API.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Unknown agent: {0}")]
    UnknownAgent(Id),

    #[error("Action {action} is out of range for {agent} ({n} green phases)")]
    InvalidAction { agent: Id, action: usize, n: usize },

    #[error("Agent {0} is live and must be given an action")]
    MissingAction(Id),

    #[error("Environment must be reset before stepping")]
    NotReset,

    #[error("Episode is finished; call reset")]
    EpisodeFinished,

    #[error("Simulator failed to reset: {0}")]
    SimulatorReset(#[from] SimulatorError),
}

/// Conditions reported by the simulator adapter.
///
/// While advancing time these surface as episode truncation, not as a
/// fatal error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulatorError {
    #[error("Simulation deadlocked on lane {lane}")]
    Deadlock { lane: Id },

    #[error("Teleport limit exceeded ({count} teleports)")]
    TeleportLimit { count: u32 },

    #[error("Simulator connection lost: {0}")]
    Disconnected(String),
}

/// Errors raised while persisting or restoring Q-tables.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Q-table I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Q-table blob could not be decoded: {0}")]
    Codec(#[from] bincode::Error),
}
