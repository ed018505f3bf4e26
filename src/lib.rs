//! tsc-rl - Traffic Signal Control with Reinforcement Learning
//!
//! A multi-agent environment in which every signalized intersection of a
//! road network is an agent choosing its next green phase, together with
//! independent tabular Q-learning agents and fixed baselines.
//!
//! The road network itself is simulated elsewhere and reached through the
//! [`simulator::Simulator`] trait; [`simulator::ToySimulator`] is a small
//! deterministic stand-in for tests and demos.

pub mod config;
pub mod environment;
pub mod error;
pub mod learning;
pub mod metrics;
pub mod observation;
pub mod policy;
pub mod reward;
pub mod signal;
pub mod simulator;
pub mod spaces;
pub mod topology;
pub mod units;

pub use config::{EnvConfig, SignalSpec};
pub use environment::{SignalEnv, StepInfo, Transition};
pub use error::{ConfigError, EnvError, SimulatorError, StoreError};
pub use learning::{EpsilonGreedy, QLAgent, QLConfig, StateKey};
pub use observation::{NeighborAggregation, ObservationFunction};
pub use reward::{RewardConfig, RewardKind};
pub use signal::TrafficSignal;

/// Identifier type used for intersections, lanes, and agents.
pub type Id = String;
