//! Configuration for the traffic-signal environment.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::observation::ObservationFunction;
use crate::reward::RewardConfig;
use crate::units::{secs, Seconds};
use crate::Id;

/// Declaration of one controlled intersection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
    /// Intersection id, also used as the agent id.
    pub id: Id,
    /// Agent-selectable green states, in action order.
    pub green_phases: Vec<String>,
    /// Controlled lanes, in feature order.
    pub lanes: Vec<Id>,
    /// Intersections whose lane density feeds the neighbor-aware observation.
    #[serde(default)]
    pub neighbors: Vec<Id>,
}

impl SignalSpec {
    pub fn new(id: impl Into<Id>, green_phases: Vec<String>, lanes: Vec<Id>) -> Self {
        Self {
            id: id.into(),
            green_phases,
            lanes,
            neighbors: Vec::new(),
        }
    }

    pub fn with_neighbors(mut self, neighbors: Vec<Id>) -> Self {
        self.neighbors = neighbors;
        self
    }
}

/// Configuration of the multi-agent signal environment.
///
/// Controls the network's signals, phase timing, the decision interval,
/// the episode horizon, observation encoding, and reward shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    // --- Network ---
    /// Controlled intersections, in turn order.
    pub signals: Vec<SignalSpec>,

    // --- Timing ---
    /// Simulated time between two decisions of the same agent.
    pub delta_time: Seconds,
    /// Duration of every yellow transition.
    pub yellow_time: Seconds,
    /// Minimum green time before a different green may be requested.
    pub min_green: Seconds,
    /// Episode horizon; all agents terminate once simulated time reaches it.
    pub num_seconds: Seconds,

    // --- Observation ---
    pub observation: ObservationFunction,
    /// Bins per continuous feature when encoding a state key.
    pub encoding_bins: u32,

    // --- Reward ---
    pub reward: RewardConfig,
}

impl EnvConfig {
    /// A configuration with default timing for the given signals.
    pub fn with_signals(signals: Vec<SignalSpec>) -> Self {
        Self {
            signals,
            ..Self::default()
        }
    }

    /// Checks settings that do not depend on the simulator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signals.is_empty() {
            return Err(ConfigError::NoSignals);
        }
        if self.yellow_time.value() <= 0.0 {
            return Err(ConfigError::InvalidTiming(
                "yellow_time must be positive".into(),
            ));
        }
        if self.min_green.value() < 0.0 {
            return Err(ConfigError::InvalidTiming(
                "min_green must be non-negative".into(),
            ));
        }
        if self.delta_time.value() <= self.yellow_time.value() {
            return Err(ConfigError::InvalidTiming(format!(
                "delta_time ({}s) must exceed yellow_time ({}s)",
                self.delta_time.value(),
                self.yellow_time.value()
            )));
        }
        if self.num_seconds.value() <= 0.0 {
            return Err(ConfigError::InvalidTiming(
                "num_seconds must be positive".into(),
            ));
        }
        if self.encoding_bins < 2 {
            return Err(ConfigError::InvalidEncoding(format!(
                "encoding_bins must be at least 2, got {}",
                self.encoding_bins
            )));
        }
        self.reward.validate()
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            signals: Vec::new(),
            delta_time: secs(5.0),
            yellow_time: secs(2.0),
            min_green: secs(5.0),
            num_seconds: secs(20_000.0),
            observation: ObservationFunction::default(),
            encoding_bins: 10,
            reward: RewardConfig::default(),
        }
    }
}
