//! Epsilon-greedy exploration with multiplicative decay.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::spaces::ActionSpace;

/// Decay settings of an [`EpsilonGreedy`] strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonConfig {
    pub initial: f64,
    pub min: f64,
    pub decay: f64,
}

impl Default for EpsilonConfig {
    fn default() -> Self {
        Self {
            initial: 1.0,
            min: 0.0,
            decay: 0.99,
        }
    }
}

/// Explores uniformly with probability epsilon, otherwise exploits.
///
/// Epsilon decays by `decay` on every [`choose`](Self::choose) call,
/// whether the call explored or not, and never drops below `min`.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    config: EpsilonConfig,
    epsilon: f64,
    rng: StdRng,
}

impl EpsilonGreedy {
    /// Creates a strategy seeded from OS entropy.
    pub fn new(initial: f64, min: f64, decay: f64) -> Self {
        Self::from_config(EpsilonConfig {
            initial,
            min,
            decay,
        })
    }

    pub fn from_config(config: EpsilonConfig) -> Self {
        Self {
            epsilon: config.initial,
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replaces the RNG with a seeded one for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn config(&self) -> EpsilonConfig {
        self.config
    }

    /// Picks an action for a state whose action values are `q_row`.
    pub fn choose(&mut self, q_row: &[f64], action_space: ActionSpace) -> usize {
        let action = if self.rng.gen::<f64>() < self.epsilon {
            action_space.sample(&mut self.rng)
        } else {
            argmax(q_row)
        };
        self.epsilon = (self.epsilon * self.config.decay).max(self.config.min);
        action
    }

    /// Restores the initial epsilon.
    pub fn reset(&mut self) {
        self.epsilon = self.config.initial;
    }
}

/// Index of the largest value; the first one wins ties. 0 for an empty row.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
