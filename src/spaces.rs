//! Observation and action spaces.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Element-wise `[low, high]` bounds of an observation vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSpace {
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

impl ObservationSpace {
    /// Unit box `[0, 1]^dim`.
    pub fn unit(dim: usize) -> Self {
        Self {
            low: vec![0.0; dim],
            high: vec![1.0; dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Index of the first element outside its bounds, if any.
    ///
    /// A length mismatch reports the first missing or extra index.
    pub fn first_violation(&self, observation: &[f64]) -> Option<usize> {
        if observation.len() != self.dim() {
            return Some(observation.len().min(self.dim()));
        }
        observation
            .iter()
            .zip(self.low.iter().zip(&self.high))
            .position(|(v, (lo, hi))| !(*lo..=*hi).contains(v))
    }

    pub fn contains(&self, observation: &[f64]) -> bool {
        self.first_violation(observation).is_none()
    }
}

/// `n` discrete actions, `0..n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpace {
    pub n: usize,
}

impl ActionSpace {
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    pub fn contains(&self, action: usize) -> bool {
        action < self.n
    }

    /// Uniformly random action.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.n)
    }
}
