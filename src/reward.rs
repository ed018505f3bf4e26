//! Per-signal reward for the signal environment.
//!
//! Rewards are computed once per decision interval for every signal, from
//! the same post-interval simulator state.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::signal::TrafficSignal;
use crate::simulator::Simulator;

/// Which traffic measure a reward is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RewardKind {
    /// Decrease of accumulated waiting time since the previous interval.
    #[default]
    DiffWaitingTime,
    /// Negated number of halted vehicles on the controlled lanes.
    QueueLength,
}

/// Reward shaping settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub kind: RewardKind,
    /// Divisor applied to the raw measure.
    pub scale: f64,
    /// Symmetric clip bound applied after scaling.
    #[serde(default)]
    pub clip: Option<f64>,
}

impl RewardConfig {
    /// Rejects a non-positive scale or clip bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ConfigError::InvalidReward(format!(
                "scale must be positive and finite, got {}",
                self.scale
            )));
        }
        if let Some(c) = self.clip {
            if c.is_nan() || c <= 0.0 {
                return Err(ConfigError::InvalidReward(format!(
                    "clip must be positive, got {c}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            kind: RewardKind::DiffWaitingTime,
            scale: 100.0,
            clip: None,
        }
    }
}

/// Computes rewards for the signal environment.
///
/// Keeps the previous waiting-time measure of every signal, so one
/// computer serves exactly one network.
#[derive(Debug, Clone)]
pub struct RewardComputer {
    config: RewardConfig,
    last_measure: Vec<f64>,
}

impl RewardComputer {
    pub fn new(config: RewardConfig, num_signals: usize) -> Self {
        Self {
            config,
            last_measure: vec![0.0; num_signals],
        }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Records the current waiting measure of every signal as the baseline.
    pub fn reset<S: Simulator>(&mut self, signals: &[TrafficSignal], sim: &S) {
        self.last_measure = signals
            .iter()
            .map(|s| Self::waiting_measure(s, sim))
            .collect();
    }

    /// Reward of signal `index` for the interval that just ended.
    ///
    /// # Components
    ///
    /// - **DiffWaitingTime**: `(W_prev - W_now) / scale`, where `W` is the
    ///   accumulated waiting time over the signal's lanes. Updates `W_prev`.
    /// - **QueueLength**: `-halted / scale`.
    ///
    /// The result is clipped to `[-clip, clip]` when a clip is configured.
    pub fn compute<S: Simulator>(&mut self, index: usize, signal: &TrafficSignal, sim: &S) -> f64 {
        let scale = self.config.scale;
        let raw = match self.config.kind {
            RewardKind::DiffWaitingTime => {
                let now = Self::waiting_measure(signal, sim);
                let prev = std::mem::replace(&mut self.last_measure[index], now);
                (prev - now) / scale
            }
            RewardKind::QueueLength => -(signal.total_queued(sim) as f64) / scale,
        };
        match self.config.clip {
            Some(c) => raw.clamp(-c, c),
            None => raw,
        }
    }

    fn waiting_measure<S: Simulator>(signal: &TrafficSignal, sim: &S) -> f64 {
        signal.accumulated_waiting_time(sim)
    }
}
