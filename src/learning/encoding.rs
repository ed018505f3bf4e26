//! Discretization of observation vectors into hashable state keys.

use serde::{Deserialize, Serialize};

/// Hashable key of a discretized observation.
///
/// Layout: `[green_index, min_green_flag, bin(f)...]` for the remaining
/// features of the observation. A tiered neighbor density, when present,
/// closes the key as its tier index `0`, `1` or `2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey(pub Vec<u32>);

impl StateKey {
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

/// Turns observation vectors of one signal into [`StateKey`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEncoder {
    num_green_phases: usize,
    bins: u32,
    tiered_tail: bool,
}

impl StateEncoder {
    /// `bins` is clamped to at least 1.
    pub fn new(num_green_phases: usize, bins: u32) -> Self {
        Self {
            num_green_phases,
            bins: bins.max(1),
            tiered_tail: false,
        }
    }

    /// Treats the last feature as a tiered neighbor density.
    pub fn with_tiered_tail(mut self) -> Self {
        self.tiered_tail = true;
        self
    }

    pub fn bins(&self) -> u32 {
        self.bins
    }

    /// Encodes an observation laid out as one-hot green phase, min-green
    /// flag, then continuous features in `[0, 1]`.
    pub fn encode(&self, observation: &[f64]) -> StateKey {
        let p = self.num_green_phases.min(observation.len());
        let phase = observation[..p]
            .iter()
            .position(|v| *v >= 0.5)
            .unwrap_or(0) as u32;
        let mut key = Vec::with_capacity(observation.len().saturating_sub(p) + 1);
        key.push(phase);
        let mut rest = observation[p..].iter();
        if let Some(flag) = rest.next() {
            key.push(u32::from(*flag >= 0.5));
        }
        let mut features = rest.as_slice();
        let tier = match features.split_last() {
            Some((last, head)) if self.tiered_tail => {
                features = head;
                Some(tier_index(*last))
            }
            _ => None,
        };
        key.extend(features.iter().map(|f| self.bin(*f)));
        key.extend(tier);
        StateKey(key)
    }

    /// `min(floor(f * bins), bins - 1)`, negative values in bin 0.
    pub fn bin(&self, feature: f64) -> u32 {
        let scaled = (feature * self.bins as f64).floor();
        if scaled.is_nan() || scaled <= 0.0 {
            0
        } else {
            (scaled as u32).min(self.bins - 1)
        }
    }
}

/// Tier values `0.0`, `0.5`, `1.0` as `0`, `1`, `2`.
fn tier_index(value: f64) -> u32 {
    if value >= 0.75 {
        2
    } else if value >= 0.25 {
        1
    } else {
        0
    }
}
