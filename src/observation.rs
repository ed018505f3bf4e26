//! Observation encoding for the signal environment.
//!
//! Builds per-signal observation vectors from the signal's phase state and
//! its lane features, optionally followed by one scalar summarizing the
//! lane density around declared neighbors.

use serde::{Deserialize, Serialize};

use crate::signal::TrafficSignal;
use crate::simulator::Simulator;
use crate::spaces::ObservationSpace;
use crate::topology::Topology;

/// Lower breakpoint of the tiered neighbor density.
pub const LOW_DENSITY: f64 = 0.33;
/// Upper breakpoint of the tiered neighbor density.
pub const HIGH_DENSITY: f64 = 0.66;

/// How neighbor lane densities collapse into one scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NeighborAggregation {
    /// Mean density mapped to `0.0` (≤ 0.33), `0.5` (≤ 0.66) or `1.0`.
    #[default]
    Tiered,
    /// Raw mean density in `[0, 1]`.
    Mean,
}

impl NeighborAggregation {
    fn apply(self, mean: f64) -> f64 {
        match self {
            NeighborAggregation::Mean => mean.clamp(0.0, 1.0),
            NeighborAggregation::Tiered => {
                if mean <= LOW_DENSITY {
                    0.0
                } else if mean <= HIGH_DENSITY {
                    0.5
                } else {
                    1.0
                }
            }
        }
    }
}

/// Turns a signal's state into a bounded feature vector.
///
/// Layout:
/// ```text
/// [one_hot(green)(P)] ++ [min_green(1)] ++ [density(L)] ++ [queue(L)] (++ [neighbor(1)])
/// ```
/// where `P` is the number of green phases and `L` the number of lanes.
/// Every element lies in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObservationFunction {
    #[default]
    Default,
    /// Default layout plus the aggregated density of neighbor lanes.
    NeighborDensity(NeighborAggregation),
}

impl ObservationFunction {
    /// Dimension of the observation for a signal.
    pub fn dim(&self, signal: &TrafficSignal) -> usize {
        let base = signal.num_green_phases() + 1 + 2 * signal.lanes().len();
        match self {
            ObservationFunction::Default => base,
            ObservationFunction::NeighborDensity(_) => base + 1,
        }
    }

    /// Declared bounds for a signal's observation.
    pub fn space(&self, signal: &TrafficSignal) -> ObservationSpace {
        ObservationSpace::unit(self.dim(signal))
    }

    /// Builds the observation of signal `index`.
    ///
    /// # Arguments
    ///
    /// * `index` - Index of the observed signal in `signals`
    /// * `signals` - All signals of the network (neighbors are read from here)
    /// * `topology` - Neighbor graph matching `signals`
    /// * `sim` - Simulator to read lane state from
    pub fn observe<S: Simulator>(
        &self,
        index: usize,
        signals: &[TrafficSignal],
        topology: &Topology,
        sim: &S,
    ) -> Vec<f64> {
        let signal = &signals[index];
        let mut obs = Vec::with_capacity(self.dim(signal));

        obs.extend((0..signal.num_green_phases()).map(|i| {
            if i == signal.green_phase() {
                1.0
            } else {
                0.0
            }
        }));
        obs.push(if signal.min_green_elapsed() { 1.0 } else { 0.0 });
        obs.extend(signal.lanes_density(sim));
        obs.extend(signal.lanes_queue(sim));

        if let ObservationFunction::NeighborDensity(aggregation) = self {
            let densities: Vec<f64> = topology
                .neighbors(index)
                .into_iter()
                .flat_map(|n| signals[n].lanes_density(sim))
                .collect();
            let mean = if densities.is_empty() {
                0.0
            } else {
                densities.iter().sum::<f64>() / densities.len() as f64
            };
            obs.push(aggregation.apply(mean));
        }

        obs
    }

    /// Observations for every signal, all read from the same simulator state.
    pub fn observe_all<S: Simulator>(
        &self,
        signals: &[TrafficSignal],
        topology: &Topology,
        sim: &S,
    ) -> Vec<Vec<f64>> {
        (0..signals.len())
            .map(|i| self.observe(i, signals, topology, sim))
            .collect()
    }
}
