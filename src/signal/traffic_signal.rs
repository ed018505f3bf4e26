//! Per-intersection phase state machine and lane features.

use std::fmt;

use tracing::debug;

use super::phase::{Phase, PhasePlan};
use crate::config::{EnvConfig, SignalSpec};
use crate::error::ConfigError;
use crate::simulator::Simulator;
use crate::units::{reached, secs, Seconds};
use crate::Id;

/// Minimum gap between standing vehicles, in meters.
pub const MIN_GAP: f64 = 2.5;

/// What the signal is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    /// Green phase `i` is active.
    Green(usize),
    /// Mandatory transition from green `from` to green `to`.
    Yellow { from: usize, to: usize },
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalState::Green(i) => write!(f, "GREEN({})", i),
            SignalState::Yellow { from, to } => write!(f, "YELLOW({}->{})", from, to),
        }
    }
}

/// Outcome of a phase request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseRequest {
    /// The current green keeps running.
    Held,
    /// A yellow transition toward the requested green has started.
    Committed,
}

/// One controlled intersection.
///
/// Every green index is always a legal action: a request that would cut
/// the current green short (or arrives during yellow) is held, never
/// rejected.
#[derive(Debug, Clone)]
pub struct TrafficSignal {
    id: Id,
    plan: PhasePlan,
    lanes: Vec<Id>,
    neighbors: Vec<Id>,
    min_green: Seconds,
    yellow_time: Seconds,
    green_phase: usize,
    state: SignalState,
    time_since_last_phase_change: Seconds,
    yellow_elapsed: Seconds,
}

impl TrafficSignal {
    /// Builds a signal from its declaration and the shared timing.
    ///
    /// Lane existence is checked by the environment, which owns the
    /// simulator.
    pub fn new(spec: &SignalSpec, config: &EnvConfig) -> Result<Self, ConfigError> {
        if spec.lanes.is_empty() {
            return Err(ConfigError::NoLanes {
                signal: spec.id.clone(),
            });
        }
        let plan = PhasePlan::build(
            &spec.id,
            &spec.green_phases,
            config.min_green,
            config.yellow_time,
        )?;
        Ok(Self {
            id: spec.id.clone(),
            plan,
            lanes: spec.lanes.clone(),
            neighbors: spec.neighbors.clone(),
            min_green: config.min_green,
            yellow_time: config.yellow_time,
            green_phase: 0,
            state: SignalState::Green(0),
            time_since_last_phase_change: secs(0.0),
            yellow_elapsed: secs(0.0),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn lanes(&self) -> &[Id] {
        &self.lanes
    }

    pub fn neighbors(&self) -> &[Id] {
        &self.neighbors
    }

    pub fn num_green_phases(&self) -> usize {
        self.plan.num_greens()
    }

    pub fn plan(&self) -> &PhasePlan {
        &self.plan
    }

    /// Index of the current (or, during yellow, the outgoing) green phase.
    pub fn green_phase(&self) -> usize {
        self.green_phase
    }

    pub fn state(&self) -> SignalState {
        self.state
    }

    pub fn is_yellow(&self) -> bool {
        matches!(self.state, SignalState::Yellow { .. })
    }

    pub fn time_since_last_phase_change(&self) -> Seconds {
        self.time_since_last_phase_change
    }

    pub fn min_green(&self) -> Seconds {
        self.min_green
    }

    pub fn yellow_time(&self) -> Seconds {
        self.yellow_time
    }

    /// True once the current green has run for `min_green + yellow_time`.
    pub fn min_green_elapsed(&self) -> bool {
        reached(
            self.time_since_last_phase_change,
            self.min_green + self.yellow_time,
        )
    }

    /// Returns the signal to its first green phase with cleared counters
    /// and writes that green to the simulator.
    pub fn reset<S: Simulator>(&mut self, sim: &mut S) {
        self.green_phase = 0;
        self.state = SignalState::Green(0);
        self.time_since_last_phase_change = secs(0.0);
        self.yellow_elapsed = secs(0.0);
        self.write_green(sim);
    }

    /// Requests green phase `phase`.
    ///
    /// Out-of-range indices are the caller's responsibility; the
    /// environment validates actions before they reach the signal.
    pub fn set_next_phase<S: Simulator>(&mut self, phase: usize, sim: &mut S) -> PhaseRequest {
        if phase == self.green_phase || self.is_yellow() || !self.min_green_elapsed() {
            return PhaseRequest::Held;
        }
        let Some(yellow) = self.plan.yellow(self.green_phase, phase) else {
            return PhaseRequest::Held;
        };
        sim.set_signal_phase(&self.id, &yellow.state);
        debug!(
            signal = %self.id,
            from = self.green_phase,
            to = phase,
            "phase change committed"
        );
        self.state = SignalState::Yellow {
            from: self.green_phase,
            to: phase,
        };
        self.yellow_elapsed = secs(0.0);
        PhaseRequest::Committed
    }

    /// Accounts for one simulator tick of length `step`.
    pub fn tick<S: Simulator>(&mut self, step: Seconds, sim: &mut S) {
        self.time_since_last_phase_change = self.time_since_last_phase_change + step;
        if let SignalState::Yellow { to, .. } = self.state {
            self.yellow_elapsed = self.yellow_elapsed + step;
            if reached(self.yellow_elapsed, self.yellow_time) {
                self.green_phase = to;
                self.state = SignalState::Green(to);
                self.time_since_last_phase_change = secs(0.0);
                self.yellow_elapsed = secs(0.0);
                self.write_green(sim);
            }
        }
    }

    fn write_green<S: Simulator>(&self, sim: &mut S) {
        if let Some(Phase { state, .. }) = self.plan.green(self.green_phase) {
            sim.set_signal_phase(&self.id, state);
        }
    }

    /// Per-lane occupied fraction, in lane order, each in `[0, 1]`.
    pub fn lanes_density<S: Simulator>(&self, sim: &S) -> Vec<f64> {
        self.lanes
            .iter()
            .map(|lane| {
                let occ = sim.lane_occupancy(lane);
                fraction(occ.vehicle_count, occ.length, occ.mean_vehicle_length)
            })
            .collect()
    }

    /// Per-lane halted fraction of the lane's queue capacity, each in `[0, 1]`.
    pub fn lanes_queue<S: Simulator>(&self, sim: &S) -> Vec<f64> {
        self.lanes
            .iter()
            .map(|lane| {
                let occ = sim.lane_occupancy(lane);
                fraction(
                    sim.lane_halting_count(lane),
                    occ.length,
                    occ.mean_vehicle_length,
                )
            })
            .collect()
    }

    /// Summed accumulated waiting time over the controlled lanes.
    pub fn accumulated_waiting_time<S: Simulator>(&self, sim: &S) -> f64 {
        self.lanes.iter().map(|l| sim.lane_waiting_time(l)).sum()
    }

    /// Halted vehicles over the controlled lanes.
    pub fn total_queued<S: Simulator>(&self, sim: &S) -> u32 {
        self.lanes.iter().map(|l| sim.lane_halting_count(l)).sum()
    }
}

/// `count` vehicles over the number of vehicles the lane can hold.
fn fraction(count: u32, lane_length: f64, vehicle_length: f64) -> f64 {
    if count == 0 || lane_length <= 0.0 {
        return 0.0;
    }
    let capacity = lane_length / (MIN_GAP + vehicle_length);
    (count as f64 / capacity).clamp(0.0, 1.0)
}
