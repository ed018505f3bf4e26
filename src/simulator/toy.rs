//! Deterministic store-and-forward lanes for tests and demos.
//!
//! Each lane receives vehicles at a fixed rate (fractional arrivals are
//! carried over between ticks) and discharges at its saturation rate while
//! any of its signal links shows green. Vehicles that cannot leave during a
//! tick halt and accrue waiting time. Lanes not wired to a signal always
//! flow.

use std::collections::{HashMap, VecDeque};

use tracing::trace;

use super::{LaneOccupancy, Simulator};
use crate::error::SimulatorError;
use crate::units::{secs, Seconds};
use crate::Id;

/// Static description of one toy lane.
#[derive(Debug, Clone, PartialEq)]
pub struct ToyLane {
    pub id: Id,
    /// Lane length in meters.
    pub length: f64,
    /// Length of every vehicle on this lane, in meters.
    pub vehicle_length: f64,
    /// Arrivals per simulated second.
    pub arrival_rate: f64,
    /// Departures per simulated second while green.
    pub discharge_rate: f64,
}

impl ToyLane {
    /// A 100 m lane with 5 m vehicles and a 0.5 veh/s saturation flow.
    pub fn new(id: impl Into<Id>, arrival_rate: f64) -> Self {
        Self {
            id: id.into(),
            length: 100.0,
            vehicle_length: 5.0,
            arrival_rate,
            discharge_rate: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct LaneState {
    /// Waiting time of each vehicle on the lane, front first.
    vehicles: VecDeque<f64>,
    arrival_credit: f64,
    discharge_credit: f64,
    halting: u32,
}

/// Deterministic reference [`Simulator`].
#[derive(Debug, Clone)]
pub struct ToySimulator {
    lanes: Vec<ToyLane>,
    lane_index: HashMap<Id, usize>,
    state: Vec<LaneState>,
    /// Intersection id -> lane controlled by each link of the state string.
    links: HashMap<Id, Vec<Id>>,
    /// Intersection id -> last state string written.
    phases: HashMap<Id, String>,
    step: Seconds,
    time: Seconds,
    arrived_last_advance: u32,
    deadlock_limit: Option<usize>,
    phase_writes: usize,
}

impl ToySimulator {
    /// Creates a simulator with a one-second tick.
    pub fn new(lanes: Vec<ToyLane>) -> Self {
        let lane_index = lanes
            .iter()
            .enumerate()
            .map(|(i, l)| (l.id.clone(), i))
            .collect();
        let state = vec![LaneState::default(); lanes.len()];
        Self {
            lanes,
            lane_index,
            state,
            links: HashMap::new(),
            phases: HashMap::new(),
            step: secs(1.0),
            time: secs(0.0),
            arrived_last_advance: 0,
            deadlock_limit: None,
            phase_writes: 0,
        }
    }

    /// Wires an intersection: `links[k]` is the lane governed by character
    /// `k` of the state strings written for `intersection`.
    pub fn with_signal(mut self, intersection: impl Into<Id>, links: Vec<Id>) -> Self {
        self.links.insert(intersection.into(), links);
        self
    }

    /// Sets the tick length.
    pub fn with_step_length(mut self, step: Seconds) -> Self {
        self.step = step;
        self
    }

    /// Makes `advance` fail once any lane holds more than `limit` vehicles.
    pub fn with_deadlock_limit(mut self, limit: usize) -> Self {
        self.deadlock_limit = Some(limit);
        self
    }

    /// Last state string written for an intersection.
    pub fn phase_of(&self, intersection: &str) -> Option<&str> {
        self.phases.get(intersection).map(String::as_str)
    }

    /// Number of `set_signal_phase` calls since construction.
    pub fn phase_writes(&self) -> usize {
        self.phase_writes
    }

    /// Vehicles currently on a lane (0 for unknown lanes).
    pub fn queue_len(&self, lane: &str) -> usize {
        self.lane_index
            .get(lane)
            .map(|&i| self.state[i].vehicles.len())
            .unwrap_or(0)
    }

    fn green_lanes(&self) -> Vec<bool> {
        let mut green = vec![false; self.lanes.len()];
        let mut controlled = vec![false; self.lanes.len()];
        for (intersection, links) in &self.links {
            let phase = self.phases.get(intersection);
            for (k, lane) in links.iter().enumerate() {
                let Some(&i) = self.lane_index.get(lane) else {
                    continue;
                };
                controlled[i] = true;
                let lit = phase
                    .and_then(|p| p.chars().nth(k))
                    .is_some_and(|c| c == 'G' || c == 'g');
                green[i] |= lit;
            }
        }
        green
            .into_iter()
            .zip(controlled)
            .map(|(g, c)| g || !c)
            .collect()
    }

    fn tick(&mut self) -> u32 {
        let dt = self.step.value();
        let green = self.green_lanes();
        let mut arrived = 0;

        for (i, lane) in self.lanes.iter().enumerate() {
            let st = &mut self.state[i];

            st.arrival_credit += lane.arrival_rate * dt;
            while st.arrival_credit >= 1.0 {
                st.vehicles.push_back(0.0);
                st.arrival_credit -= 1.0;
            }

            if green[i] {
                st.discharge_credit += lane.discharge_rate * dt;
                while st.discharge_credit >= 1.0 && !st.vehicles.is_empty() {
                    st.vehicles.pop_front();
                    st.discharge_credit -= 1.0;
                    arrived += 1;
                }
                if st.vehicles.is_empty() {
                    st.discharge_credit = st.discharge_credit.min(1.0);
                }
                st.halting = 0;
            } else {
                st.discharge_credit = 0.0;
                for w in st.vehicles.iter_mut() {
                    *w += dt;
                }
                st.halting = st.vehicles.len() as u32;
            }
        }

        self.time = self.time + self.step;
        arrived
    }
}

impl Simulator for ToySimulator {
    fn advance(&mut self, ticks: u32) -> Result<(), SimulatorError> {
        self.arrived_last_advance = 0;
        for _ in 0..ticks {
            self.arrived_last_advance += self.tick();
            if let Some(limit) = self.deadlock_limit {
                if let Some((i, _)) = self
                    .state
                    .iter()
                    .enumerate()
                    .find(|(_, s)| s.vehicles.len() > limit)
                {
                    return Err(SimulatorError::Deadlock {
                        lane: self.lanes[i].id.clone(),
                    });
                }
            }
        }
        trace!(time = self.time.value(), "toy simulator advanced");
        Ok(())
    }

    fn time(&self) -> Seconds {
        self.time
    }

    fn step_length(&self) -> Seconds {
        self.step
    }

    fn has_lane(&self, lane: &str) -> bool {
        self.lane_index.contains_key(lane)
    }

    fn lane_occupancy(&self, lane: &str) -> LaneOccupancy {
        match self.lane_index.get(lane) {
            Some(&i) => {
                let count = self.state[i].vehicles.len() as u32;
                LaneOccupancy {
                    length: self.lanes[i].length,
                    vehicle_count: count,
                    mean_vehicle_length: if count > 0 {
                        self.lanes[i].vehicle_length
                    } else {
                        0.0
                    },
                }
            }
            None => LaneOccupancy {
                length: 0.0,
                vehicle_count: 0,
                mean_vehicle_length: 0.0,
            },
        }
    }

    fn lane_halting_count(&self, lane: &str) -> u32 {
        self.lane_index
            .get(lane)
            .map(|&i| self.state[i].halting)
            .unwrap_or(0)
    }

    fn lane_waiting_time(&self, lane: &str) -> f64 {
        self.lane_index
            .get(lane)
            .map(|&i| self.state[i].vehicles.iter().sum())
            .unwrap_or(0.0)
    }

    fn arrived_count(&self) -> u32 {
        self.arrived_last_advance
    }

    fn set_signal_phase(&mut self, intersection: &str, state: &str) {
        self.phase_writes += 1;
        self.phases.insert(intersection.to_string(), state.to_string());
    }

    fn reset(&mut self) -> Result<(), SimulatorError> {
        for st in &mut self.state {
            *st = LaneState::default();
        }
        self.phases.clear();
        self.time = secs(0.0);
        self.arrived_last_advance = 0;
        Ok(())
    }
}
