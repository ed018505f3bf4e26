//! Boundary to the running road-network simulation.
//!
//! The environment never talks to a simulator process directly; it only
//! calls the [`Simulator`] trait. A process-backed adapter (e.g. over a
//! TraCI connection) lives outside this crate. [`toy::ToySimulator`] is a
//! small deterministic implementation used by tests and demos.

pub mod toy;

pub use toy::ToySimulator;

use crate::error::SimulatorError;
use crate::units::Seconds;

/// Instantaneous occupancy of one lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneOccupancy {
    /// Lane length in meters.
    pub length: f64,
    /// Vehicles currently on the lane.
    pub vehicle_count: u32,
    /// Mean length of the vehicles on the lane, in meters (0 when empty).
    pub mean_vehicle_length: f64,
}

/// Synchronous point queries and controls on an already-running simulation.
///
/// Lane and intersection ids are the simulator's own ids. All calls block
/// until the simulator answers.
pub trait Simulator {
    /// Advances simulated time by `ticks` steps of [`Simulator::step_length`].
    ///
    /// An error means the simulation can no longer make progress (deadlock,
    /// teleport threshold, lost connection).
    fn advance(&mut self, ticks: u32) -> Result<(), SimulatorError>;

    /// Current simulated time.
    fn time(&self) -> Seconds;

    /// Length of one simulator tick.
    fn step_length(&self) -> Seconds;

    /// Returns true if the lane exists in the loaded network.
    fn has_lane(&self, lane: &str) -> bool;

    /// Occupancy snapshot of a lane.
    fn lane_occupancy(&self, lane: &str) -> LaneOccupancy;

    /// Vehicles on the lane below the halting speed threshold.
    fn lane_halting_count(&self, lane: &str) -> u32;

    /// Accumulated waiting time (seconds) of the vehicles currently on the lane.
    fn lane_waiting_time(&self, lane: &str) -> f64;

    /// Vehicles that reached their destination during the last `advance` call.
    fn arrived_count(&self) -> u32;

    /// Writes a signal-state string (one character per controlled link).
    fn set_signal_phase(&mut self, intersection: &str, state: &str);

    /// Restarts the simulation from its initial state.
    fn reset(&mut self) -> Result<(), SimulatorError>;

    /// Releases the simulation. Default is a no-op.
    fn close(&mut self) {}
}
