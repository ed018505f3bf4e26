//! Traffic-signal controllers.
//!
//! A [`TrafficSignal`] turns a discrete green-phase request into a legal
//! sequence of green and yellow phases and exposes lane features read from
//! the simulator.

pub mod phase;
pub mod traffic_signal;

pub use phase::{Phase, PhasePlan};
pub use traffic_signal::{PhaseRequest, SignalState, TrafficSignal, MIN_GAP};
