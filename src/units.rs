//! Simulated-time helpers.
//!
//! Every duration in the crate (tick size, minimum green, yellow time,
//! decision interval, horizon) is a [`qtty`] quantity in seconds so the
//! timing arithmetic of the signal state machine cannot mix units.

use qtty::{Quantity, Second};

/// A duration or instant of simulated time, in seconds.
pub type Seconds = Quantity<Second>;

/// Tolerance used when comparing accumulated simulated time.
const TIME_EPS: f64 = 1e-9;

/// Builds a [`Seconds`] value.
#[inline]
pub fn secs(value: f64) -> Seconds {
    Quantity::<Second>::new(value)
}

/// Returns true once `elapsed` has reached `target`.
///
/// Accumulated sub-second steps drift, so the comparison allows a small
/// tolerance below `target`.
#[inline]
pub fn reached(elapsed: Seconds, target: Seconds) -> bool {
    elapsed.value() + TIME_EPS >= target.value()
}

/// Number of whole simulator ticks of length `step` in `span`.
///
/// Rounds to the nearest tick; returns 0 for a non-positive step.
pub fn ticks_in(span: Seconds, step: Seconds) -> u32 {
    if step.value() <= 0.0 {
        return 0;
    }
    (span.value() / step.value()).round().max(0.0) as u32
}

/// True if `span` is a positive whole number of ticks of length `step`.
pub fn is_whole_ticks(span: Seconds, step: Seconds) -> bool {
    let n = ticks_in(span, step);
    n > 0 && (f64::from(n) * step.value() - span.value()).abs() <= 1e-6
}
