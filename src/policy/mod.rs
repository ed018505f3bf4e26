//! Baseline policies for the signal environment.

pub mod cycle;
pub mod random;
pub mod trait_;

pub use cycle::CyclePolicy;
pub use random::RandomPolicy;
pub use trait_::Policy;
