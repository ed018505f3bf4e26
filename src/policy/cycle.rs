//! Fixed-time cycle policy (the no-learning baseline).
//!
//! Every agent holds its current green for a fixed number of decisions,
//! then requests the next green phase in index order.

use std::collections::HashMap;

use super::trait_::Policy;
use crate::spaces::ActionSpace;
use crate::Id;

#[derive(Debug, Clone, Copy)]
struct CycleState {
    green: usize,
    decisions: u32,
}

/// Rotates through the green phases of each agent.
///
/// The current green is read from the one-hot prefix of the observation,
/// so a request held back by the minimum green time is repeated until the
/// signal actually switches.
#[derive(Debug, Clone)]
pub struct CyclePolicy {
    hold: u32,
    states: HashMap<Id, CycleState>,
}

impl CyclePolicy {
    /// Creates a policy that keeps each green for `hold` decisions.
    pub fn new(hold: u32) -> Self {
        Self {
            hold: hold.max(1),
            states: HashMap::new(),
        }
    }

    pub fn hold(&self) -> u32 {
        self.hold
    }
}

/// Index of the active green in the one-hot prefix.
fn current_green(observation: &[f64], n: usize) -> usize {
    observation
        .iter()
        .take(n)
        .position(|v| *v >= 0.5)
        .unwrap_or(0)
}

impl Policy for CyclePolicy {
    fn select_action(
        &mut self,
        agent: &str,
        observation: &[f64],
        action_space: ActionSpace,
    ) -> usize {
        let n = action_space.n.max(1);
        let green = current_green(observation, n);
        let state = self
            .states
            .entry(agent.to_string())
            .or_insert(CycleState {
                green,
                decisions: 0,
            });
        if state.green != green {
            *state = CycleState {
                green,
                decisions: 0,
            };
        }
        state.decisions += 1;
        if state.decisions > self.hold {
            (green + 1) % n
        } else {
            green
        }
    }

    fn name(&self) -> &str {
        "cycle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(green: usize) -> Vec<f64> {
        let mut o = vec![0.0; 3 + 1 + 2];
        o[green] = 1.0;
        o
    }

    #[test]
    fn holds_then_requests_next_phase() {
        let mut p = CyclePolicy::new(2);
        let space = ActionSpace::new(3);
        assert_eq!(p.select_action("J", &obs(0), space), 0);
        assert_eq!(p.select_action("J", &obs(0), space), 0);
        assert_eq!(p.select_action("J", &obs(0), space), 1);
        // Still green 0: the request is repeated.
        assert_eq!(p.select_action("J", &obs(0), space), 1);
        // The signal switched; the hold starts over.
        assert_eq!(p.select_action("J", &obs(1), space), 1);
        assert_eq!(p.select_action("J", &obs(1), space), 1);
        assert_eq!(p.select_action("J", &obs(1), space), 2);
    }

    #[test]
    fn wraps_around_and_tracks_agents_separately() {
        let mut p = CyclePolicy::new(1);
        let space = ActionSpace::new(3);
        assert_eq!(p.select_action("A", &obs(2), space), 2);
        assert_eq!(p.select_action("A", &obs(2), space), 0);
        assert_eq!(p.select_action("B", &obs(1), space), 1);
    }
}
