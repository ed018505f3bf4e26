//! Random policy for testing and baselines.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::trait_::Policy;
use crate::spaces::ActionSpace;

/// Uniformly random green phase on every turn.
///
/// Used for sanity checks and as a lower-bound baseline.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    /// Creates a random policy with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn select_action(
        &mut self,
        _agent: &str,
        _observation: &[f64],
        action_space: ActionSpace,
    ) -> usize {
        action_space.sample(&mut self.rng)
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_policy_actions_in_range() {
        let mut policy = RandomPolicy::new(9);
        let space = ActionSpace::new(3);
        for _ in 0..100 {
            assert!(space.contains(policy.select_action("J", &[0.0; 4], space)));
        }
    }

    #[test]
    fn same_seed_same_actions() {
        let space = ActionSpace::new(4);
        let mut a = RandomPolicy::new(1);
        let mut b = RandomPolicy::new(1);
        for _ in 0..20 {
            assert_eq!(
                a.select_action("J", &[], space),
                b.select_action("J", &[], space)
            );
        }
    }
}
