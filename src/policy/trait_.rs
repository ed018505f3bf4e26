//! Policy trait for the signal environment.

use crate::spaces::ActionSpace;

/// Chooses a green phase for the agent whose turn it is.
///
/// Actions are green-phase indices in `0..action_space.n`.
pub trait Policy: Send + Sync {
    /// Selects an action for one agent.
    ///
    /// # Arguments
    ///
    /// * `agent` - Id of the acting agent
    /// * `observation` - The agent's latest observation
    /// * `action_space` - The agent's green phases
    fn select_action(
        &mut self,
        agent: &str,
        observation: &[f64],
        action_space: ActionSpace,
    ) -> usize;

    /// Returns a human-readable name for this policy.
    fn name(&self) -> &str;
}
