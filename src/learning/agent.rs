//! Tabular Q-learning agent for one traffic signal.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::encoding::StateKey;
use super::exploration::EpsilonGreedy;
use super::q_table::QTable;
use super::store::QTableStore;
use crate::error::StoreError;
use crate::spaces::ActionSpace;
use crate::Id;

/// Learning-rate and discount settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QLConfig {
    /// Learning rate in `[0, 1]`.
    pub alpha: f64,
    /// Discount factor in `[0, 1]`.
    pub gamma: f64,
}

impl Default for QLConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.99,
        }
    }
}

/// One-step Q-learning over encoded states.
///
/// The agent owns its table. Usage per decision: [`act`](Self::act), let
/// the environment run the interval, then [`learn`](Self::learn) with the
/// resulting state and reward.
#[derive(Debug, Clone)]
pub struct QLAgent {
    id: Id,
    state: StateKey,
    action_space: ActionSpace,
    action: Option<usize>,
    q_table: QTable,
    exploration: EpsilonGreedy,
    config: QLConfig,
    acc_reward: f64,
}

impl QLAgent {
    pub fn new(
        id: impl Into<Id>,
        starting_state: StateKey,
        action_space: ActionSpace,
        config: QLConfig,
        exploration: EpsilonGreedy,
    ) -> Self {
        let mut q_table = QTable::new(action_space.n);
        q_table.row_mut(&starting_state);
        Self {
            id: id.into(),
            state: starting_state,
            action_space,
            action: None,
            q_table,
            exploration,
            config,
            acc_reward: 0.0,
        }
    }

    /// Starts from a previously learned table.
    ///
    /// A table whose action count differs from the action space is
    /// ignored.
    pub fn with_q_table(mut self, table: QTable) -> Self {
        if table.num_actions() != self.action_space.n {
            warn!(
                agent = %self.id,
                expected = self.action_space.n,
                found = table.num_actions(),
                "ignoring Q-table with mismatched action count"
            );
            return self;
        }
        self.q_table = table;
        self.q_table.row_mut(&self.state);
        self
    }

    /// Loads the table saved for this agent in `run`, if any.
    ///
    /// Returns true if a table was restored.
    pub fn restore<T: QTableStore + ?Sized>(
        &mut self,
        store: &T,
        run: u32,
    ) -> Result<bool, StoreError> {
        match store.load(run, &self.id)? {
            Some(table) if table.num_actions() == self.action_space.n => {
                self.q_table = table;
                self.q_table.row_mut(&self.state);
                Ok(true)
            }
            Some(_) => {
                warn!(agent = %self.id, run, "stored Q-table has a different action count");
                Ok(false)
            }
            None => {
                info!(agent = %self.id, run, "no stored Q-table, starting empty");
                Ok(false)
            }
        }
    }

    /// Saves the table under `run`.
    pub fn persist<T: QTableStore + ?Sized>(
        &self,
        store: &mut T,
        run: u32,
    ) -> Result<(), StoreError> {
        store.save(run, &self.id, &self.q_table)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &StateKey {
        &self.state
    }

    /// Action chosen by the last [`act`](Self::act) and not yet learned from.
    pub fn pending_action(&self) -> Option<usize> {
        self.action
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn exploration(&self) -> &EpsilonGreedy {
        &self.exploration
    }

    /// Sum of rewards passed to [`learn`](Self::learn).
    pub fn accumulated_reward(&self) -> f64 {
        self.acc_reward
    }

    /// Selects an action for the current state and records it as pending.
    pub fn act(&mut self) -> usize {
        let row = self.q_table.row_mut(&self.state).clone();
        let action = self.exploration.choose(&row, self.action_space);
        self.action = Some(action);
        action
    }

    /// Applies the update `Q[s][a] += alpha * (r + gamma * max Q[s'] - Q[s][a])`
    /// for the pending action and moves to `next_state`.
    ///
    /// Does nothing when no action is pending.
    pub fn learn(&mut self, next_state: StateKey, reward: f64) {
        let Some(a) = self.action.take() else {
            return;
        };
        self.q_table.row_mut(&next_state);
        let target = reward + self.config.gamma * self.q_table.max_value(&next_state);
        let QLConfig { alpha, .. } = self.config;
        let row = self.q_table.row_mut(&self.state);
        let current = row[a];
        row[a] = current + alpha * (target - current);
        self.state = next_state;
        self.acc_reward += reward;
    }

    /// Clears the pending action and moves to `state`, keeping the table.
    ///
    /// Used between episodes.
    pub fn reset_state(&mut self, state: StateKey) {
        self.q_table.row_mut(&state);
        self.state = state;
        self.action = None;
        self.acc_reward = 0.0;
    }
}
