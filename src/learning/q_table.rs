//! Tabular action values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::encoding::StateKey;

/// Action values per visited state.
///
/// Rows are zero-initialized on first visit and never evicted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QTable {
    num_actions: usize,
    rows: HashMap<StateKey, Vec<f64>>,
}

impl QTable {
    pub fn new(num_actions: usize) -> Self {
        Self {
            num_actions,
            rows: HashMap::new(),
        }
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Number of visited states.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, state: &StateKey) -> bool {
        self.rows.contains_key(state)
    }

    /// Row of `state`, if visited.
    pub fn get(&self, state: &StateKey) -> Option<&[f64]> {
        self.rows.get(state).map(Vec::as_slice)
    }

    /// Row of `state`, inserted as zeros on first visit.
    pub fn row_mut(&mut self, state: &StateKey) -> &mut Vec<f64> {
        let n = self.num_actions;
        self.rows
            .entry(state.clone())
            .or_insert_with(|| vec![0.0; n])
    }

    pub fn value(&self, state: &StateKey, action: usize) -> f64 {
        self.get(state)
            .and_then(|row| row.get(action).copied())
            .unwrap_or(0.0)
    }

    /// Largest action value of `state` (0 for an unvisited state).
    pub fn max_value(&self, state: &StateKey) -> f64 {
        match self.get(state) {
            Some(row) if !row.is_empty() => row.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            _ => 0.0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &Vec<f64>)> {
        self.rows.iter()
    }
}
