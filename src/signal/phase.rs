//! Signal phases and the automatic yellow transitions between them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::units::Seconds;

/// An immutable signal-state string with its fixed duration: the minimum
/// green for greens, the yellow time for yellows.
///
/// Each character drives one controlled link: `G`/`g` green, `y` yellow,
/// `r` red, `s` stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub state: String,
    pub duration: Seconds,
}

impl Phase {
    pub fn new(state: impl Into<String>, duration: Seconds) -> Self {
        Self {
            state: state.into(),
            duration,
        }
    }

    /// True if at least one link is green and none is yellow.
    pub fn is_green(&self) -> bool {
        !self.state.chars().any(|c| matches!(c, 'y' | 'Y'))
            && self.state.chars().any(|c| matches!(c, 'G' | 'g'))
    }
}

/// The green phases of one intersection and the yellow phase inserted
/// between every ordered pair of distinct greens.
#[derive(Debug, Clone, PartialEq)]
pub struct PhasePlan {
    greens: Vec<Phase>,
    yellows: HashMap<(usize, usize), Phase>,
}

impl PhasePlan {
    /// Validates the green states and derives the yellow transitions.
    ///
    /// All green states must share the same number of links. The yellow
    /// state from `i` to `j` shows `y` on every link that is green in `i`
    /// and red/stop in `j`, and keeps `i`'s character elsewhere.
    pub fn build(
        signal: &str,
        green_states: &[String],
        min_green: Seconds,
        yellow_time: Seconds,
    ) -> Result<Self, ConfigError> {
        if green_states.is_empty() {
            return Err(ConfigError::NoGreenPhases {
                signal: signal.to_string(),
            });
        }

        let expected = green_states[0].chars().count();
        let mut greens = Vec::with_capacity(green_states.len());
        for (index, state) in green_states.iter().enumerate() {
            let found = state.chars().count();
            if found != expected {
                return Err(ConfigError::PhaseLengthMismatch {
                    signal: signal.to_string(),
                    index,
                    expected,
                    found,
                });
            }
            let phase = Phase::new(state.clone(), min_green);
            if !phase.is_green() {
                return Err(ConfigError::InvalidGreenPhase {
                    signal: signal.to_string(),
                    index,
                    state: state.clone(),
                });
            }
            greens.push(phase);
        }

        let mut yellows = HashMap::new();
        for (i, from) in greens.iter().enumerate() {
            for (j, to) in greens.iter().enumerate() {
                if i == j {
                    continue;
                }
                let state = yellow_state(&from.state, &to.state);
                yellows.insert((i, j), Phase::new(state, yellow_time));
            }
        }

        Ok(Self { greens, yellows })
    }

    /// Number of agent-selectable green phases.
    pub fn num_greens(&self) -> usize {
        self.greens.len()
    }

    pub fn green(&self, index: usize) -> Option<&Phase> {
        self.greens.get(index)
    }

    /// Yellow transition from green `from` to green `to`.
    pub fn yellow(&self, from: usize, to: usize) -> Option<&Phase> {
        self.yellows.get(&(from, to))
    }

    pub fn greens(&self) -> &[Phase] {
        &self.greens
    }
}

fn yellow_state(from: &str, to: &str) -> String {
    from.chars()
        .zip(to.chars())
        .map(|(a, b)| {
            if matches!(a, 'G' | 'g') && matches!(b, 'r' | 's') {
                'y'
            } else {
                a
            }
        })
        .collect()
}
