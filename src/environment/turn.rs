//! Round-robin turn order over agents.

/// Explicit turn pointer over `n` agents.
///
/// Agents act in index order. An agent that has been retired is skipped;
/// once every agent is retired there is no selection.
#[derive(Debug, Clone)]
pub struct AgentSelector {
    current: usize,
    live: Vec<bool>,
}

impl AgentSelector {
    pub fn new(n: usize) -> Self {
        Self {
            current: 0,
            live: vec![true; n],
        }
    }

    /// Every agent live again, first agent selected.
    pub fn reset(&mut self) {
        self.current = 0;
        self.live.iter_mut().for_each(|l| *l = true);
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Index of the agent whose turn it is.
    pub fn selected(&self) -> Option<usize> {
        self.live
            .get(self.current)
            .copied()
            .unwrap_or(false)
            .then_some(self.current)
    }

    /// True if the selected agent closes the round.
    pub fn is_last(&self) -> bool {
        !self.live.is_empty() && self.current == self.live.len() - 1
    }

    /// Moves to the next live agent, wrapping around.
    pub fn advance(&mut self) -> Option<usize> {
        let n = self.live.len();
        for offset in 1..=n {
            let i = (self.current + offset) % n;
            if self.live[i] {
                self.current = i;
                return Some(i);
            }
        }
        None
    }

    pub fn retire(&mut self, index: usize) {
        if let Some(l) = self.live.get_mut(index) {
            *l = false;
        }
    }

    pub fn is_live(&self, index: usize) -> bool {
        self.live.get(index).copied().unwrap_or(false)
    }

    pub fn all_retired(&self) -> bool {
        self.live.iter().all(|l| !l)
    }
}
