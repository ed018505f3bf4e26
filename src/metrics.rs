//! Waiting statistics and policy evaluation for the signal environment.
//!
//! [`WaitingStatistics`] produces one [`IntervalStats`] row per decision
//! interval; [`EvaluationMetrics`] aggregates full episodes under a policy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::environment::SignalEnv;
use crate::error::EnvError;
use crate::policy::Policy;
use crate::simulator::Simulator;

/// Snapshot written at the end of a decision interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalStats {
    /// Simulated time in seconds.
    pub time: f64,
    /// Stopped vehicle-ticks on controlled lanes since reset.
    pub cumulative_waiting: u64,
    /// Vehicles that reached their destination since reset.
    pub vehicle_count: u64,
    /// `cumulative_waiting / vehicle_count`, 0 before the first arrival.
    pub average_waiting: f64,
}

/// Running waiting counters for one episode.
#[derive(Debug, Clone, Default)]
pub struct WaitingStatistics {
    cumulative_waiting: u64,
    vehicle_count: u64,
    rows: Vec<IntervalStats>,
}

impl WaitingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Adds one simulator tick worth of halted and arrived vehicles.
    pub fn record_tick(&mut self, halted: u32, arrived: u32) {
        self.cumulative_waiting += u64::from(halted);
        self.vehicle_count += u64::from(arrived);
    }

    /// Closes the current interval at simulated time `time`.
    pub fn close_interval(&mut self, time: f64) -> IntervalStats {
        let row = IntervalStats {
            time,
            cumulative_waiting: self.cumulative_waiting,
            vehicle_count: self.vehicle_count,
            average_waiting: self.average_waiting(),
        };
        self.rows.push(row);
        row
    }

    pub fn average_waiting(&self) -> f64 {
        if self.vehicle_count == 0 {
            0.0
        } else {
            self.cumulative_waiting as f64 / self.vehicle_count as f64
        }
    }

    pub fn rows(&self) -> &[IntervalStats] {
        &self.rows
    }

    pub fn last(&self) -> Option<&IntervalStats> {
        self.rows.last()
    }
}

/// Aggregated evaluation metrics over multiple episodes.
#[derive(Debug, Clone)]
pub struct EvaluationMetrics {
    /// Mean over episodes of the summed reward of all agents.
    pub mean_total_reward: f64,
    /// Mean stopped vehicle-ticks per decision interval.
    pub mean_waiting_per_interval: f64,
    /// Mean of the average waiting reported at the end of each episode.
    pub mean_final_average_waiting: f64,
    /// Episodes that ended by truncation.
    pub episodes_truncated: usize,
    /// Number of episodes evaluated.
    pub n_episodes: usize,
}

#[derive(Debug, Default)]
struct EpisodeStats {
    total_reward: f64,
    waiting_per_interval: f64,
    final_average_waiting: f64,
    truncated: bool,
}

impl EvaluationMetrics {
    /// Evaluates a policy over multiple episodes and returns aggregated metrics.
    ///
    /// # Arguments
    ///
    /// * `env` - The signal environment to evaluate in
    /// * `policy` - The policy to evaluate
    /// * `n_episodes` - Number of episodes to run
    pub fn evaluate<S: Simulator>(
        env: &mut SignalEnv<S>,
        policy: &mut dyn Policy,
        n_episodes: usize,
    ) -> Result<Self, EnvError> {
        let mut all_stats = Vec::with_capacity(n_episodes);

        for _ in 0..n_episodes {
            env.reset()?;
            let mut stats = EpisodeStats::default();

            while let Some(agent) = env.agent_selection().map(str::to_owned) {
                let last = env.last(&agent)?;
                stats.total_reward += last.reward;
                if last.terminated || last.truncated {
                    stats.truncated |= last.truncated;
                    env.step(None)?;
                    continue;
                }
                let space = env.action_space(&agent)?;
                let action = policy.select_action(&agent, &last.observation, space);
                env.step(Some(action))?;
            }

            let rows = env.statistics().rows();
            if let Some(last) = rows.last() {
                stats.waiting_per_interval = last.cumulative_waiting as f64 / rows.len() as f64;
                stats.final_average_waiting = last.average_waiting;
            }
            all_stats.push(stats);
        }

        let n = all_stats.len().max(1) as f64;
        let mean = |f: fn(&EpisodeStats) -> f64| all_stats.iter().map(f).sum::<f64>() / n;

        Ok(Self {
            mean_total_reward: mean(|s| s.total_reward),
            mean_waiting_per_interval: mean(|s| s.waiting_per_interval),
            mean_final_average_waiting: mean(|s| s.final_average_waiting),
            episodes_truncated: all_stats.iter().filter(|s| s.truncated).count(),
            n_episodes,
        })
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Evaluation Metrics ({} episodes) ===",
            self.n_episodes
        )?;
        writeln!(f, "  Mean total reward:         {:.3}", self.mean_total_reward)?;
        writeln!(
            f,
            "  Mean waiting / interval:   {:.2}",
            self.mean_waiting_per_interval
        )?;
        writeln!(
            f,
            "  Mean final avg waiting:    {:.3}",
            self.mean_final_average_waiting
        )?;
        write!(f, "  Episodes truncated:        {}", self.episodes_truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvConfig, SignalSpec};
    use crate::policy::CyclePolicy;
    use crate::simulator::toy::{ToyLane, ToySimulator};
    use crate::units::secs;

    #[test]
    fn average_is_zero_before_first_arrival() {
        let mut st = WaitingStatistics::new();
        st.record_tick(4, 0);
        let row = st.close_interval(5.0);
        assert_eq!(row.cumulative_waiting, 4);
        assert_eq!(row.vehicle_count, 0);
        assert_eq!(row.average_waiting, 0.0);
    }

    #[test]
    fn rows_accumulate() {
        let mut st = WaitingStatistics::new();
        st.record_tick(3, 1);
        st.record_tick(3, 1);
        st.close_interval(5.0);
        st.record_tick(0, 2);
        let row = st.close_interval(10.0);
        assert_eq!(st.rows().len(), 2);
        assert_eq!(row.cumulative_waiting, 6);
        assert_eq!(row.vehicle_count, 4);
        assert!((row.average_waiting - 1.5).abs() < 1e-12);

        st.reset();
        assert!(st.rows().is_empty());
        assert_eq!(st.average_waiting(), 0.0);
    }

    #[test]
    fn rows_serialize_to_json() {
        let mut st = WaitingStatistics::new();
        st.record_tick(2, 1);
        let row = st.close_interval(1.0);
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"average_waiting\":2.0"));
    }

    #[test]
    fn display_lists_episode_count() {
        let m = EvaluationMetrics {
            mean_total_reward: -1.0,
            mean_waiting_per_interval: 2.0,
            mean_final_average_waiting: 0.5,
            episodes_truncated: 0,
            n_episodes: 3,
        };
        assert!(m.to_string().contains("(3 episodes)"));
    }

    #[test]
    fn evaluate_runs_full_episodes() {
        let spec = SignalSpec::new(
            "A",
            vec!["Gr".into(), "rG".into()],
            vec!["A_n".into(), "A_e".into()],
        );
        let cfg = EnvConfig {
            num_seconds: secs(60.0),
            ..EnvConfig::with_signals(vec![spec])
        };
        let sim = ToySimulator::new(vec![ToyLane::new("A_n", 0.3), ToyLane::new("A_e", 0.3)])
            .with_signal("A", vec!["A_n".into(), "A_e".into()]);
        let mut env = SignalEnv::new(cfg, sim).unwrap();
        let mut policy = CyclePolicy::new(2);

        let m = EvaluationMetrics::evaluate(&mut env, &mut policy, 2).unwrap();
        assert_eq!(m.n_episodes, 2);
        assert_eq!(m.episodes_truncated, 0);
        assert!(m.mean_total_reward <= 0.0);
        assert!(m.mean_waiting_per_interval > 0.0);
        assert!(env.is_done());
        assert_eq!(env.statistics().rows().len(), 12);
    }
}
