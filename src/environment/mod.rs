//! Turn-based multi-agent signal environment.
//!
//! One agent per controlled intersection. Agents act in a fixed
//! round-robin order; when the last agent of a round has acted, simulated
//! time advances by one decision interval and every observation and reward
//! is recomputed from the same post-interval state.
//!
//! # Lifecycle
//!
//! 1. Call [`SignalEnv::new`] with a configuration and a simulator.
//! 2. Call [`SignalEnv::reset`] to start an episode.
//! 3. While [`SignalEnv::agent_selection`] returns an agent, read
//!    [`SignalEnv::last`] and call [`SignalEnv::step`] with its action,
//!    or with `None` once the transition reports terminated or truncated.
//! 4. [`SignalEnv::is_done`] becomes true once every agent has been
//!    retired.

pub mod turn;

#[cfg(test)]
mod tests;

pub use turn::AgentSelector;

use tracing::{debug, info, warn};

use crate::config::EnvConfig;
use crate::error::{ConfigError, EnvError};
use crate::learning::encoding::{StateEncoder, StateKey};
use crate::metrics::WaitingStatistics;
use crate::observation::{NeighborAggregation, ObservationFunction};
use crate::reward::RewardComputer;
use crate::signal::TrafficSignal;
use crate::simulator::Simulator;
use crate::spaces::{ActionSpace, ObservationSpace};
use crate::topology::Topology;
use crate::units::{is_whole_ticks, reached, ticks_in, Seconds};
use crate::Id;

/// Per-agent diagnostics captured with every transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInfo {
    /// Simulated time when the transition was computed.
    pub time: Seconds,
    /// Current (or outgoing, during yellow) green phase.
    pub green_phase: usize,
    /// Halted vehicles on the agent's lanes.
    pub queued: u32,
    /// Accumulated waiting time on the agent's lanes, in seconds.
    pub waiting_time: f64,
}

/// What an agent sees when its turn comes.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub observation: Vec<f64>,
    /// Reward of the last completed interval, not yet consumed by an action.
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

/// The multi-agent traffic-signal environment.
///
/// Exclusively owns the simulator, the signals and the clock.
#[derive(Debug)]
pub struct SignalEnv<S: Simulator> {
    config: EnvConfig,
    sim: S,
    signals: Vec<TrafficSignal>,
    topology: Topology,
    agents: Vec<Id>,
    observation_fn: ObservationFunction,
    observation_spaces: Vec<ObservationSpace>,
    encoders: Vec<StateEncoder>,
    rewards: RewardComputer,
    selector: AgentSelector,
    ticks_per_decision: u32,
    observations: Vec<Vec<f64>>,
    pending_rewards: Vec<f64>,
    infos: Vec<StepInfo>,
    stats: WaitingStatistics,
    terminated: bool,
    truncated: bool,
    is_reset: bool,
}

impl<S: Simulator> SignalEnv<S> {
    /// Builds the environment and checks the configuration against the
    /// simulator.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]: empty network, duplicate ids, unknown or
    /// self neighbors, unknown lanes, invalid phase plans, timing that
    /// does not leave at least one simulator tick per decision, or a
    /// yellow time that is not a whole number of ticks.
    pub fn new(config: EnvConfig, sim: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let topology = Topology::build(&config.signals)?;

        for spec in &config.signals {
            if let Some(lane) = spec.lanes.iter().find(|l| !sim.has_lane(l)) {
                return Err(ConfigError::UnknownLane {
                    signal: spec.id.clone(),
                    lane: lane.clone(),
                });
            }
        }

        let signals = config
            .signals
            .iter()
            .map(|spec| TrafficSignal::new(spec, &config))
            .collect::<Result<Vec<_>, _>>()?;

        let ticks_per_decision = ticks_in(config.delta_time, sim.step_length());
        if ticks_per_decision == 0 {
            return Err(ConfigError::InvalidTiming(format!(
                "delta_time ({}s) is shorter than one simulator step ({}s)",
                config.delta_time.value(),
                sim.step_length().value()
            )));
        }
        if !is_whole_ticks(config.yellow_time, sim.step_length()) {
            return Err(ConfigError::InvalidTiming(format!(
                "yellow_time ({}s) is not a whole number of simulator steps ({}s)",
                config.yellow_time.value(),
                sim.step_length().value()
            )));
        }

        let observation_fn = config.observation;
        let observation_spaces = signals.iter().map(|s| observation_fn.space(s)).collect();
        let tiered =
            observation_fn == ObservationFunction::NeighborDensity(NeighborAggregation::Tiered);
        let encoders = signals
            .iter()
            .map(|s| {
                let encoder = StateEncoder::new(s.num_green_phases(), config.encoding_bins);
                if tiered {
                    encoder.with_tiered_tail()
                } else {
                    encoder
                }
            })
            .collect();
        let agents: Vec<Id> = signals.iter().map(|s| s.id().to_string()).collect();
        let n = agents.len();

        info!(
            agents = n,
            ticks_per_decision,
            observation = ?observation_fn,
            "signal environment created"
        );

        Ok(Self {
            rewards: RewardComputer::new(config.reward.clone(), n),
            config,
            sim,
            signals,
            topology,
            agents,
            observation_fn,
            observation_spaces,
            encoders,
            selector: AgentSelector::new(n),
            ticks_per_decision,
            observations: vec![Vec::new(); n],
            pending_rewards: vec![0.0; n],
            infos: Vec::new(),
            stats: WaitingStatistics::new(),
            terminated: false,
            truncated: false,
            is_reset: false,
        })
    }

    /// Starts a new episode and returns every agent's first observation.
    ///
    /// # Errors
    ///
    /// [`EnvError::SimulatorReset`] if the simulator cannot restart, or a
    /// [`ConfigError`] if an observation does not match its declared space.
    pub fn reset(&mut self) -> Result<Vec<Vec<f64>>, EnvError> {
        self.sim.reset()?;
        for signal in &mut self.signals {
            signal.reset(&mut self.sim);
        }
        self.rewards.reset(&self.signals, &self.sim);
        self.stats.reset();
        self.selector.reset();
        self.pending_rewards.iter_mut().for_each(|r| *r = 0.0);
        self.terminated = false;
        self.truncated = false;

        self.observations = self
            .observation_fn
            .observe_all(&self.signals, &self.topology, &self.sim);
        self.check_observations()?;
        self.infos = self.collect_infos();
        self.is_reset = true;

        info!(time = self.sim.time().value(), "episode reset");
        Ok(self.observations.clone())
    }

    fn check_observations(&self) -> Result<(), ConfigError> {
        for ((agent, obs), space) in self
            .agents
            .iter()
            .zip(&self.observations)
            .zip(&self.observation_spaces)
        {
            if obs.len() != space.dim() {
                return Err(ConfigError::ObservationShape {
                    agent: agent.clone(),
                    expected: space.dim(),
                    found: obs.len(),
                });
            }
            if let Some(index) = space.first_violation(obs) {
                return Err(ConfigError::ObservationOutOfBounds {
                    agent: agent.clone(),
                    index,
                });
            }
        }
        Ok(())
    }

    fn collect_infos(&self) -> Vec<StepInfo> {
        let time = self.sim.time();
        self.signals
            .iter()
            .map(|s| StepInfo {
                time,
                green_phase: s.green_phase(),
                queued: s.total_queued(&self.sim),
                waiting_time: s.accumulated_waiting_time(&self.sim),
            })
            .collect()
    }

    fn index_of(&self, agent: &str) -> Result<usize, EnvError> {
        self.topology
            .index_of(agent)
            .ok_or_else(|| EnvError::UnknownAgent(agent.to_string()))
    }

    /// Agent ids in turn order.
    pub fn agents(&self) -> &[Id] {
        &self.agents
    }

    /// Agent whose turn it is; `None` once every agent has been retired
    /// (or before the first reset).
    pub fn agent_selection(&self) -> Option<&str> {
        if !self.is_reset {
            return None;
        }
        self.selector
            .selected()
            .map(|i| self.agents[i].as_str())
    }

    pub fn observation_space(&self, agent: &str) -> Result<&ObservationSpace, EnvError> {
        let i = self.index_of(agent)?;
        Ok(&self.observation_spaces[i])
    }

    pub fn action_space(&self, agent: &str) -> Result<ActionSpace, EnvError> {
        let i = self.index_of(agent)?;
        Ok(ActionSpace::new(self.signals[i].num_green_phases()))
    }

    /// Latest observation of an agent.
    pub fn observe(&self, agent: &str) -> Result<&[f64], EnvError> {
        let i = self.index_of(agent)?;
        Ok(&self.observations[i])
    }

    /// Latest transition of an agent.
    pub fn last(&self, agent: &str) -> Result<Transition, EnvError> {
        let i = self.index_of(agent)?;
        Ok(Transition {
            observation: self.observations[i].clone(),
            reward: self.pending_rewards[i],
            terminated: self.terminated,
            truncated: self.truncated,
            info: self.infos.get(i).copied().unwrap_or(StepInfo {
                time: self.sim.time(),
                green_phase: self.signals[i].green_phase(),
                queued: 0,
                waiting_time: 0.0,
            }),
        })
    }

    /// Encodes an observation of `agent` into a state key.
    pub fn encode(&self, agent: &str, observation: &[f64]) -> Result<StateKey, EnvError> {
        let i = self.index_of(agent)?;
        Ok(self.encoders[i].encode(observation))
    }

    /// Applies the selected agent's action.
    ///
    /// While the episode runs, `action` must be a green-phase index of the
    /// selected agent. After termination or truncation the call retires
    /// the selected agent and any action is ignored.
    ///
    /// When the selected agent closes the round, simulated time advances by
    /// one decision interval before the turn moves on.
    pub fn step(&mut self, action: Option<usize>) -> Result<(), EnvError> {
        if !self.is_reset {
            return Err(EnvError::NotReset);
        }
        let Some(i) = self.selector.selected() else {
            return Err(EnvError::EpisodeFinished);
        };

        if self.is_finished() {
            debug!(agent = %self.agents[i], "agent retired");
            self.selector.retire(i);
            self.selector.advance();
            return Ok(());
        }

        let action = action.ok_or_else(|| EnvError::MissingAction(self.agents[i].clone()))?;
        let n = self.signals[i].num_green_phases();
        if action >= n {
            return Err(EnvError::InvalidAction {
                agent: self.agents[i].clone(),
                action,
                n,
            });
        }

        self.signals[i].set_next_phase(action, &mut self.sim);
        self.pending_rewards[i] = 0.0;

        if self.selector.is_last() {
            self.run_interval();
        }
        self.selector.advance();
        Ok(())
    }

    /// Advances one decision interval tick by tick, then recomputes every
    /// observation, reward and statistic from the resulting state.
    fn run_interval(&mut self) {
        let step = self.sim.step_length();
        for _ in 0..self.ticks_per_decision {
            if let Err(e) = self.sim.advance(1) {
                warn!(
                    error = %e,
                    time = self.sim.time().value(),
                    "simulator failed while advancing, truncating episode"
                );
                self.truncated = true;
                break;
            }
            for signal in &mut self.signals {
                signal.tick(step, &mut self.sim);
            }
            let halted = self.signals.iter().map(|s| s.total_queued(&self.sim)).sum();
            self.stats.record_tick(halted, self.sim.arrived_count());
        }

        self.observations = self
            .observation_fn
            .observe_all(&self.signals, &self.topology, &self.sim);
        for (i, signal) in self.signals.iter().enumerate() {
            self.pending_rewards[i] = self.rewards.compute(i, signal, &self.sim);
        }
        self.infos = self.collect_infos();

        let time = self.sim.time();
        let row = self.stats.close_interval(time.value());
        debug!(
            time = time.value(),
            cumulative_waiting = row.cumulative_waiting,
            vehicles = row.vehicle_count,
            "decision interval finished"
        );

        if !self.truncated && reached(time, self.config.num_seconds) {
            self.terminated = true;
        }
        if self.is_finished() {
            info!(
                time = time.value(),
                terminated = self.terminated,
                truncated = self.truncated,
                average_waiting = row.average_waiting,
                "episode finished"
            );
        }
    }

    /// True once the episode has terminated or been truncated.
    pub fn is_finished(&self) -> bool {
        self.terminated || self.truncated
    }

    /// True once every agent has taken its final turn.
    pub fn is_done(&self) -> bool {
        self.is_reset && self.selector.all_retired()
    }

    pub fn statistics(&self) -> &WaitingStatistics {
        &self.stats
    }

    pub fn signals(&self) -> &[TrafficSignal] {
        &self.signals
    }

    pub fn signal(&self, agent: &str) -> Result<&TrafficSignal, EnvError> {
        let i = self.index_of(agent)?;
        Ok(&self.signals[i])
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Current simulated time.
    pub fn time(&self) -> Seconds {
        self.sim.time()
    }

    pub fn ticks_per_decision(&self) -> u32 {
        self.ticks_per_decision
    }

    pub fn simulator(&self) -> &S {
        &self.sim
    }

    /// Releases the simulator. The environment needs a reset afterwards.
    pub fn close(&mut self) {
        self.sim.close();
        self.is_reset = false;
        info!("signal environment closed");
    }
}
