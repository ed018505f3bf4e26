use super::*;
use crate::config::{EnvConfig, SignalSpec};
use crate::error::SimulatorError;
use crate::learning::{EpsilonGreedy, QLAgent, QLConfig};
use crate::observation::NeighborAggregation;
use crate::signal::SignalState;
use crate::simulator::toy::{ToyLane, ToySimulator};
use crate::units::secs;

fn spec(id: &str) -> SignalSpec {
    SignalSpec::new(
        id,
        vec!["Gr".into(), "rG".into()],
        vec![format!("{id}_n"), format!("{id}_e")],
    )
}

fn toy(ids: &[&str], rate: f64) -> ToySimulator {
    let mut lanes = Vec::new();
    for id in ids {
        lanes.push(ToyLane::new(format!("{id}_n"), rate));
        lanes.push(ToyLane::new(format!("{id}_e"), rate));
    }
    let mut sim = ToySimulator::new(lanes);
    for id in ids {
        sim = sim.with_signal(*id, vec![format!("{id}_n"), format!("{id}_e")]);
    }
    sim
}

fn config(signals: Vec<SignalSpec>, num_seconds: f64) -> EnvConfig {
    EnvConfig {
        delta_time: secs(5.0),
        yellow_time: secs(2.0),
        min_green: secs(5.0),
        num_seconds: secs(num_seconds),
        ..EnvConfig::with_signals(signals)
    }
}

/// `A` and `B`, with `B` observing `A`.
fn two_signal_env(num_seconds: f64) -> SignalEnv<ToySimulator> {
    let cfg = EnvConfig {
        observation: ObservationFunction::NeighborDensity(NeighborAggregation::Mean),
        ..config(
            vec![spec("A"), spec("B").with_neighbors(vec!["A".into()])],
            num_seconds,
        )
    };
    SignalEnv::new(cfg, toy(&["A", "B"], 0.5)).unwrap()
}

fn one_signal_env() -> SignalEnv<ToySimulator> {
    SignalEnv::new(config(vec![spec("A")], 1000.0), toy(&["A"], 0.5)).unwrap()
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn unknown_lane_is_rejected() {
    let mut bad = spec("A");
    bad.lanes.push("nowhere".into());
    let err = SignalEnv::new(config(vec![bad], 100.0), toy(&["A"], 0.0)).unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownLane {
            signal: "A".into(),
            lane: "nowhere".into()
        }
    );
}

#[test]
fn unknown_neighbor_is_rejected() {
    let cfg = config(vec![spec("A").with_neighbors(vec!["Z".into()])], 100.0);
    let err = SignalEnv::new(cfg, toy(&["A"], 0.0)).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownNeighbor { .. }));
}

#[test]
fn delta_time_not_exceeding_yellow_is_rejected() {
    let cfg = EnvConfig {
        delta_time: secs(2.0),
        ..config(vec![spec("A")], 100.0)
    };
    let err = SignalEnv::new(cfg, toy(&["A"], 0.0)).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTiming(_)));
}

#[test]
fn decision_shorter_than_a_tick_is_rejected() {
    let sim = toy(&["A"], 0.0).with_step_length(secs(20.0));
    let err = SignalEnv::new(config(vec![spec("A")], 100.0), sim).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTiming(_)));
}

#[test]
fn yellow_off_the_tick_grid_is_rejected() {
    let sim = toy(&["A"], 0.0).with_step_length(secs(0.5));
    let cfg = EnvConfig {
        yellow_time: secs(1.25),
        ..config(vec![spec("A")], 100.0)
    };
    let err = SignalEnv::new(cfg.clone(), sim.clone()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTiming(_)));

    let cfg = EnvConfig {
        yellow_time: secs(1.5),
        ..cfg
    };
    let env = SignalEnv::new(cfg, sim).unwrap();
    assert_eq!(env.ticks_per_decision(), 10);
}

#[test]
fn bad_reward_scale_is_rejected() {
    let mut cfg = config(vec![spec("A")], 100.0);
    cfg.reward.scale = 0.0;
    let err = SignalEnv::new(cfg, toy(&["A"], 0.0)).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidReward(_)));
}

#[test]
fn invalid_green_phase_is_rejected() {
    let bad = SignalSpec::new("A", vec!["Gr".into(), "yG".into()], vec!["A_n".into()]);
    let err = SignalEnv::new(config(vec![bad], 100.0), toy(&["A"], 0.0)).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidGreenPhase { index: 1, .. }));
}

// ── Reset and spaces ─────────────────────────────────────────────

#[test]
fn reset_observations_match_declared_spaces() {
    let mut env = two_signal_env(100.0);
    let obs = env.reset().unwrap();
    assert_eq!(obs.len(), 2);
    for (agent, o) in env.agents().to_vec().iter().zip(&obs) {
        let space = env.observation_space(agent).unwrap();
        assert_eq!(space.dim(), o.len());
        assert!(space.contains(o));
        assert_eq!(env.observe(agent).unwrap(), o.as_slice());
    }
    // A: 2 + 1 + 4 + neighbor feature; B likewise.
    assert_eq!(obs[0].len(), 8);
    assert_eq!(env.action_space("B").unwrap(), ActionSpace::new(2));
    assert_eq!(env.agent_selection(), Some("A"));
}

#[test]
fn stepping_before_reset_fails() {
    let mut env = one_signal_env();
    assert_eq!(env.agent_selection(), None);
    assert_eq!(env.step(Some(0)), Err(EnvError::NotReset));
}

#[test]
fn unknown_agent_and_bad_actions_are_errors() {
    let mut env = two_signal_env(100.0);
    env.reset().unwrap();
    assert_eq!(
        env.last("Z").unwrap_err(),
        EnvError::UnknownAgent("Z".into())
    );
    assert!(matches!(
        env.step(Some(2)),
        Err(EnvError::InvalidAction { action: 2, n: 2, .. })
    ));
    assert_eq!(env.step(None), Err(EnvError::MissingAction("A".into())));
    // Rejected calls leave the turn where it was.
    assert_eq!(env.agent_selection(), Some("A"));
}

// ── Turn order and clock ─────────────────────────────────────────

#[test]
fn clock_advances_when_the_round_closes() {
    let mut env = two_signal_env(100.0);
    env.reset().unwrap();
    env.step(Some(0)).unwrap();
    assert_eq!(env.time().value(), 0.0);
    assert_eq!(env.agent_selection(), Some("B"));
    env.step(Some(0)).unwrap();
    assert!((env.time().value() - 5.0).abs() < 1e-9);
    assert_eq!(env.agent_selection(), Some("A"));
    assert_eq!(env.statistics().rows().len(), 1);
}

#[test]
fn all_agents_observe_the_same_post_interval_state() {
    let mut env = two_signal_env(100.0);
    env.reset().unwrap();
    for _ in 0..3 {
        env.step(Some(1)).unwrap();
        env.step(Some(0)).unwrap();
    }
    let expected = env
        .config()
        .observation
        .observe_all(env.signals(), env.topology(), env.simulator());
    for (i, agent) in env.agents().iter().enumerate() {
        assert_eq!(env.observe(agent).unwrap(), expected[i].as_slice());
        assert_eq!(env.last(agent).unwrap().info.time, env.time());
    }
}

#[test]
fn reward_is_consumed_when_the_agent_acts() {
    let mut env = two_signal_env(100.0);
    env.reset().unwrap();
    assert_eq!(env.last("A").unwrap().reward, 0.0);
    env.step(Some(0)).unwrap();
    env.step(Some(0)).unwrap();

    // Red lanes queued during the interval.
    let ra = env.last("A").unwrap().reward;
    let rb = env.last("B").unwrap().reward;
    assert!(ra < 0.0);
    assert!(rb < 0.0);

    env.step(Some(0)).unwrap();
    assert_eq!(env.last("A").unwrap().reward, 0.0);
    assert_eq!(env.last("B").unwrap().reward, rb);
}

// ── Minimum green through the environment ────────────────────────

#[test]
fn early_change_is_held_then_committed_once_allowed() {
    let mut env = one_signal_env();
    env.reset().unwrap();

    // t = 0 and t = 5: less than min_green + yellow_time has elapsed.
    env.step(Some(1)).unwrap();
    assert_eq!(env.signal("A").unwrap().state(), SignalState::Green(0));
    env.step(Some(1)).unwrap();
    assert_eq!(env.signal("A").unwrap().state(), SignalState::Green(0));
    assert_eq!(env.simulator().phase_of("A"), Some("Gr"));

    // t = 10: committed; two yellow ticks, then three ticks of green 1.
    env.step(Some(1)).unwrap();
    let ts = env.signal("A").unwrap();
    assert_eq!(ts.state(), SignalState::Green(1));
    assert!((ts.time_since_last_phase_change().value() - 3.0).abs() < 1e-9);
    assert_eq!(env.simulator().phase_of("A"), Some("rG"));
    assert_eq!(env.last("A").unwrap().info.green_phase, 1);
}

#[test]
fn same_phase_request_keeps_green_running() {
    let mut env = one_signal_env();
    env.reset().unwrap();
    for _ in 0..4 {
        env.step(Some(0)).unwrap();
    }
    let ts = env.signal("A").unwrap();
    assert_eq!(ts.state(), SignalState::Green(0));
    assert!((ts.time_since_last_phase_change().value() - 20.0).abs() < 1e-9);
    assert!(ts.min_green_elapsed());
    // One-hot phase 0, min-green flag set.
    assert_eq!(&env.observe("A").unwrap()[..3], &[1.0, 0.0, 1.0]);
}

// ── Episode end ──────────────────────────────────────────────────

#[test]
fn termination_gives_every_agent_a_final_turn() {
    let mut env = two_signal_env(20.0);
    env.reset().unwrap();
    for _ in 0..4 {
        assert!(!env.last("A").unwrap().terminated);
        env.step(Some(0)).unwrap();
        env.step(Some(1)).unwrap();
    }
    assert!(env.is_finished());
    assert!(!env.is_done());

    for agent in ["A", "B"] {
        assert_eq!(env.agent_selection(), Some(agent));
        let last = env.last(agent).unwrap();
        assert!(last.terminated);
        assert!(!last.truncated);
        env.step(None).unwrap();
    }
    assert!(env.is_done());
    assert_eq!(env.agent_selection(), None);
    assert_eq!(env.step(None), Err(EnvError::EpisodeFinished));
    assert_eq!(env.statistics().rows().len(), 4);
}

#[test]
fn simulator_failure_truncates_instead_of_erroring() {
    let cfg = config(vec![spec("A")], 1000.0);
    let sim = toy(&["A"], 1.0).with_deadlock_limit(3);
    let mut env = SignalEnv::new(cfg, sim).unwrap();
    env.reset().unwrap();
    env.step(Some(0)).unwrap();

    let last = env.last("A").unwrap();
    assert!(last.truncated);
    assert!(!last.terminated);
    assert!(env.time().value() < 5.0);
    env.step(None).unwrap();
    assert!(env.is_done());
}

#[test]
fn reset_restarts_signals_clock_and_statistics() {
    let mut env = one_signal_env();
    env.reset().unwrap();
    for _ in 0..3 {
        env.step(Some(1)).unwrap();
    }
    assert_eq!(env.signal("A").unwrap().green_phase(), 1);

    let obs = env.reset().unwrap();
    let ts = env.signal("A").unwrap();
    assert_eq!(ts.state(), SignalState::Green(0));
    assert_eq!(ts.time_since_last_phase_change().value(), 0.0);
    assert_eq!(env.time().value(), 0.0);
    assert!(env.statistics().rows().is_empty());
    assert_eq!(obs[0][0], 1.0);
    assert_eq!(env.agent_selection(), Some("A"));
}

#[test]
fn failure_on_the_horizon_tick_only_truncates() {
    // "A_e" is red and gains one vehicle per tick; the fifth tick lands
    // on the horizon and overflows the limit.
    let sim = toy(&["A"], 1.0).with_deadlock_limit(4);
    let mut env = SignalEnv::new(config(vec![spec("A")], 5.0), sim).unwrap();
    env.reset().unwrap();
    env.step(Some(0)).unwrap();

    assert!((env.time().value() - 5.0).abs() < 1e-9);
    let last = env.last("A").unwrap();
    assert!(last.truncated);
    assert!(!last.terminated);
}

#[test]
fn simulator_reset_failure_is_reported() {
    struct Broken(ToySimulator);

    impl Simulator for Broken {
        fn advance(&mut self, ticks: u32) -> Result<(), SimulatorError> {
            self.0.advance(ticks)
        }
        fn time(&self) -> Seconds {
            self.0.time()
        }
        fn step_length(&self) -> Seconds {
            self.0.step_length()
        }
        fn has_lane(&self, lane: &str) -> bool {
            self.0.has_lane(lane)
        }
        fn lane_occupancy(&self, lane: &str) -> crate::simulator::LaneOccupancy {
            self.0.lane_occupancy(lane)
        }
        fn lane_halting_count(&self, lane: &str) -> u32 {
            self.0.lane_halting_count(lane)
        }
        fn lane_waiting_time(&self, lane: &str) -> f64 {
            self.0.lane_waiting_time(lane)
        }
        fn arrived_count(&self) -> u32 {
            self.0.arrived_count()
        }
        fn set_signal_phase(&mut self, intersection: &str, state: &str) {
            self.0.set_signal_phase(intersection, state)
        }
        fn reset(&mut self) -> Result<(), SimulatorError> {
            Err(SimulatorError::Disconnected("closed".into()))
        }
    }

    let mut env = SignalEnv::new(config(vec![spec("A")], 100.0), Broken(toy(&["A"], 0.0))).unwrap();
    assert!(matches!(env.reset(), Err(EnvError::SimulatorReset(_))));
}

#[test]
fn tiered_neighbor_density_keeps_its_own_key_slot() {
    let cfg = EnvConfig {
        observation: ObservationFunction::NeighborDensity(NeighborAggregation::Tiered),
        encoding_bins: 2,
        ..config(
            vec![spec("A"), spec("B").with_neighbors(vec!["A".into()])],
            100.0,
        )
    };
    let env = SignalEnv::new(cfg, toy(&["A", "B"], 0.0)).unwrap();
    let obs = |tier: f64| vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, tier];
    let mid = env.encode("B", &obs(0.5)).unwrap();
    let high = env.encode("B", &obs(1.0)).unwrap();
    assert_ne!(mid, high);
    assert_eq!(mid.as_slice().last(), Some(&1));
    assert_eq!(high.as_slice().last(), Some(&2));
}

// ── Learning loop ────────────────────────────────────────────────

#[test]
fn q_learning_agents_run_a_full_episode() {
    let mut env = two_signal_env(50.0);
    let obs = env.reset().unwrap();
    let ids = env.agents().to_vec();
    let mut agents: Vec<QLAgent> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            QLAgent::new(
                id.clone(),
                env.encode(id, &obs[i]).unwrap(),
                env.action_space(id).unwrap(),
                QLConfig::default(),
                EpsilonGreedy::new(0.5, 0.05, 0.99).with_seed(i as u64),
            )
        })
        .collect();

    while let Some(agent) = env.agent_selection().map(str::to_owned) {
        let i = env.topology().index_of(&agent).unwrap();
        let t = env.last(&agent).unwrap();
        if agents[i].pending_action().is_some() {
            let next = env.encode(&agent, &t.observation).unwrap();
            agents[i].learn(next, t.reward);
        }
        let action = if t.terminated || t.truncated {
            None
        } else {
            Some(agents[i].act())
        };
        env.step(action).unwrap();
    }

    assert!(env.is_done());
    assert_eq!(env.statistics().rows().len(), 10);
    for ag in &agents {
        assert!(ag.pending_action().is_none());
        assert!(!ag.q_table().is_empty());
    }
}

#[test]
fn encode_uses_configured_bins() {
    let mut env = one_signal_env();
    let obs = env.reset().unwrap();
    let key = env.encode("A", &obs[0]).unwrap();
    // phase, flag, 2 densities, 2 queues
    assert_eq!(key.as_slice().len(), 6);
    assert_eq!(key.as_slice()[0], 0);
}
