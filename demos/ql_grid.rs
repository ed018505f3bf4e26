// Demonstration: independent Q-learning agents on a toy 2x2 grid.
//
// Each run restores the Q-tables saved by the previous run, trains for one
// episode and saves its tables and interval statistics.
//
// Run from the repo root:
//   RUST_LOG=info cargo run --example ql_grid -- --runs 3 --out outputs/ql_grid

mod common;

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use tsc_rl::config::EnvConfig;
use tsc_rl::learning::{EpsilonGreedy, FileStore, QLAgent, QLConfig};
use tsc_rl::observation::{NeighborAggregation, ObservationFunction};
use tsc_rl::simulator::toy::ToySimulator;
use tsc_rl::units::secs;
use tsc_rl::SignalEnv;

use common::{arg_value, grid_signals, grid_simulator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let runs: u32 = arg_value(&args, "--runs")
        .and_then(|s| s.parse().ok())
        .unwrap_or(3);
    let seconds: f64 = arg_value(&args, "--seconds")
        .and_then(|s| s.parse().ok())
        .unwrap_or(3600.0);
    let out = PathBuf::from(arg_value(&args, "--out").unwrap_or("outputs/ql_grid"));

    let config = EnvConfig {
        num_seconds: secs(seconds),
        observation: ObservationFunction::NeighborDensity(NeighborAggregation::Tiered),
        ..EnvConfig::with_signals(grid_signals())
    };
    let ql = QLConfig {
        alpha: 0.2,
        gamma: 0.99,
    };
    let mut store = FileStore::new(out.join("q_tables"));
    let mut env = SignalEnv::new(config, grid_simulator())?;

    for run in 1..=runs {
        let obs = env.reset()?;
        let ids = env.agents().to_vec();
        let mut agents = Vec::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            let mut agent = QLAgent::new(
                id.clone(),
                env.encode(id, &obs[i])?,
                env.action_space(id)?,
                ql,
                EpsilonGreedy::new(0.05, 0.005, 1.0).with_seed(u64::from(run) * 100 + i as u64),
            );
            agent.restore(&store, run - 1)?;
            agents.push(agent);
        }

        while let Some(agent) = env.agent_selection().map(str::to_owned) {
            let Some(i) = ids.iter().position(|a| *a == agent) else {
                break;
            };
            let t = env.last(&agent)?;
            if agents[i].pending_action().is_some() {
                agents[i].learn(env.encode(&agent, &t.observation)?, t.reward);
            }
            let action = if t.terminated || t.truncated {
                None
            } else {
                Some(agents[i].act())
            };
            env.step(action)?;
        }

        for agent in &agents {
            agent.persist(&mut store, run)?;
        }
        write_statistics(&out, run, &env)?;

        let total: f64 = agents.iter().map(|a| a.accumulated_reward()).sum();
        info!(run, total_reward = total, "run finished");
        if let Some(last) = env.statistics().last() {
            println!(
                "run {run}: total reward {total:.3}, average waiting {:.3}",
                last.average_waiting
            );
        }
    }

    env.close();
    Ok(())
}

fn write_statistics(
    out: &Path,
    run: u32,
    env: &SignalEnv<ToySimulator>,
) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(out)?;
    let mut file = fs::File::create(out.join(format!("statistics_run{run}.jsonl")))?;
    for row in env.statistics().rows() {
        writeln!(file, "{}", serde_json::to_string(row)?)?;
    }
    Ok(())
}
