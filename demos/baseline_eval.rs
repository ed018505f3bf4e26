// Demonstration: evaluate a baseline policy on a toy 2x2 grid.
//
// Run from the repo root:
//   cargo run --example baseline_eval -- --policy cycle --episodes 5

mod common;

use std::env;

use tsc_rl::config::EnvConfig;
use tsc_rl::metrics::EvaluationMetrics;
use tsc_rl::policy::{CyclePolicy, Policy, RandomPolicy};
use tsc_rl::units::secs;
use tsc_rl::SignalEnv;

use common::{arg_value, grid_signals, grid_simulator};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let policy_name = arg_value(&args, "--policy").unwrap_or("cycle");
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let seconds: f64 = arg_value(&args, "--seconds")
        .and_then(|s| s.parse().ok())
        .unwrap_or(3600.0);

    let config = EnvConfig {
        num_seconds: secs(seconds),
        ..EnvConfig::with_signals(grid_signals())
    };
    let mut env = match SignalEnv::new(config, grid_simulator()) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Invalid network: {e}");
            std::process::exit(1);
        }
    };

    let mut policy: Box<dyn Policy> = match policy_name {
        "random" => Box::new(RandomPolicy::new(seed)),
        "cycle" => Box::new(CyclePolicy::new(6)),
        other => {
            eprintln!("Unknown --policy '{}'; expected 'cycle' or 'random'.", other);
            std::process::exit(2);
        }
    };

    match EvaluationMetrics::evaluate(&mut env, policy.as_mut(), episodes) {
        Ok(metrics) => {
            println!("Policy: {}", policy.name());
            println!("{}", metrics);
        }
        Err(e) => {
            eprintln!("Evaluation failed: {e}");
            std::process::exit(1);
        }
    }
    env.close();
}
