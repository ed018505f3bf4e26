// Toy 2x2 grid and argument parsing shared by the demos.

use tsc_rl::config::SignalSpec;
use tsc_rl::simulator::toy::{ToyLane, ToySimulator};

pub const GRID: [&str; 4] = ["J00", "J01", "J10", "J11"];

/// One two-phase signal per grid node; neighbors share a row or a column.
pub fn grid_signals() -> Vec<SignalSpec> {
    GRID.iter()
        .map(|id| {
            let (row, col) = (&id[1..2], &id[2..3]);
            let neighbors = GRID
                .iter()
                .filter(|other| {
                    *other != id && ((&other[1..2] == row) ^ (&other[2..3] == col))
                })
                .map(|n| n.to_string())
                .collect();
            SignalSpec::new(
                *id,
                vec!["Gr".into(), "rG".into()],
                vec![format!("{id}_ns"), format!("{id}_ew")],
            )
            .with_neighbors(neighbors)
        })
        .collect()
}

pub fn grid_simulator() -> ToySimulator {
    let mut lanes = Vec::new();
    for (k, id) in GRID.iter().enumerate() {
        lanes.push(ToyLane::new(format!("{id}_ns"), 0.15 + 0.05 * k as f64));
        lanes.push(ToyLane::new(format!("{id}_ew"), 0.25));
    }
    GRID.iter().fold(ToySimulator::new(lanes), |sim, id| {
        sim.with_signal(*id, vec![format!("{id}_ns"), format!("{id}_ew")])
    })
}

pub fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
