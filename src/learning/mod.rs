//! Tabular Q-learning for independent signal agents.
//!
//! Each agent owns a [`QTable`] keyed by [`StateKey`]s produced by a
//! [`StateEncoder`], explores with [`EpsilonGreedy`], and may persist its
//! table through a [`QTableStore`].

pub mod agent;
pub mod encoding;
pub mod exploration;
pub mod q_table;
pub mod store;

pub use agent::{QLAgent, QLConfig};
pub use encoding::{StateEncoder, StateKey};
pub use exploration::{argmax, EpsilonConfig, EpsilonGreedy};
pub use q_table::QTable;
pub use store::{FileStore, MemoryStore, QTableStore};
