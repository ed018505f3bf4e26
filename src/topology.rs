//! Neighbor relationships between controlled intersections.
//!
//! Each signal may declare neighbors whose lane density feeds its
//! neighbor-aware observation. Declarations are directed edges: `A`
//! listing `B` does not make `B` observe `A`.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::config::SignalSpec;
use crate::error::ConfigError;
use crate::Id;

/// Directed neighbor graph over the signals of one network.
///
/// # Invariants
///
/// - Node `i` is the `i`-th declared signal, so node indices double as
///   agent indices.
/// - Every edge points at a declared signal.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    graph: DiGraph<Id, ()>,
    node_by_id: HashMap<Id, NodeIndex>,
}

impl Topology {
    /// Builds the graph, rejecting duplicate ids, self-references and
    /// neighbors that are not part of the network.
    pub fn build(specs: &[SignalSpec]) -> Result<Self, ConfigError> {
        let mut graph = DiGraph::with_capacity(specs.len(), 0);
        let mut node_by_id = HashMap::with_capacity(specs.len());

        for spec in specs {
            if node_by_id.contains_key(&spec.id) {
                return Err(ConfigError::DuplicateSignal(spec.id.clone()));
            }
            let node = graph.add_node(spec.id.clone());
            node_by_id.insert(spec.id.clone(), node);
        }

        for spec in specs {
            let from = node_by_id[&spec.id];
            for neighbor in &spec.neighbors {
                if neighbor == &spec.id {
                    return Err(ConfigError::SelfNeighbor {
                        signal: spec.id.clone(),
                    });
                }
                let to = node_by_id
                    .get(neighbor)
                    .copied()
                    .ok_or_else(|| ConfigError::UnknownNeighbor {
                        signal: spec.id.clone(),
                        neighbor: neighbor.clone(),
                    })?;
                graph.add_edge(from, to, ());
            }
        }

        Ok(Self { graph, node_by_id })
    }

    /// Index of a signal, if declared.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.node_by_id.get(id).map(|n| n.index())
    }

    /// Id of the signal at `index`.
    pub fn id_of(&self, index: usize) -> Option<&str> {
        self.graph
            .node_weight(NodeIndex::new(index))
            .map(String::as_str)
    }

    /// Indices of the neighbors declared by signal `index`, in declaration
    /// order.
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(index), Direction::Outgoing)
            .map(|n| n.index())
            .collect();
        // petgraph walks edges newest first
        out.reverse();
        out
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
