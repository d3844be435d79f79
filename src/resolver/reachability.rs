//! Reachability of concrete states over transition edges.

use super::Declarations;
use crate::core::StateKey;
use crate::error::ConfigError;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::collections::{HashMap, HashSet};

/// Every concrete declaration must be reachable from `initial` by following
/// zero or more transitions.
pub(super) fn check(declarations: &Declarations, initial: &StateKey) -> Result<(), ConfigError> {
    let mut graph: DiGraph<&StateKey, &str> = DiGraph::new();
    let nodes: HashMap<&StateKey, NodeIndex> = declarations
        .keys()
        .map(|key| (key, graph.add_node(key)))
        .collect();

    // Abstract declarations are never held, so their transitions never fire
    // on their own; concrete states inherit the ones they use.
    for (key, declaration) in declarations.iter().filter(|(_, d)| d.is_concrete()) {
        for transition in declaration.transitions() {
            let Some(destination) = transition.destination() else {
                continue;
            };
            if let (Some(&from), Some(&to)) = (nodes.get(key), nodes.get(destination.produces())) {
                graph.add_edge(from, to, transition.name());
            }
        }
    }

    let Some(&start) = nodes.get(initial) else {
        return Err(ConfigError::MissingInitial);
    };
    let mut visited = HashSet::new();
    let mut bfs = Bfs::new(&graph, start);
    while let Some(node) = bfs.next(&graph) {
        visited.insert(graph[node]);
    }

    let unreachable: Vec<StateKey> = declarations
        .values()
        .filter(|d| d.is_concrete() && !visited.contains(d.key()))
        .map(|d| d.key().clone())
        .collect();

    if unreachable.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Unreachable {
            initial: initial.clone(),
            unreachable,
        })
    }
}
