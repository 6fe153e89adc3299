use std::collections::BTreeSet;

use petgraph::Direction;

use crate::error::{Result, SynthKitError};
use crate::graph::dag::DependencyGraph;
use crate::schema::types::SchemaSpec;

/// Compute the planner order for a schema: a Kahn topological sort with
/// ties broken by table insertion order, so the order is deterministic for
/// a given schema document.
pub fn plan_tables(schema: &SchemaSpec) -> Result<Vec<String>> {
    let graph = DependencyGraph::from_schema(schema)?;
    planner_order(&graph)
}

/// Kahn's algorithm over the dependency graph. Node indices were assigned
/// in schema insertion order, so taking the lowest ready index at every
/// step breaks ties by declaration order.
pub fn planner_order(graph: &DependencyGraph) -> Result<Vec<String>> {
    let g = &graph.graph;
    let mut indegree: Vec<usize> = g
        .node_indices()
        .map(|idx| g.neighbors_directed(idx, Direction::Incoming).count())
        .collect();

    let mut ready: BTreeSet<usize> = indegree
        .iter()
        .enumerate()
        .filter(|(_, deg)| **deg == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(g.node_count());
    while let Some(next) = ready.iter().next().copied() {
        ready.remove(&next);
        let node = petgraph::graph::NodeIndex::new(next);
        order.push(graph.table_name(node).to_string());
        for child in g.neighbors_directed(node, Direction::Outgoing) {
            let child_pos = child.index();
            indegree[child_pos] = indegree[child_pos].saturating_sub(1);
            if indegree[child_pos] == 0 {
                ready.insert(child_pos);
            }
        }
    }

    if order.len() != g.node_count() {
        let mut stuck: Vec<&str> = indegree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg > 0)
            .map(|(i, _)| graph.table_name(petgraph::graph::NodeIndex::new(i)))
            .collect();
        stuck.sort_unstable();
        return Err(SynthKitError::CircularDependency {
            tables: stuck.join(", "),
        });
    }

    Ok(order)
}
