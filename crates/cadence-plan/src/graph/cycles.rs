//! Cycle detection over dependency and hierarchy graphs.
//!
//! Cycles are never fatal for allocation: the packers always make forced
//! progress, so a cycle only produces a diagnostic. Each reported cycle
//! carries the members of its strongly connected component and the
//! back-edges found by a depth-first search with an explicit recursion
//! stack; removing those edges makes the component acyclic.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashSet;

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use serde::Serialize;

use super::build::ItemGraph;

/// A detected cycle with suggested edges to remove to break it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Sorted item ids forming the cycle (members of the SCC).
    pub members: Vec<String>,
    /// Suggested `(from, to)` edges whose removal breaks the cycle.
    pub suggested_breaks: Vec<(String, String)>,
}

/// Detect all cycles in `graph`, sorted by member list.
///
/// Self-loops are reported as a one-member cycle whose break is the loop.
#[must_use]
pub fn find_cycles(graph: &ItemGraph) -> Vec<CycleReport> {
    let mut reports: Vec<CycleReport> = tarjan_scc(graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| graph.contains_edge(*node, *node))
        })
        .map(|component| {
            let mut members: Vec<String> =
                component.iter().map(|&idx| node_id(graph, idx)).collect();
            members.sort_unstable();

            let member_set: HashSet<NodeIndex> = component.iter().copied().collect();
            let suggested_breaks = back_edges(graph, &component, &member_set);

            CycleReport {
                members,
                suggested_breaks,
            }
        })
        .collect();

    reports.sort_unstable_by(|a, b| a.members.cmp(&b.members));
    reports
}

/// Node indices that sit on any cycle of `graph`.
#[must_use]
pub fn cyclic_nodes(graph: &ItemGraph) -> HashSet<usize> {
    tarjan_scc(graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| graph.contains_edge(*node, *node))
        })
        .flatten()
        .map(NodeIndex::index)
        .collect()
}

/// Iterative DFS restricted to one SCC, collecting edges that point back to
/// a node on the current recursion stack.
fn back_edges(
    graph: &ItemGraph,
    component: &[NodeIndex],
    member_set: &HashSet<NodeIndex>,
) -> Vec<(String, String)> {
    let mut starts: Vec<NodeIndex> = component.to_vec();
    starts.sort_unstable_by_key(|&idx| node_id(graph, idx));

    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut on_stack: HashSet<NodeIndex> = HashSet::new();
    let mut found: Vec<(String, String)> = Vec::new();

    // Each frame: (node, its in-component successors, next successor to visit).
    let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();

    for start in starts {
        if !visited.insert(start) {
            continue;
        }
        on_stack.insert(start);
        stack.push((start, successors(graph, start, member_set), 0));

        while let Some((current, next_nodes, cursor)) = stack.last_mut() {
            let current = *current;
            if let Some(&next) = next_nodes.get(*cursor) {
                *cursor += 1;
                if on_stack.contains(&next) {
                    found.push((node_id(graph, current), node_id(graph, next)));
                } else if visited.insert(next) {
                    on_stack.insert(next);
                    stack.push((next, successors(graph, next, member_set), 0));
                }
            } else {
                stack.pop();
                on_stack.remove(&current);
            }
        }
    }

    found.sort_unstable();
    found
}

fn successors(
    graph: &ItemGraph,
    node: NodeIndex,
    member_set: &HashSet<NodeIndex>,
) -> Vec<NodeIndex> {
    let mut next: Vec<NodeIndex> = graph
        .neighbors_directed(node, Direction::Outgoing)
        .filter(|n| member_set.contains(n))
        .collect();
    next.sort_unstable_by_key(|&idx| node_id(graph, idx));
    next.dedup();
    next
}

fn node_id(graph: &ItemGraph, idx: NodeIndex) -> String {
    graph
        .node_weight(idx)
        .cloned()
        .unwrap_or_else(|| format!("#{}", idx.index()))
}
