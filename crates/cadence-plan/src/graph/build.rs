//! Dependency and hierarchy graph construction.
//!
//! ## Edge Direction
//!
//! An edge `A → B` in the dependency graph means "B depends on A": A should
//! be done before B. For each item `B` with `dependencies = [A, ...]` we
//! insert `A → B`. The hierarchy graph uses `parent → child`.
//!
//! Only ids present in the working set become edges. References to ids
//! outside the batch are collected separately by [`unknown_references`].

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::instrument;

use super::backlog::Backlog;

/// Graph type shared by the dependency and hierarchy views.
///
/// Node weights are item ids; node `i` is backlog item `i`.
pub type ItemGraph = DiGraph<String, ()>;

/// Per-item view of the resolved dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyNode {
    pub item_id: String,
    /// Dependencies restricted to ids present in the working set.
    pub dependencies: Vec<String>,
    /// Items that depend on this one (reverse edges).
    pub dependents: Vec<String>,
}

/// Directed dependency graph over one backlog.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Nodes = item ids, edges = `dependency → dependent`.
    pub graph: ItemGraph,
    /// Mapping from item id to petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build the dependency graph for every item in `backlog`.
    ///
    /// Every item is a node even without dependencies. Duplicate references
    /// collapse to a single edge; a self-reference becomes a self-loop.
    #[must_use]
    #[instrument(skip(backlog), fields(items = backlog.len()))]
    pub fn from_backlog(backlog: &Backlog) -> Self {
        let (mut graph, node_map) = item_nodes(backlog);

        for scored in backlog.items() {
            let dependent = node_map[scored.id()];
            for dep in &scored.item.dependencies {
                let Some(&dependency) = node_map.get(dep.as_str()) else {
                    continue;
                };
                if !graph.contains_edge(dependency, dependent) {
                    graph.add_edge(dependency, dependent, ());
                }
            }
        }

        Self { graph, node_map }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Resolved dependencies and dependents of `item_id`.
    #[must_use]
    pub fn node(&self, item_id: &str) -> Option<DependencyNode> {
        let idx = *self.node_map.get(item_id)?;
        Some(DependencyNode {
            item_id: item_id.to_string(),
            dependencies: self.neighbor_ids(idx, Direction::Incoming),
            dependents: self.neighbor_ids(idx, Direction::Outgoing),
        })
    }

    /// Every node, in backlog input order.
    #[must_use]
    pub fn nodes(&self) -> Vec<DependencyNode> {
        self.graph
            .node_indices()
            .filter_map(|idx| {
                let id = self.graph.node_weight(idx)?;
                self.node(id)
            })
            .collect()
    }

    fn neighbor_ids(&self, idx: NodeIndex, direction: Direction) -> Vec<String> {
        let mut ids: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Build the `parent → child` graph from parent ids as written, including
/// links that close a cycle.
#[must_use]
pub fn hierarchy_graph(backlog: &Backlog) -> ItemGraph {
    let (mut graph, _) = item_nodes(backlog);

    for idx in 0..backlog.len() {
        if let Some(parent) = backlog.raw_parent(idx) {
            graph.add_edge(NodeIndex::new(parent), NodeIndex::new(idx), ());
        }
    }

    graph
}

/// Dependency and parent ids that do not name an item of this batch,
/// keyed by the referencing item (input order).
#[must_use]
pub fn unknown_references(backlog: &Backlog) -> Vec<(String, Vec<String>)> {
    backlog
        .items()
        .iter()
        .filter_map(|scored| {
            let mut missing: Vec<String> = scored
                .item
                .dependencies
                .iter()
                .chain(scored.item.parent_id.iter())
                .filter(|id| !backlog.contains(id))
                .cloned()
                .collect();
            missing.sort_unstable();
            missing.dedup();
            (!missing.is_empty()).then(|| (scored.id().to_string(), missing))
        })
        .collect()
}

fn item_nodes(backlog: &Backlog) -> (ItemGraph, HashMap<String, NodeIndex>) {
    let mut graph = ItemGraph::with_capacity(backlog.len(), backlog.len());
    let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(backlog.len());

    for scored in backlog.items() {
        let idx = graph.add_node(scored.id().to_string());
        node_map.insert(scored.id().to_string(), idx);
    }

    (graph, node_map)
}

#[cfg(test)]
mod tests {
    use cadence_core::model::WorkItem;

    use super::*;
    use crate::score::PriorityScorer;

    fn backlog(items: &[WorkItem]) -> Backlog {
        Backlog::new(items, &PriorityScorer::default())
    }

    #[test]
    fn edges_run_from_dependency_to_dependent() {
        let b = backlog(&[
            WorkItem::new("api", "API", 3),
            WorkItem::new("ui", "UI", 3).with_dependencies(["api"]),
        ]);
        let graph = DependencyGraph::from_backlog(&b);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);

        let ui = graph.node("ui").expect("ui node");
        assert_eq!(ui.dependencies, vec!["api".to_string()]);
        assert!(ui.dependents.is_empty());

        let api = graph.node("api").expect("api node");
        assert_eq!(api.dependents, vec!["ui".to_string()]);
    }

    #[test]
    fn external_dependencies_are_not_edges() {
        let b = backlog(&[WorkItem::new("ui", "UI", 3).with_dependencies(["vendor-sdk"])]);
        let graph = DependencyGraph::from_backlog(&b);

        assert_eq!(graph.edge_count(), 0);
        assert!(graph.node("ui").expect("node").dependencies.is_empty());
        assert_eq!(
            unknown_references(&b),
            vec![("ui".to_string(), vec!["vendor-sdk".to_string()])]
        );
    }

    #[test]
    fn duplicate_dependencies_collapse() {
        let b = backlog(&[
            WorkItem::new("a", "A", 1),
            WorkItem::new("b", "B", 1).with_dependencies(["a", "a"]),
        ]);
        assert_eq!(DependencyGraph::from_backlog(&b).edge_count(), 1);
    }

    #[test]
    fn nodes_follow_input_order() {
        let b = backlog(&[
            WorkItem::new("z", "Z", 1),
            WorkItem::new("a", "A", 1),
        ]);
        let ids: Vec<String> = DependencyGraph::from_backlog(&b)
            .nodes()
            .into_iter()
            .map(|n| n.item_id)
            .collect();
        assert_eq!(ids, vec!["z", "a"]);
    }

    #[test]
    fn hierarchy_graph_links_parent_to_child() {
        let b = backlog(&[
            WorkItem::new("epic", "Epic", 5),
            WorkItem::new("story", "Story", 3).with_parent("epic"),
            WorkItem::new("orphan", "Orphan", 3).with_parent("gone"),
        ]);
        let graph = hierarchy_graph(&b);

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.contains_edge(NodeIndex::new(0), NodeIndex::new(1)));
        assert_eq!(
            unknown_references(&b),
            vec![("orphan".to_string(), vec!["gone".to_string()])]
        );
    }
}
