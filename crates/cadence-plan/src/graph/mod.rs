//! Backlog arena and dependency graph analysis.
//!
//! # Overview
//!
//! ```text
//! WorkItem[]
//!        ↓  backlog::Backlog::new()      (scores + derived children)
//! Backlog
//!        ↓  build::DependencyGraph / build::hierarchy_graph
//! dependency graph (dependency → dependent), hierarchy graph (parent → child)
//!        ↓  cycles::find_cycles
//! CycleReport[]  (non-fatal; parent cycles are detached from the arena)
//!        ↓  family::Families
//! family groups for co-scheduling analysis
//! ```

pub mod backlog;
pub mod build;
pub mod cycles;
pub mod family;

use tracing::{instrument, warn};

use cadence_core::model::WorkItem;

use crate::diagnostics::{CycleVia, Diagnostic};
use crate::score::PriorityScorer;

pub use backlog::{Backlog, ScoredItem};
pub use build::{DependencyGraph, DependencyNode, ItemGraph, hierarchy_graph, unknown_references};
pub use cycles::{CycleReport, cyclic_nodes, find_cycles};
pub use family::Families;

/// Everything the allocator and reporter need to know about item relations.
#[derive(Debug, Clone)]
pub struct GraphAnalysis {
    pub backlog: Backlog,
    pub dependencies: DependencyGraph,
    pub families: Families,
    /// Cycle and unknown-reference diagnostics, in that order.
    pub diagnostics: Vec<Diagnostic>,
}

impl GraphAnalysis {
    /// Score `items`, build both graphs and report cycles.
    ///
    /// Items whose parent links form a cycle lose their parent for
    /// scheduling purposes, so every remaining parent chain ends in a root.
    #[must_use]
    #[instrument(skip(items, scorer), fields(items = items.len()))]
    pub fn analyze(items: &[WorkItem], scorer: &PriorityScorer) -> Self {
        let mut backlog = Backlog::new(items, scorer);
        let mut diagnostics = Vec::new();

        let dependencies = DependencyGraph::from_backlog(&backlog);
        for report in find_cycles(&dependencies.graph) {
            warn!(members = ?report.members, "dependency cycle detected");
            diagnostics.push(Diagnostic::cycle(CycleVia::Dependencies, report));
        }

        let hierarchy = hierarchy_graph(&backlog);
        let parent_cycles = find_cycles(&hierarchy);
        if !parent_cycles.is_empty() {
            backlog.detach_parents(&cyclic_nodes(&hierarchy));
        }
        for report in parent_cycles {
            warn!(members = ?report.members, "parent cycle detected, links ignored for scheduling");
            diagnostics.push(Diagnostic::cycle(CycleVia::Parent, report));
        }

        for (item_id, missing) in unknown_references(&backlog) {
            diagnostics.push(Diagnostic::UnknownReference { item_id, missing });
        }

        let families = Families::from_backlog(&backlog);

        Self {
            backlog,
            dependencies,
            families,
            diagnostics,
        }
    }
}
