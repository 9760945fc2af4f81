//! Greedy bin-packing of a scored backlog into capacity-bounded iterations.
//!
//! Two strategies share the same output shape:
//!
//! - [`simple`]: one priority-ordered pass per iteration, adding anything
//!   that still fits.
//! - [`grouped`]: parents are scheduled with their children, and children
//!   that did not fit are drained first in the next iteration.
//!
//! Both force a single item into an otherwise empty iteration so that an
//! item larger than the whole capacity cannot stall the run, and both stop
//! after [`MAX_ITERATIONS`].

pub mod grouped;
pub mod simple;

use std::fmt;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::diagnostics::Diagnostic;
use crate::graph::Backlog;

/// Safety cap on the number of iterations a single run may produce.
pub const MAX_ITERATIONS: usize = 20;

/// Which packing strategy ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Simple,
    DependencyAware,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => f.write_str("simple"),
            Self::DependencyAware => f.write_str("dependency-aware"),
        }
    }
}

/// The selected strategy and why it was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyReport {
    pub strategy: Strategy,
    pub reason: String,
}

impl StrategyReport {
    /// Pick the strategy for `backlog`.
    ///
    /// Dependency-aware packing is used as soon as one item names another
    /// item of the batch as its parent.
    #[must_use]
    pub fn select(backlog: &Backlog) -> Self {
        let linked = (0..backlog.len())
            .filter(|&idx| backlog.raw_parent(idx).is_some())
            .count();

        if linked == 0 {
            Self {
                strategy: Strategy::Simple,
                reason: "no parent/child links in the backlog".to_string(),
            }
        } else {
            Self {
                strategy: Strategy::DependencyAware,
                reason: format!("{linked} item(s) have a parent in the backlog"),
            }
        }
    }

    #[must_use]
    pub const fn is_dependency_aware(&self) -> bool {
        matches!(self.strategy, Strategy::DependencyAware)
    }

    /// Short one-line description suitable for CLI output.
    #[must_use]
    pub fn explain(&self) -> String {
        format!("{} strategy: {}", self.strategy, self.reason)
    }
}

/// One packed iteration, as backlog indices in placement order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bin {
    pub items: Vec<usize>,
    pub points: u32,
    capacity: u32,
    /// The item placed by the forced-progress rule, if any.
    pub forced: Option<usize>,
}

impl Bin {
    #[must_use]
    pub const fn new(capacity: u32) -> Self {
        Self {
            items: Vec::new(),
            points: 0,
            capacity,
            forced: None,
        }
    }

    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.points)
    }

    #[must_use]
    pub const fn fits(&self, points: u32) -> bool {
        points <= self.remaining()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn is_over_capacity(&self) -> bool {
        self.points > self.capacity
    }

    pub(crate) fn place(&mut self, idx: usize, points: u32) {
        self.items.push(idx);
        self.points = self.points.saturating_add(points);
    }

    pub(crate) fn force(&mut self, idx: usize, points: u32) {
        self.place(idx, points);
        self.forced = Some(idx);
    }
}

/// Result of packing a backlog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub strategy: StrategyReport,
    pub iterations: Vec<Bin>,
    /// Items still unplaced when the iteration cap was hit, in schedule order.
    pub unscheduled: Vec<usize>,
    /// Overflow and cap diagnostics, in iteration order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Pack `backlog` into iterations of `capacity` points each.
#[must_use]
#[instrument(skip(backlog), fields(items = backlog.len()))]
pub fn allocate(backlog: &Backlog, capacity: u32) -> Allocation {
    let strategy = StrategyReport::select(backlog);
    info!(strategy = %strategy.strategy, "packing backlog");

    let (iterations, unscheduled) = if strategy.is_dependency_aware() {
        grouped::pack(backlog, capacity)
    } else {
        simple::pack(backlog, capacity)
    };

    let mut diagnostics = Vec::new();
    for (seq, bin) in (1u32..).zip(&iterations) {
        let Some(idx) = bin.forced else { continue };
        let points = backlog.points(idx);
        if points > capacity {
            warn!(
                sequence = seq,
                item = backlog.get(idx).id(),
                points,
                capacity,
                "item exceeds iteration capacity, scheduled alone"
            );
            diagnostics.push(Diagnostic::CapacityExceeded {
                sequence: seq,
                item_id: backlog.get(idx).id().to_string(),
                points,
                capacity,
            });
        }
    }

    if !unscheduled.is_empty() {
        warn!(
            limit = MAX_ITERATIONS,
            unscheduled = unscheduled.len(),
            "iteration cap reached"
        );
        diagnostics.push(Diagnostic::IterationCap {
            limit: MAX_ITERATIONS,
            unscheduled: unscheduled
                .iter()
                .map(|&idx| backlog.get(idx).id().to_string())
                .collect(),
        });
    }

    Allocation {
        strategy,
        iterations,
        unscheduled,
        diagnostics,
    }
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
    fn bin_tracks_room() {
        let mut bin = Bin::new(10);
        assert!(bin.fits(10));
        bin.place(0, 8);
        assert_eq!(bin.remaining(), 2);
        assert!(!bin.fits(3));
        assert!(bin.fits(0));
        assert!(!bin.is_over_capacity());
    }

    #[test]
    fn strategy_follows_parent_links() {
        let flat = backlog(&[WorkItem::new("a", "A", 1).with_parent("outside")]);
        assert_eq!(StrategyReport::select(&flat).strategy, Strategy::Simple);

        let nested = backlog(&[
            WorkItem::new("a", "A", 1),
            WorkItem::new("b", "B", 1).with_parent("a"),
        ]);
        let report = StrategyReport::select(&nested);
        assert!(report.is_dependency_aware());
        assert_eq!(
            report.explain(),
            "dependency-aware strategy: 1 item(s) have a parent in the backlog"
        );
    }

    #[test]
    fn oversized_item_yields_capacity_diagnostic() {
        let b = backlog(&[WorkItem::new("big", "Big", 50)]);
        let allocation = allocate(&b, 10);

        assert_eq!(allocation.iterations.len(), 1);
        assert!(allocation.iterations[0].is_over_capacity());
        assert_eq!(
            allocation.diagnostics,
            vec![Diagnostic::CapacityExceeded {
                sequence: 1,
                item_id: "big".to_string(),
                points: 50,
                capacity: 10,
            }]
        );
    }

    #[test]
    fn cap_breach_lists_unscheduled_items() {
        let items: Vec<WorkItem> = (0..25)
            .map(|i| WorkItem::new(format!("w{i}"), "Work", 5))
            .collect();
        let allocation = allocate(&backlog(&items), 5);

        assert_eq!(allocation.iterations.len(), MAX_ITERATIONS);
        assert_eq!(allocation.unscheduled.len(), 5);
        assert!(matches!(
            allocation.diagnostics.last(),
            Some(Diagnostic::IterationCap { limit: 20, unscheduled }) if unscheduled.len() == 5
        ));
    }
}
