//! Dependency-aware packing: parents travel with their children.
//!
//! Per iteration:
//!
//! 1. Children left over from a partially scheduled parent are drained
//!    first, in queue order, as far as capacity allows.
//! 2. Only once that queue is empty is the next parent group started. A
//!    group that fits whole is placed atomically and the next group is
//!    tried. Otherwise the parent is placed (if it fits) followed by as many
//!    of its descendants as fit; the rest join the queue and the iteration
//!    closes.
//! 3. If nothing was placed, the smallest eligible item is forced in alone.
//!
//! An item is only ever placed once its effective parent has been placed,
//! so no child lands in an earlier iteration than its parent.

use std::collections::VecDeque;

use tracing::debug;

use super::{Bin, MAX_ITERATIONS};
use crate::graph::Backlog;

struct Packer<'a> {
    backlog: &'a Backlog,
    capacity: u32,
    roots: Vec<usize>,
    cursor: usize,
    leftovers: VecDeque<usize>,
    placed: Vec<bool>,
    placed_count: usize,
}

impl<'a> Packer<'a> {
    fn new(backlog: &'a Backlog, capacity: u32) -> Self {
        Self {
            backlog,
            capacity,
            roots: backlog.roots(),
            cursor: 0,
            leftovers: VecDeque::new(),
            placed: vec![false; backlog.len()],
            placed_count: 0,
        }
    }

    fn done(&self) -> bool {
        self.placed_count == self.backlog.len()
    }

    fn ready(&self, idx: usize) -> bool {
        self.backlog.parent(idx).is_none_or(|p| self.placed[p])
    }

    fn place(&mut self, bin: &mut Bin, idx: usize) {
        bin.place(idx, self.backlog.points(idx));
        self.placed[idx] = true;
        self.placed_count += 1;
    }

    /// Unplaced members of the group rooted at `root`, parent first.
    fn group(&self, root: usize) -> Vec<usize> {
        std::iter::once(root)
            .chain(self.backlog.descendants(root))
            .filter(|&idx| !self.placed[idx])
            .collect()
    }

    fn drain_leftovers(&mut self, bin: &mut Bin) {
        let mut kept = VecDeque::with_capacity(self.leftovers.len());
        while let Some(idx) = self.leftovers.pop_front() {
            if self.ready(idx) && bin.fits(self.backlog.points(idx)) {
                self.place(bin, idx);
            } else {
                kept.push_back(idx);
            }
        }
        self.leftovers = kept;
    }

    fn fill_from_groups(&mut self, bin: &mut Bin) {
        while let Some(&root) = self.roots.get(self.cursor) {
            if self.placed[root] {
                self.cursor += 1;
                continue;
            }

            let group = self.group(root);
            // A total beyond `u32` never fits.
            let group_points = group
                .iter()
                .try_fold(0u32, |acc, &idx| acc.checked_add(self.backlog.points(idx)));
            if group_points.is_some_and(|points| bin.fits(points)) {
                for idx in group {
                    self.place(bin, idx);
                }
                self.cursor += 1;
                continue;
            }

            if bin.fits(self.backlog.points(root)) {
                self.place(bin, root);
                self.cursor += 1;
                for idx in group.into_iter().skip(1) {
                    if self.ready(idx) && bin.fits(self.backlog.points(idx)) {
                        self.place(bin, idx);
                    } else {
                        self.leftovers.push_back(idx);
                    }
                }
            }
            break;
        }
    }

    /// Place the smallest eligible item alone.
    ///
    /// Eligible means ready leftovers while the queue is non-empty,
    /// otherwise any unplaced root.
    fn force_smallest(&mut self, bin: &mut Bin) {
        let candidate = if self.leftovers.is_empty() {
            self.roots
                .iter()
                .copied()
                .filter(|&idx| !self.placed[idx])
                .min_by_key(|&idx| self.backlog.points(idx))
        } else {
            self.leftovers
                .iter()
                .copied()
                .filter(|&idx| self.ready(idx))
                .min_by_key(|&idx| self.backlog.points(idx))
        };
        let Some(idx) = candidate else { return };

        self.leftovers.retain(|&queued| queued != idx);
        self.place(bin, idx);
        bin.forced = Some(idx);

        if self.backlog.parent(idx).is_none() {
            // A forced parent's children queue up like any partial group.
            let rest: Vec<usize> = self.group(idx);
            self.leftovers.extend(rest);
        }
    }

    fn next_bin(&mut self) -> Bin {
        let mut bin = Bin::new(self.capacity);

        self.drain_leftovers(&mut bin);
        if self.leftovers.is_empty() {
            self.fill_from_groups(&mut bin);
        }
        if bin.is_empty() {
            self.force_smallest(&mut bin);
        }

        bin
    }

    fn unscheduled(&self) -> Vec<usize> {
        self.backlog
            .schedule_order()
            .into_iter()
            .filter(|&idx| !self.placed[idx])
            .collect()
    }
}

/// Pack parent groups, draining leftover children first each iteration.
///
/// Returns the iterations and the items left after the cap, in schedule
/// order.
#[must_use]
pub fn pack(backlog: &Backlog, capacity: u32) -> (Vec<Bin>, Vec<usize>) {
    let mut packer = Packer::new(backlog, capacity);
    let mut iterations: Vec<Bin> = Vec::new();

    while !packer.done() && iterations.len() < MAX_ITERATIONS {
        let bin = packer.next_bin();
        if bin.is_empty() {
            // Unreachable with a consistent arena; bail out rather than spin.
            break;
        }
        debug!(
            sequence = iterations.len() + 1,
            items = bin.items.len(),
            points = bin.points,
            queued = packer.leftovers.len(),
            "iteration packed"
        );
        iterations.push(bin);
    }

    let unscheduled = packer.unscheduled();
    (iterations, unscheduled)
}
