//! Plain greedy packing for backlogs without parent/child links.

use tracing::debug;

use super::{Bin, MAX_ITERATIONS};
use crate::graph::Backlog;

/// Pack in schedule order (tier desc, score desc).
///
/// Each iteration scans the remaining items once and takes every item that
/// still fits. When nothing fits, the smallest remaining item is placed
/// alone. Returns the iterations and the items left after the cap.
#[must_use]
pub fn pack(backlog: &Backlog, capacity: u32) -> (Vec<Bin>, Vec<usize>) {
    let mut remaining = backlog.schedule_order();
    let mut iterations = Vec::new();

    while !remaining.is_empty() && iterations.len() < MAX_ITERATIONS {
        let mut bin = Bin::new(capacity);
        remaining.retain(|&idx| {
            let points = backlog.points(idx);
            if bin.fits(points) {
                bin.place(idx, points);
                false
            } else {
                true
            }
        });

        if bin.is_empty() {
            // Ties go to the earlier item in schedule order.
            let Some((pos, &idx)) = remaining
                .iter()
                .enumerate()
                .min_by_key(|&(_, &idx)| backlog.points(idx))
            else {
                break;
            };
            remaining.remove(pos);
            bin.force(idx, backlog.points(idx));
        }

        debug!(
            sequence = iterations.len() + 1,
            items = bin.items.len(),
            points = bin.points,
            "iteration packed"
        );
        iterations.push(bin);
    }

    (iterations, remaining)
}
