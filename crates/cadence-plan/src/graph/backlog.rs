//! Id-addressed arena of scored work items.
//!
//! Items are stored once, in input order, and addressed by their position.
//! Parent/child relations are never stored as two independently mutable
//! fields: `children` is always derived from the effective parent of every
//! item in a single pass ([`Backlog::detach_parents`] re-derives it).

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet, VecDeque};

use cadence_core::model::WorkItem;

use crate::score::{ItemScore, PriorityScorer, backlog_order, schedule_order};

/// A work item together with its computed scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub item: WorkItem,
    pub score: ItemScore,
    /// Position in the caller's input; final tie-break for every ordering.
    pub position: usize,
}

impl ScoredItem {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.item.id
    }

    #[must_use]
    pub const fn points(&self) -> u32 {
        self.item.points
    }
}

/// Arena of scored items for one allocation run.
#[derive(Debug, Clone)]
pub struct Backlog {
    items: Vec<ScoredItem>,
    index: HashMap<String, usize>,
    raw_parents: Vec<Option<usize>>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl Backlog {
    /// Score `items` and derive parent/child links among them.
    ///
    /// Parent ids that do not name an item of this batch are ignored for
    /// linking; the item is then treated as a root.
    #[must_use]
    pub fn new(items: &[WorkItem], scorer: &PriorityScorer) -> Self {
        let scored: Vec<ScoredItem> = items
            .iter()
            .enumerate()
            .map(|(position, item)| ScoredItem {
                item: item.clone(),
                score: scorer.score(item),
                position,
            })
            .collect();

        let index: HashMap<String, usize> = scored
            .iter()
            .map(|s| (s.item.id.clone(), s.position))
            .collect();

        let raw_parents: Vec<Option<usize>> = scored
            .iter()
            .map(|s| {
                s.item
                    .parent_id
                    .as_deref()
                    .and_then(|pid| index.get(pid).copied())
            })
            .collect();

        let mut backlog = Self {
            items: scored,
            index,
            parents: raw_parents.clone(),
            raw_parents,
            children: Vec::new(),
        };
        backlog.derive_children();
        backlog
    }

    /// Drop the parent link of every item in `detached` and re-derive
    /// children. Used to break parent cycles before scheduling.
    pub fn detach_parents(&mut self, detached: &HashSet<usize>) {
        for &idx in detached {
            if let Some(slot) = self.parents.get_mut(idx) {
                *slot = None;
            }
        }
        self.derive_children();
    }

    fn derive_children(&mut self) {
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.items.len()];
        for (idx, parent) in self.parents.iter().enumerate() {
            if let Some(p) = parent {
                children[*p].push(idx);
            }
        }
        for list in &mut children {
            list.sort_by(|&a, &b| self.compare_schedule(a, b));
        }
        self.children = children;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[ScoredItem] {
        &self.items
    }

    /// # Panics
    ///
    /// Panics if `idx` is out of bounds; indices come from this arena.
    #[must_use]
    pub fn get(&self, idx: usize) -> &ScoredItem {
        &self.items[idx]
    }

    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn points(&self, idx: usize) -> u32 {
        self.items[idx].points()
    }

    /// Effective parent used for scheduling (in batch, not part of a cycle).
    #[must_use]
    pub fn parent(&self, idx: usize) -> Option<usize> {
        self.parents[idx]
    }

    /// Parent as written on the item, when it names an item of this batch.
    #[must_use]
    pub fn raw_parent(&self, idx: usize) -> Option<usize> {
        self.raw_parents[idx]
    }

    /// Derived children, in scheduling order.
    #[must_use]
    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    #[must_use]
    pub fn child_ids(&self, idx: usize) -> Vec<&str> {
        self.children[idx]
            .iter()
            .map(|&c| self.items[c].id())
            .collect()
    }

    /// `true` when any item names another item of this batch as its parent.
    #[must_use]
    pub fn has_hierarchy(&self) -> bool {
        self.raw_parents.iter().any(Option::is_some)
    }

    /// Items without an effective parent, in scheduling order.
    #[must_use]
    pub fn roots(&self) -> Vec<usize> {
        let mut roots: Vec<usize> = (0..self.items.len())
            .filter(|&idx| self.parents[idx].is_none())
            .collect();
        roots.sort_by(|&a, &b| self.compare_schedule(a, b));
        roots
    }

    /// All descendants of `idx`, breadth-first, each level in scheduling
    /// order. Parents always precede their own children in the result.
    #[must_use]
    pub fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut seen: HashSet<usize> = HashSet::from([idx]);
        let mut queue: VecDeque<usize> = self.children[idx].iter().copied().collect();

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            queue.extend(self.children[next].iter().copied());
        }

        out
    }

    /// Every item index sorted by tier desc, priority score desc.
    #[must_use]
    pub fn schedule_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_by(|&a, &b| self.compare_schedule(a, b));
        order
    }

    /// Every item index sorted by priority score desc, dependency score asc.
    #[must_use]
    pub fn backlog_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_by(|&a, &b| {
            backlog_order(&self.items[a].score, &self.items[b].score).then_with(|| a.cmp(&b))
        });
        order
    }

    fn compare_schedule(&self, a: usize, b: usize) -> std::cmp::Ordering {
        schedule_order(&self.items[a].score, &self.items[b].score).then_with(|| a.cmp(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backlog(items: &[WorkItem]) -> Backlog {
        Backlog::new(items, &PriorityScorer::default())
    }

    fn ids(backlog: &Backlog, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .map(|&i| backlog.get(i).id().to_string())
            .collect()
    }

    #[test]
    fn children_are_derived_from_parent_ids() {
        let b = backlog(&[
            WorkItem::new("epic", "Epic", 5),
            WorkItem::new("s1", "Story 1", 3).with_parent("epic"),
            WorkItem::new("s2", "Story 2", 3)
                .with_parent("epic")
                .with_scores(5, 5, 1, 1),
        ]);

        let epic = b.index_of("epic").expect("epic");
        // s2 scores higher, so it comes first.
        assert_eq!(b.child_ids(epic), vec!["s2", "s1"]);
        assert!(b.has_hierarchy());
        assert_eq!(ids(&b, &b.roots()), vec!["epic"]);
    }

    #[test]
    fn unknown_parent_makes_item_a_root() {
        let b = backlog(&[WorkItem::new("s1", "Story", 3).with_parent("elsewhere")]);
        assert_eq!(b.parent(0), None);
        assert!(!b.has_hierarchy());
        assert_eq!(b.roots(), vec![0]);
    }

    #[test]
    fn detaching_parents_rederives_children() {
        let mut b = backlog(&[
            WorkItem::new("a", "A", 1).with_parent("b"),
            WorkItem::new("b", "B", 1).with_parent("a"),
        ]);
        assert_eq!(b.children(0), &[1]);

        b.detach_parents(&HashSet::from([0, 1]));
        assert!(b.children(0).is_empty());
        assert!(b.children(1).is_empty());
        assert_eq!(b.raw_parent(0), Some(1));
        assert_eq!(b.roots().len(), 2);
    }

    #[test]
    fn descendants_are_breadth_first() {
        let b = backlog(&[
            WorkItem::new("root", "Root", 1),
            WorkItem::new("c1", "C1", 1).with_parent("root"),
            WorkItem::new("g1", "G1", 1).with_parent("c1"),
            WorkItem::new("c2", "C2", 1).with_parent("root"),
        ]);
        assert_eq!(ids(&b, &b.descendants(0)), vec!["c1", "c2", "g1"]);
    }

    #[test]
    fn schedule_order_is_stable_for_equal_scores() {
        let b = backlog(&[
            WorkItem::new("a", "A", 8),
            WorkItem::new("b", "B", 5),
            WorkItem::new("c", "C", 3),
        ]);
        assert_eq!(b.schedule_order(), vec![0, 1, 2]);
    }
}
