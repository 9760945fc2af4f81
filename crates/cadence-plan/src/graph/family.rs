//! Family groups: items connected through dependencies or parent links.
//!
//! A family is the closure of an item over `{dependencies, children,
//! parent}` with every edge treated as undirected. Members of one family
//! should ideally be scheduled together; the reporter counts families that
//! end up split across iterations.

use petgraph::unionfind::UnionFind;

use super::backlog::Backlog;

/// Partition of a backlog into families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Families {
    /// Family number per backlog index, numbered by first appearance.
    labels: Vec<usize>,
    count: usize,
}

impl Families {
    /// Compute families for `backlog`.
    ///
    /// Parent links are taken as written (cyclic ones included); dependency
    /// ids outside the batch are ignored.
    #[must_use]
    pub fn from_backlog(backlog: &Backlog) -> Self {
        let mut sets: UnionFind<usize> = UnionFind::new(backlog.len());

        for (idx, scored) in backlog.items().iter().enumerate() {
            if let Some(parent) = backlog.raw_parent(idx) {
                sets.union(idx, parent);
            }
            for dep in &scored.item.dependencies {
                if let Some(dep_idx) = backlog.index_of(dep) {
                    sets.union(idx, dep_idx);
                }
            }
        }

        let mut labels = vec![usize::MAX; backlog.len()];
        let mut by_root: Vec<Option<usize>> = vec![None; backlog.len()];
        let mut count = 0;
        for (idx, label) in labels.iter_mut().enumerate() {
            let root = sets.find_mut(idx);
            *label = *by_root[root].get_or_insert_with(|| {
                count += 1;
                count - 1
            });
        }

        Self { labels, count }
    }

    /// Number of families (singletons included).
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Family number of backlog item `idx`.
    #[must_use]
    pub fn family_of(&self, idx: usize) -> usize {
        self.labels[idx]
    }

    /// Backlog indices of every member of `family`, in input order.
    #[must_use]
    pub fn members(&self, family: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(idx, &label)| (label == family).then_some(idx))
            .collect()
    }

    /// Families with more than one member, as lists of item ids.
    #[must_use]
    pub fn groups(&self, backlog: &Backlog) -> Vec<Vec<String>> {
        (0..self.count)
            .map(|family| self.members(family))
            .filter(|members| members.len() > 1)
            .map(|members| {
                members
                    .into_iter()
                    .map(|idx| backlog.get(idx).id().to_string())
                    .collect()
            })
            .collect()
    }
}
