//! Interval skip list: a compact, logarithmic-access representation of a set
//! of 64-bit GNOs, stored as merged, non-adjacent closed intervals.
//!
//! The original C implementation (`examples/original_source/gtid.c`) links
//! nodes with raw forward pointers inside the node struct itself. Translated
//! to safe Rust this becomes an arena (`Vec<Option<Node>>`) addressed by
//! index, with a free list for reuse, per the "Design Notes" in the core
//! spec. Search/splice logic follows the probabilistic skip-list discipline
//! described there (`p = 1/4`, `MAXLEVEL = 32`) rather than the original's
//! pointer game, which contains bugs unrelated to the documented ones (e.g.
//! its multi-node-merge free loop frees the surviving node instead of the
//! one being removed) that would violate the invariants this type must hold.

use rand::Rng;
use tracing::trace;

/// GNO 0 is reserved as "none"; sequence numbers start at 1.
pub const GNO_INITIAL: i64 = 1;

const MAXLEVEL: usize = 32;
const P: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    start: i64,
    end: i64,
    forwards: Vec<Option<usize>>,
}

impl Node {
    fn count(&self) -> i64 {
        self.end - self.start + 1
    }
}

/// A set of GNOs represented as merged, non-overlapping, non-adjacent
/// closed intervals, with logarithmic add/remove/contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalSkipList {
    arena: Vec<Option<Node>>,
    free: Vec<usize>,
    header: Vec<Option<usize>>,
    level: usize,
    tail: Option<usize>,
    node_count: usize,
    gno_count: i64,
}

impl Default for IntervalSkipList {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalSkipList {
    pub fn new() -> Self {
        IntervalSkipList {
            arena: Vec::new(),
            free: Vec::new(),
            header: vec![None; MAXLEVEL],
            level: 1,
            tail: None,
            node_count: 1, // header sentinel counts per spec's node_count definition
            gno_count: 0,
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn gno_count(&self) -> i64 {
        self.gno_count
    }

    pub fn is_empty(&self) -> bool {
        self.tail.is_none()
    }

    fn node(&self, idx: usize) -> &Node {
        self.arena[idx].as_ref().expect("dangling interval node index")
    }

    fn forward(&self, from: Option<usize>, level: usize) -> Option<usize> {
        match from {
            None => self.header.get(level).copied().flatten(),
            Some(idx) => self.arena[idx]
                .as_ref()
                .and_then(|n| n.forwards.get(level).copied().flatten()),
        }
    }

    fn set_forward(&mut self, from: Option<usize>, level: usize, to: Option<usize>) {
        match from {
            None => self.header[level] = to,
            Some(idx) => {
                let node = self.arena[idx].as_mut().expect("dangling interval node index");
                node.forwards[level] = to;
            }
        }
    }

    fn alloc_node(&mut self, start: i64, end: i64, level: usize) -> usize {
        let node = Node { start, end, forwards: vec![None; level] };
        if let Some(idx) = self.free.pop() {
            self.arena[idx] = Some(node);
            idx
        } else {
            self.arena.push(Some(node));
            self.arena.len() - 1
        }
    }

    fn set_bounds(&mut self, idx: usize, start: i64, end: i64) {
        let node = self.arena[idx].as_mut().expect("dangling interval node index");
        node.start = start;
        node.end = end;
    }

    fn random_level(&self) -> usize {
        let mut level = 1;
        let mut rng = rand::thread_rng();
        while rng.gen::<f64>() < P && level < MAXLEVEL {
            level += 1;
        }
        level
    }

    /// Removes `idx` from every level it participates in and frees its
    /// slot. Returns the level-0 predecessor (`None` means header), which
    /// callers use to keep `tail` correct when the removed node was last.
    fn unlink(&mut self, idx: usize) -> Option<usize> {
        let idx_start = self.node(idx).start;
        let idx_level = self.node(idx).forwards.len();
        let mut x: Option<usize> = None;
        let mut pred0 = None;
        for i in (0..self.level).rev() {
            loop {
                match self.forward(x, i) {
                    Some(ni) if ni != idx && self.node(ni).start < idx_start => x = Some(ni),
                    _ => break,
                }
            }
            if i == 0 {
                pred0 = x;
            }
            if i < idx_level && self.forward(x, i) == Some(idx) {
                let after = self.forward(Some(idx), i);
                self.set_forward(x, i, after);
            }
        }
        if self.tail == Some(idx) {
            self.tail = pred0;
        }
        self.arena[idx] = None;
        self.free.push(idx);
        while self.level > 1 && self.header[self.level - 1].is_none() {
            self.level -= 1;
        }
        pred0
    }

    /// Adds `[start, end]`, coalescing with any overlapping or adjacent
    /// intervals. Returns the number of GNOs newly covered (0 if the range
    /// was already fully covered).
    pub fn add(&mut self, start: i64, end: i64) -> i64 {
        assert!(start <= end, "add: start ({start}) must be <= end ({end})");

        let mut lefts: Vec<Option<usize>> = vec![None; self.level];
        let mut rights: Vec<Option<usize>> = vec![None; self.level];

        let mut x: Option<usize> = None;
        for i in (0..self.level).rev() {
            loop {
                match self.forward(x, i) {
                    Some(ni) if self.node(ni).end + 1 < start => x = Some(ni),
                    _ => break,
                }
            }
            lefts[i] = x;
        }

        x = None;
        for i in (0..self.level).rev() {
            loop {
                match self.forward(x, i) {
                    Some(ni) if self.node(ni).start < end + 1 => x = Some(ni),
                    _ => break,
                }
            }
            rights[i] = x;
        }

        if lefts[0] == rights[0] {
            let level = self.random_level();
            let new_idx = self.alloc_node(start, end, level);
            if level > self.level {
                lefts.resize(level, None);
                for slot in lefts.iter_mut().skip(self.level) {
                    *slot = None;
                }
                self.level = level;
            }
            for i in 0..level {
                let next = self.forward(lefts[i], i);
                self.set_forward(Some(new_idx), i, next);
                self.set_forward(lefts[i], i, Some(new_idx));
            }
            if self.forward(Some(new_idx), 0).is_none() {
                self.tail = Some(new_idx);
            }
            let added = end - start + 1;
            self.gno_count += added;
            self.node_count += 1;
            trace!(start, end, added, node_count = self.node_count, "interval inserted as new node");
            added
        } else {
            let l_idx = self.forward(lefts[0], 0).expect("overlap branch requires a left node");
            let r_idx = rights[0].expect("overlap branch requires a right node");

            let mut mid = Vec::new();
            let mut cur = self.forward(Some(l_idx), 0);
            while let Some(ci) = cur {
                mid.push(ci);
                if ci == r_idx {
                    break;
                }
                cur = self.forward(Some(ci), 0);
            }

            let mut old_covered = self.node(l_idx).count();
            for &m in &mid {
                old_covered += self.node(m).count();
            }

            let new_start = start.min(self.node(l_idx).start);
            let new_end = end.max(self.node(r_idx).end);

            for &m in &mid {
                self.unlink(m);
            }
            self.set_bounds(l_idx, new_start, new_end);
            if self.forward(Some(l_idx), 0).is_none() {
                self.tail = Some(l_idx);
            }

            let new_covered = new_end - new_start + 1;
            let added = new_covered - old_covered;
            self.gno_count += added;
            self.node_count -= mid.len();
            trace!(start, end, added, coalesced = mid.len(), "interval merged into existing node");
            added
        }
    }

    /// Removes `[start, end]`. Returns the number of GNOs actually removed.
    pub fn remove(&mut self, start: i64, end: i64) -> i64 {
        assert!(start <= end, "remove: start ({start}) must be <= end ({end})");

        let mut x: Option<usize> = None;
        for i in (0..self.level).rev() {
            loop {
                match self.forward(x, i) {
                    Some(ni) if self.node(ni).end < start => x = Some(ni),
                    _ => break,
                }
            }
        }

        let mut removed = 0i64;
        let mut cur = self.forward(x, 0);
        while let Some(ci) = cur {
            let (n_start, n_end) = {
                let n = self.node(ci);
                (n.start, n.end)
            };
            if n_start > end {
                break;
            }

            let overlap_start = n_start.max(start);
            let overlap_end = n_end.min(end);
            removed += overlap_end - overlap_start + 1;

            if n_start >= start && n_end <= end {
                // fully contained: delete
                cur = self.forward(Some(ci), 0);
                self.unlink(ci);
            } else if n_start < start && n_end > end {
                // interior cut: shrink to left fragment, insert right fragment
                self.set_bounds(ci, n_start, start - 1);
                self.insert_after(ci, end + 1, n_end);
                break;
            } else if n_start < start {
                // left overhang: raise start
                self.set_bounds(ci, n_start, start - 1);
                break;
            } else {
                // right overhang: lower end
                self.set_bounds(ci, end + 1, n_end);
                break;
            }
        }

        self.gno_count -= removed;
        trace!(start, end, removed, "interval range removed");
        removed
    }

    /// Inserts a brand-new interval directly after node `after_idx` (used by
    /// `remove`'s interior-cut case, where the right fragment is guaranteed
    /// not to touch any other existing interval).
    fn insert_after(&mut self, after_idx: usize, start: i64, end: i64) {
        let level = self.random_level();
        let new_idx = self.alloc_node(start, end, level);

        let mut lefts: Vec<Option<usize>> = vec![Some(after_idx); level.min(self.level)];
        if level > self.level {
            lefts.resize(level, None);
            self.level = level;
        }
        for i in 0..level {
            let next = self.forward(lefts[i], i);
            self.set_forward(Some(new_idx), i, next);
            self.set_forward(lefts[i], i, Some(new_idx));
        }
        if self.forward(Some(new_idx), 0).is_none() {
            self.tail = Some(new_idx);
        }
        self.node_count += 1;
    }

    pub fn contains(&self, gno: i64) -> bool {
        assert!(gno > 0);
        let mut x: Option<usize> = None;
        for i in (0..self.level).rev() {
            loop {
                match self.forward(x, i) {
                    Some(ni) if self.node(ni).start <= gno => x = Some(ni),
                    _ => break,
                }
            }
        }
        match x {
            Some(ni) => {
                let n = self.node(ni);
                n.start <= gno && gno <= n.end
            }
            None => false,
        }
    }

    /// Extends the tail interval by one GNO, or seeds the set with
    /// `[GNO_INITIAL, GNO_INITIAL]` if empty. Returns the newly covered gno.
    pub fn advance(&mut self) -> i64 {
        match self.tail {
            None => {
                self.add(GNO_INITIAL, GNO_INITIAL);
                GNO_INITIAL
            }
            Some(t) => {
                let new_end = self.node(t).end + 1;
                self.set_bounds(t, self.node(t).start, new_end);
                self.gno_count += 1;
                new_end
            }
        }
    }

    /// Returns the smallest gno not present that is >= tail.end + 1 (or
    /// `GNO_INITIAL` if empty). Since the tail is by definition the
    /// rightmost interval, that candidate is never already covered. If
    /// `update`, also adds it via `add(n, n)`.
    pub fn next(&mut self, update: bool) -> i64 {
        let n = match self.tail {
            None => GNO_INITIAL,
            Some(t) => self.node(t).end + 1,
        };
        if update {
            self.add(n, n);
        }
        n
    }

    /// Ascending iteration over the merged intervals.
    pub fn iter(&self) -> IntervalIter<'_> {
        IntervalIter { list: self, cur: self.forward(None, 0) }
    }

    /// Merges `src` into `self`, consuming it, returning the number of
    /// newly covered GNOs.
    pub fn merge(&mut self, src: IntervalSkipList) -> i64 {
        let mut added = 0;
        for (s, e) in src.iter() {
            added += self.add(s, e);
        }
        added
    }
}

pub struct IntervalIter<'a> {
    list: &'a IntervalSkipList,
    cur: Option<usize>,
}

impl<'a> Iterator for IntervalIter<'a> {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cur?;
        let node = self.list.node(idx);
        self.cur = self.list.forward(Some(idx), 0);
        Some((node.start, node.end))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn make(intervals: &[(i64, i64)]) -> IntervalSkipList {
        let mut l = IntervalSkipList::new();
        for &(s, e) in intervals {
            l.add(s, e);
        }
        l
    }

    fn ranges(l: &IntervalSkipList) -> Vec<(i64, i64)> {
        l.iter().collect()
    }

    #[test]
    fn invariants_hold_after_adds() {
        let l = make(&[(2, 3), (7, 9), (11, 12)]);
        assert_eq!(ranges(&l), vec![(2, 3), (7, 9), (11, 12)]);
        assert_eq!(l.gno_count(), 7);
        assert_eq!(l.node_count(), 1 + 3);
    }

    #[test]
    fn coalesce_on_bridge() {
        let mut l = make(&[(2, 3), (7, 9), (11, 12)]);
        let added = l.add(1, 14);
        assert_eq!(added, 7);
        assert_eq!(ranges(&l), vec![(1, 14)]);
        assert_eq!(l.gno_count(), 14);
    }

    #[test]
    fn interior_insert() {
        let mut l = make(&[(1, 2), (7, 8), (10, 11)]);
        let added = l.add(4, 5);
        assert_eq!(added, 2);
        assert_eq!(ranges(&l), vec![(1, 2), (4, 5), (7, 8), (10, 11)]);
    }

    #[test]
    fn idempotent_on_contained_range() {
        let mut l = make(&[(1, 5), (7, 8), (10, 11)]);
        let added = l.add(2, 3);
        assert_eq!(added, 0);
        assert_eq!(ranges(&l), vec![(1, 5), (7, 8), (10, 11)]);
    }

    #[test]
    fn add_is_idempotent_on_second_identical_call() {
        let mut l = IntervalSkipList::new();
        assert_eq!(l.add(5, 9), 5);
        assert_eq!(l.add(5, 9), 0);
    }

    #[test]
    fn contains_boundaries() {
        let mut l = IntervalSkipList::new();
        l.add(5, 9);
        assert!(!l.contains(4));
        assert!(l.contains(5));
        assert!(l.contains(9));
        assert!(!l.contains(10));
    }

    #[test]
    fn remove_bridging_three() {
        let mut l = make(&[(10, 15), (20, 25), (30, 35)]);
        let removed = l.remove(13, 33);
        assert_eq!(removed, 13);
        assert_eq!(ranges(&l), vec![(10, 12), (34, 35)]);
    }

    #[test]
    fn remove_everything_empties_and_returns_former_count() {
        let mut l = make(&[(1, 5), (10, 20)]);
        let total = l.gno_count();
        let removed = l.remove(1, i64::MAX);
        assert_eq!(removed, total);
        assert!(l.is_empty());
        assert_eq!(l.gno_count(), 0);
    }

    #[test]
    fn remove_interior_cut_splits_interval() {
        let mut l = make(&[(1, 10)]);
        let removed = l.remove(4, 6);
        assert_eq!(removed, 3);
        assert_eq!(ranges(&l), vec![(1, 3), (7, 10)]);
    }

    #[test]
    fn advance_seeds_then_extends() {
        let mut l = IntervalSkipList::new();
        assert_eq!(l.advance(), GNO_INITIAL);
        assert_eq!(l.advance(), GNO_INITIAL + 1);
        assert_eq!(ranges(&l), vec![(1, 2)]);
    }

    #[test]
    fn next_and_contains_scenario() {
        let mut l = IntervalSkipList::new();
        assert_eq!(l.next(true), 1);
        l.add(3, 4);
        l.add(10, 11);
        l.add(5, 9);
        assert_eq!(ranges(&l), vec![(1, 1), (3, 12)]);
        assert_eq!(l.next(false), 13);
    }

    #[test]
    fn merge_consumes_src_and_unions() {
        let mut dst = make(&[(1, 2)]);
        let src = make(&[(5, 6), (10, 11)]);
        let added = dst.merge(src);
        assert_eq!(added, 4);
        assert_eq!(ranges(&dst), vec![(1, 2), (5, 6), (10, 11)]);
    }

    #[test]
    fn add_order_does_not_affect_final_shape() {
        let mut a = IntervalSkipList::new();
        for &(s, e) in &[(10, 12), (1, 2), (20, 25), (4, 4)] {
            a.add(s, e);
        }
        let mut b = IntervalSkipList::new();
        for &(s, e) in &[(20, 25), (4, 4), (1, 2), (10, 12)] {
            b.add(s, e);
        }
        assert_eq!(ranges(&a), ranges(&b));
    }
}
