//! Component C: a GTID set, the union of each replication source's
//! [`UuidSet`], keyed by uuid.
//!
//! Stored as an append-ordered `Vec` rather than a sorted map: §4.C
//! describes `find` as "a linear scan over the linked list (typical
//! cardinality is small: shards × lifetimes)", and the Design Notes call for
//! preserving append order since it's externally observable via `encode`.
//! Grounded on the teacher's `binlog/src/alias/mysql/gtid/gtid_set.rs` for
//! the overall shape and on `gtidSetMerge`/`gtidSetStat` in
//! `examples/original_source/gtid.c` for `merge`/`stats`.

use std::fmt;

use common::err::ReError;

use crate::uuid_set::UuidSet;

/// Summary counters returned by [`GtidSet::stats`], mirrored on the
/// original's `gtidStat` structure. `used_memory` is derived from node count
/// times the size of a one-forward interval node, the cheapest stand-in for
/// the original's `sizeof`-based estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GtidStat {
    pub uuid_count: usize,
    pub gap_count: usize,
    pub gno_count: i64,
    pub used_memory: usize,
}

const NODE_WITH_ONE_FORWARD_SIZE: usize = std::mem::size_of::<i64>() * 2 + std::mem::size_of::<usize>();

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GtidSet {
    uuid_sets: Vec<UuidSet>,
}

impl GtidSet {
    pub fn new() -> Self {
        GtidSet::default()
    }

    pub fn is_empty(&self) -> bool {
        self.uuid_sets.iter().all(UuidSet::is_empty)
    }

    /// Finds the uuid-set for `uuid`, if the set has any contribution from
    /// it.
    pub fn find(&self, uuid: &str) -> Option<&UuidSet> {
        self.uuid_sets.iter().find(|s| s.uuid() == uuid)
    }

    /// Iterates the contributing uuid-sets in append order, skipping empty
    /// ones. Used by callers that need to walk gnos in a stable, bounded
    /// order (e.g. truncating a continuation set to a `maxlen`).
    pub fn uuid_sets(&self) -> impl Iterator<Item = &UuidSet> {
        self.uuid_sets.iter().filter(|s| !s.is_empty())
    }

    fn find_index(&self, uuid: &str) -> Option<usize> {
        self.uuid_sets.iter().position(|s| s.uuid() == uuid)
    }

    /// Finds or appends an empty uuid-set for `uuid`, returning it for the
    /// caller to mutate directly.
    pub fn find_or_append(&mut self, uuid: &str) -> &mut UuidSet {
        if self.find_index(uuid).is_none() {
            self.uuid_sets.push(UuidSet::new(uuid));
        }
        let idx = self.find_index(uuid).unwrap();
        &mut self.uuid_sets[idx]
    }

    /// Appends a freshly constructed uuid-set, replacing any existing
    /// contribution from the same uuid in place (preserving its position).
    pub fn append(&mut self, set: UuidSet) {
        match self.find_index(set.uuid()) {
            Some(idx) => self.uuid_sets[idx] = set,
            None => self.uuid_sets.push(set),
        }
    }

    /// Adds `[start, end]` to `uuid`'s contribution, creating it if absent.
    /// Returns the number of newly covered GNOs.
    pub fn add(&mut self, uuid: &str, start: i64, end: i64) -> i64 {
        self.find_or_append(uuid).add(start, end)
    }

    /// Adds every interval in `ranges` to `uuid`'s contribution in one call.
    pub fn add_range(&mut self, uuid: &str, ranges: &[(i64, i64)]) -> i64 {
        let set = self.find_or_append(uuid);
        ranges.iter().map(|&(s, e)| set.add(s, e)).sum()
    }

    /// Marks `[1, watermark]` covered for `uuid`, creating it if absent.
    pub fn raise(&mut self, uuid: &str, watermark: i64) -> i64 {
        self.find_or_append(uuid).raise(watermark)
    }

    pub fn remove(&mut self, uuid: &str, start: i64, end: i64) -> i64 {
        match self.find_index(uuid) {
            Some(idx) => self.uuid_sets[idx].remove(start, end),
            None => 0,
        }
    }

    pub fn contains(&self, uuid: &str, gno: i64) -> bool {
        self.find(uuid).map(|s| s.contains(gno)).unwrap_or(false)
    }

    /// Unions `other` into `self`, consuming it. Returns the number of newly
    /// covered GNOs across all uuids. Uuids absent from `self` are
    /// append-moved in at the end, in `other`'s order.
    pub fn merge(&mut self, other: GtidSet) -> i64 {
        let mut added = 0;
        for set in other.uuid_sets {
            added += match self.find_index(set.uuid()) {
                Some(idx) => {
                    let existing = std::mem::replace(&mut self.uuid_sets[idx], UuidSet::new(set.uuid()));
                    let mut existing = existing;
                    let n = existing.merge(set);
                    self.uuid_sets[idx] = existing;
                    n
                }
                None => {
                    let n = set.count();
                    self.uuid_sets.push(set);
                    n
                }
            };
        }
        added
    }

    /// GNOs present in `self` but absent from `other`, per uuid, in
    /// `self`'s uuid order.
    pub fn diff(&self, other: &GtidSet) -> GtidSet {
        let mut out = GtidSet::new();
        for set in &self.uuid_sets {
            for (s, e) in set.iter() {
                for gno in s..=e {
                    if !other.contains(set.uuid(), gno) {
                        out.add(set.uuid(), gno, gno);
                    }
                }
            }
        }
        out
    }

    /// True iff `self` and `other` share at least one uuid (regardless of
    /// whether their covered ranges for it overlap).
    pub fn related(&self, other: &GtidSet) -> bool {
        self.uuid_sets
            .iter()
            .filter(|s| !s.is_empty())
            .any(|s| other.find(s.uuid()).map(|o| !o.is_empty()).unwrap_or(false))
    }

    pub fn equal(&self, other: &GtidSet) -> bool {
        let mut a: Vec<_> = self
            .uuid_sets
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| (s.uuid().to_string(), s.iter().collect::<Vec<_>>()))
            .collect();
        let mut b: Vec<_> = other
            .uuid_sets
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| (s.uuid().to_string(), s.iter().collect::<Vec<_>>()))
            .collect();
        a.sort();
        b.sort();
        a == b
    }

    pub fn stats(&self) -> GtidStat {
        let mut stat = GtidStat::default();
        let mut node_count = 0usize;
        for set in &self.uuid_sets {
            if set.is_empty() {
                continue;
            }
            let gaps = set.iter().count();
            stat.uuid_count += 1;
            stat.gap_count += gaps;
            stat.gno_count += set.count();
            node_count += gaps;
        }
        stat.used_memory = node_count * NODE_WITH_ONE_FORWARD_SIZE;
        stat
    }

    pub fn encode(&self) -> String {
        let mut buf = String::new();
        let mut first = true;
        for set in &self.uuid_sets {
            if set.is_empty() {
                continue;
            }
            if !first {
                buf.push(',');
            }
            first = false;
            set.encode(&mut buf);
        }
        buf
    }

    /// Parses the comma-separated `uuid:interval:interval,uuid:interval`
    /// grammar.
    pub fn decode(s: &str) -> Result<GtidSet, ReError> {
        let mut out = GtidSet::new();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(out);
        }
        for part in trimmed.split(',') {
            out.append(UuidSet::decode(part)?);
        }
        Ok(out)
    }
}

impl fmt::Display for GtidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
