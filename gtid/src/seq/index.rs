//! Component D: the GTID sequence index, mapping `(uuid, gno)` to the
//! replication backlog offset it was appended at, so a peer's claimed GTID
//! set can be translated to a resume offset (or vice versa) without
//! rescanning the backlog.
//!
//! Grounded on §4.D of the core spec; the `gtidSeq*` call sites in
//! `examples/original_source/xredis/xredis_gtid_rs.c` reference this
//! structure but its definition is not part of the retrieved sources, so the
//! segment layout and free-list discipline below follow the spec's own
//! "Data layout" and "Size/performance" notes directly.

use std::collections::VecDeque;

use tracing::debug;

use crate::gtid_set::GtidSet;
use crate::seq::segment::GtidSegment;

pub struct GtidSeq {
    segments: VecDeque<GtidSegment>,
    free: Vec<GtidSegment>,
    segment_capacity: usize,
    max_free_segments: usize,
}

impl GtidSeq {
    pub fn new(segment_capacity: usize, max_free_segments: usize) -> Self {
        GtidSeq { segments: VecDeque::new(), free: Vec::new(), segment_capacity, max_free_segments }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Maps `(uuid, gno)` to `offset`, extending the last segment in place
    /// when possible, otherwise opening a new one (recycled from the free
    /// list when available).
    pub fn append(&mut self, uuid: &str, gno: i64, offset: u64) {
        if let Some(last) = self.segments.back_mut() {
            if last.try_extend(uuid, gno, offset) {
                debug!(uuid, gno, offset, "sequence entry appended to open segment");
                return;
            }
        }
        let seg = match self.free.pop() {
            Some(mut reused) => {
                reused.reset(uuid, gno, offset);
                reused
            }
            None => GtidSegment::new(uuid, gno, offset, self.segment_capacity),
        };
        self.segments.push_back(seg);
        debug!(uuid, gno, offset, segment_count = self.segments.len(), "sequence entry opened new segment");
    }

    /// Drops fully-stale segments to the free list and advances the
    /// boundary segment's trim cursor past any remaining stale entries.
    pub fn trim(&mut self, cutoff_offset: u64) {
        let mut dropped = 0usize;
        while let Some(front) = self.segments.front() {
            if front.max_offset() < cutoff_offset {
                let seg = self.segments.pop_front().unwrap();
                dropped += 1;
                if self.free.len() < self.max_free_segments {
                    self.free.push(seg);
                }
            } else {
                break;
            }
        }
        if let Some(front) = self.segments.front_mut() {
            front.trim_to(cutoff_offset);
        }
        debug!(cutoff_offset, dropped, segment_count = self.segments.len(), "sequence index trimmed");
    }

    pub fn earliest_offset(&self) -> Option<u64> {
        self.segments.front().map(GtidSegment::min_offset)
    }

    /// For each `(uuid, gno)` mapped that `peer` does not already have,
    /// returns its offset and accumulates it into a continuation set.
    /// Returns `(-1, empty)` if the peer already has everything the index
    /// knows about.
    ///
    /// Walks segments from newest to oldest, so the continuation set's uuid
    /// order reflects recency rather than insertion order of the index
    /// itself. A uuid entirely absent from a non-empty `peer` is treated as
    /// not of interest to it and skipped; an empty `peer` is interested in
    /// everything.
    pub fn xsync(&self, peer: &GtidSet) -> (i64, GtidSet) {
        let mut continue_set = GtidSet::new();
        let mut continue_offset: Option<u64> = None;
        let peer_is_empty = peer.is_empty();

        for seg in self.segments.iter().rev() {
            if !peer_is_empty && peer.find(seg.uuid()).is_none() {
                continue;
            }
            for (gno, offset) in seg.entries() {
                if !peer.contains(seg.uuid(), gno) {
                    continue_set.add(seg.uuid(), gno, gno);
                    continue_offset = Some(continue_offset.map_or(offset, |cur| cur.min(offset)));
                }
            }
        }

        match continue_offset {
            Some(off) => (off as i64, continue_set),
            None => (-1, GtidSet::new()),
        }
    }

    /// Every `(uuid, gno)` mapped to an offset `>= offset`.
    pub fn psync(&self, offset: u64) -> GtidSet {
        let mut out = GtidSet::new();
        for seg in &self.segments {
            for (gno, off) in seg.entries() {
                if off >= offset {
                    out.add(seg.uuid(), gno, gno);
                }
            }
        }
        out
    }
}
