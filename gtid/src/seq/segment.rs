//! A single append-ordered run of `(uuid, gno, offset)` triples sharing one
//! uuid, stored as deltas off a base offset.
//!
//! Grounded on §4.D of the core spec and sized by
//! [`common::config::GtidConfig::segment_capacity`].

#[derive(Debug, Clone)]
pub struct GtidSegment {
    uuid: String,
    base_gno: i64,
    base_offset: u64,
    /// Number of leading entries trimmed away; entries before `tgno` are no
    /// longer considered part of the segment's live contents.
    tgno: usize,
    deltas: Vec<u64>,
    capacity: usize,
}

impl GtidSegment {
    pub fn new(uuid: impl Into<String>, gno: i64, offset: u64, capacity: usize) -> Self {
        let mut deltas = Vec::with_capacity(capacity);
        deltas.push(0);
        GtidSegment { uuid: uuid.into(), base_gno: gno, base_offset: offset, tgno: 0, deltas, capacity }
    }

    /// Resets an already-allocated segment for reuse, taking a slot off the
    /// free list instead of allocating a fresh `Vec`.
    pub fn reset(&mut self, uuid: &str, gno: i64, offset: u64) {
        self.uuid.clear();
        self.uuid.push_str(uuid);
        self.base_gno = gno;
        self.base_offset = offset;
        self.tgno = 0;
        self.deltas.clear();
        self.deltas.push(0);
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn ngno(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_full(&self) -> bool {
        self.deltas.len() >= self.capacity
    }

    /// Extends the segment with `(gno, offset)` if it is the strict
    /// successor of the segment's last entry and there is room. Returns
    /// `false` (no mutation) otherwise.
    pub fn try_extend(&mut self, uuid: &str, gno: i64, offset: u64) -> bool {
        if self.uuid != uuid || self.is_full() {
            return false;
        }
        if gno != self.base_gno + self.deltas.len() as i64 {
            return false;
        }
        self.deltas.push(offset - self.base_offset);
        true
    }

    pub fn gno_of(&self, idx: usize) -> i64 {
        self.base_gno + idx as i64
    }

    pub fn offset_of(&self, idx: usize) -> u64 {
        self.base_offset + self.deltas[idx]
    }

    pub fn min_offset(&self) -> u64 {
        self.offset_of(self.tgno.min(self.deltas.len() - 1))
    }

    pub fn max_offset(&self) -> u64 {
        self.offset_of(self.deltas.len() - 1)
    }

    /// Advances the trim cursor past every entry mapped below `cutoff`.
    pub fn trim_to(&mut self, cutoff: u64) {
        while self.tgno < self.deltas.len() && self.offset_of(self.tgno) < cutoff {
            self.tgno += 1;
        }
    }

    /// Live (not yet trimmed) `(gno, offset)` entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        (self.tgno..self.deltas.len()).map(move |i| (self.gno_of(i), self.offset_of(i)))
    }

    pub fn is_exhausted(&self) -> bool {
        self.tgno >= self.deltas.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extend_requires_strict_successor() {
        let mut s = GtidSegment::new("a", 1, 100, 4);
        assert!(s.try_extend("a", 2, 105));
        assert!(!s.try_extend("a", 4, 110)); // skips gno 3
        assert!(s.try_extend("a", 3, 108));
    }

    #[test]
    fn extend_rejects_different_uuid() {
        let mut s = GtidSegment::new("a", 1, 100, 4);
        assert!(!s.try_extend("b", 2, 105));
    }

    #[test]
    fn respects_capacity() {
        let mut s = GtidSegment::new("a", 1, 100, 2);
        assert!(s.try_extend("a", 2, 101));
        assert!(s.is_full());
        assert!(!s.try_extend("a", 3, 102));
    }

    #[test]
    fn trim_advances_cursor_and_entries_reflect_it() {
        let mut s = GtidSegment::new("a", 1, 100, 4);
        s.try_extend("a", 2, 110);
        s.try_extend("a", 3, 120);
        s.trim_to(115);
        assert_eq!(s.entries().collect::<Vec<_>>(), vec![(3, 120)]);
    }

    #[test]
    fn reset_reuses_allocation() {
        let mut s = GtidSegment::new("a", 1, 100, 4);
        s.try_extend("a", 2, 110);
        s.reset("b", 50, 9000);
        assert_eq!(s.uuid(), "b");
        assert_eq!(s.ngno(), 1);
        assert_eq!(s.gno_of(0), 50);
    }
}
