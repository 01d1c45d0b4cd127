//! Replication mode bookkeeping: which sync protocol (`psync` byte-offset or
//! `xsync` gtid-based) a link is currently using, and the "current vs.
//! previous" record pair a server keeps so it can answer a follower that
//! hasn't caught up to the latest mode switch.
//!
//! Grounded on the `repl_mode`/`cur_mode`/`prev_mode` fields threaded through
//! `ctrip_createReplicationBacklog` and friends in
//! `examples/original_source/xredis/xredis_gtid_rs.c`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplMode {
    /// Classic byte-offset replication backlog.
    Psync,
    /// GTID-addressed replication backlog.
    Xsync,
}

impl ReplMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplMode::Psync => "psync",
            ReplMode::Xsync => "xsync",
        }
    }
}

/// One mode switch: the mode and the backlog offset at which it took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplModeRecord {
    pub mode: ReplMode,
    pub offset: u64,
}

impl ReplModeRecord {
    pub fn new(mode: ReplMode, offset: u64) -> Self {
        ReplModeRecord { mode, offset }
    }
}

/// A server's current and previous replication mode, letting it classify an
/// incoming sync request against whichever record the requester's offset
/// actually falls under.
#[derive(Debug, Clone)]
pub struct GtidReplMode {
    cur: ReplModeRecord,
    prev: Option<ReplModeRecord>,
}

impl GtidReplMode {
    pub fn new(mode: ReplMode, offset: u64) -> Self {
        GtidReplMode { cur: ReplModeRecord::new(mode, offset), prev: None }
    }

    pub fn cur(&self) -> ReplModeRecord {
        self.cur
    }

    pub fn prev(&self) -> Option<ReplModeRecord> {
        self.prev
    }

    /// Switches the current mode, pushing the old current down to previous.
    /// A no-op (returns `false`) if the new mode is the same as the current
    /// one.
    pub fn shift_mode(&mut self, mode: ReplMode, offset: u64) -> bool {
        if self.cur.mode == mode {
            return false;
        }
        self.prev = Some(self.cur);
        self.cur = ReplModeRecord::new(mode, offset);
        true
    }

    /// Resets both records to a single fresh mode, discarding history; used
    /// when a full resync makes the previous mode's offset window
    /// meaningless.
    pub fn reset_mode(&mut self, mode: ReplMode, offset: u64) {
        self.cur = ReplModeRecord::new(mode, offset);
        self.prev = None;
    }

    /// The mode in effect at `offset`, given the two records kept.
    pub fn mode_at(&self, offset: u64) -> ReplMode {
        match self.prev {
            Some(prev) if offset < self.cur.offset => prev.mode,
            _ => self.cur.mode,
        }
    }
}
