//! `GtidReplState`: a server's replication-facing view of the GTID core —
//! its executed/lost sets, sequence index, and current/previous sync mode —
//! and the handshake logic that turns an incoming `PSYNC`/`XSYNC` request
//! into a wire reply.
//!
//! Grounded on §4.E's "Composing the reply" notes and on
//! `ctrip_createReplicationBacklog`/`locateServerReplMode` in
//! `examples/original_source/xredis/xredis_gtid_rs.c`.

use common::config::GtidConfig;
use gtid::repl_mode::{GtidReplMode, ReplMode};
use gtid::{locate, GtidSet, GtidSeq, Locate};
use tracing::{debug, info};

use crate::backlog::Backlog;
use crate::wire::{Reply, SyncRequest};

pub struct GtidReplState {
    pub master_uuid: String,
    pub replid: String,
    pub gtid_executed: GtidSet,
    /// GNOs known to have been permanently skipped (e.g. by a failover),
    /// overlaid on `gtid_executed` when computing what's truly applied.
    pub gtid_lost: GtidSet,
    pub seq: GtidSeq,
    pub mode: GtidReplMode,
    max_gap: u64,
}

impl GtidReplState {
    pub fn new(master_uuid: impl Into<String>, replid: impl Into<String>, config: &GtidConfig) -> Self {
        GtidReplState {
            master_uuid: master_uuid.into(),
            replid: replid.into(),
            gtid_executed: GtidSet::new(),
            gtid_lost: GtidSet::new(),
            seq: GtidSeq::new(config.segment_capacity, config.max_free_segments),
            mode: GtidReplMode::new(ReplMode::Psync, 0),
            max_gap: config.max_gap,
        }
    }

    /// Records that `(uuid, gno)` was applied at `offset`, keeping the
    /// executed set and sequence index in lockstep (§5 ordering guarantee).
    pub fn record_applied(&mut self, uuid: &str, gno: i64, offset: u64) {
        self.gtid_executed.add(uuid, gno, gno);
        self.seq.append(uuid, gno, offset);
        debug!(uuid, gno, offset, "gtid applied");
    }

    pub fn handle_request(&self, request: &SyncRequest, backlog: &dyn Backlog) -> Reply {
        match request {
            SyncRequest::Psync { offset, .. } => self.handle_psync(*offset, backlog),
            SyncRequest::Xsync { gtid_set, gtid_lost, maxgap, .. } => {
                let peer_set = GtidSet::decode(gtid_set).unwrap_or_default();
                let peer_lost = gtid_lost.as_deref().and_then(|s| GtidSet::decode(s).ok());
                self.handle_xsync(&peer_set, peer_lost.as_ref(), maxgap.unwrap_or(self.max_gap), backlog)
            }
        }
    }

    fn handle_psync(&self, offset: u64, backlog: &dyn Backlog) -> Reply {
        match locate(&self.mode, ReplMode::Psync, offset) {
            Locate::Current { .. } | Locate::Switch { .. } | Locate::Previous { .. } => {
                Reply::Continue { replid: Some(self.replid.clone()), offset: Some(offset) }
            }
            Locate::Invalid { .. } => {
                Reply::FullResync { replid: self.replid.clone(), offset: backlog.tail_offset() }
            }
        }
    }

    fn handle_xsync(
        &self,
        peer_set: &GtidSet,
        peer_lost: Option<&GtidSet>,
        maxgap: u64,
        backlog: &dyn Backlog,
    ) -> Reply {
        let (continue_offset, _missing) = self.seq.xsync(peer_set);

        let (gtid_cont, repl_offset) = if continue_offset < 0 {
            (self.gtid_executed.clone(), self.mode.cur().offset)
        } else {
            let continue_offset = continue_offset as u64;
            let gtid_xsync = self.seq.psync(continue_offset);
            (self.gtid_executed.diff(&gtid_xsync), continue_offset)
        };

        let empty = GtidSet::new();
        let peer_lost = peer_lost.unwrap_or(&empty);
        let delta_lost = peer_set.diff(&gtid_cont);

        let executed_master = self.gtid_executed.diff(&self.gtid_lost);
        let executed_slave = peer_set.diff(peer_lost);
        let gap = executed_master.diff(&executed_slave).stats().gno_count
            + executed_slave.diff(&executed_master).stats().gno_count;

        if gap as u64 > maxgap {
            info!(gap, maxgap, "xsync gap exceeds maxgap, forcing full resync");
            Reply::XFullResync {
                gtid_lost: self.gtid_lost.clone(),
                master_uuid: self.master_uuid.clone(),
                replid: self.replid.clone(),
                repl_offset: backlog.tail_offset(),
            }
        } else {
            Reply::XContinue {
                gtid_set: gtid_cont,
                gtid_lost: if delta_lost.is_empty() { None } else { Some(delta_lost) },
                master_uuid: self.master_uuid.clone(),
                replid: self.replid.clone(),
                repl_offset,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backlog::MemoryBacklog;

    fn state() -> GtidReplState {
        GtidReplState::new("master-uuid", "replid-1", &GtidConfig::default())
    }

    #[test]
    fn psync_outside_backlog_window_gets_fullresync() {
        let s = state();
        let backlog = MemoryBacklog::new(1000);
        let reply = s.handle_psync(5_000_000, &backlog);
        assert!(matches!(reply, Reply::FullResync { .. }));
    }

    #[test]
    fn psync_within_current_mode_gets_continue() {
        let s = state();
        let backlog = MemoryBacklog::new(1000);
        let reply = s.handle_psync(0, &backlog);
        assert!(matches!(reply, Reply::Continue { .. }));
    }

    #[test]
    fn xsync_with_matching_gtids_gets_xcontinue() {
        let mut s = state();
        s.record_applied("master-uuid", 1, 10);
        s.record_applied("master-uuid", 2, 20);

        let mut peer_set = GtidSet::new();
        peer_set.add("master-uuid", 1, 1);

        let backlog = MemoryBacklog::new(1000);
        let reply = s.handle_xsync(&peer_set, None, 128, &backlog);
        assert!(matches!(reply, Reply::XContinue { .. }));
    }

    #[test]
    fn xsync_with_excessive_gap_gets_xfullresync() {
        let mut s = state();
        for g in 1..=200 {
            s.record_applied("master-uuid", g, g as u64 * 10);
        }
        let peer_set = GtidSet::new();
        let backlog = MemoryBacklog::new(1000);
        let reply = s.handle_xsync(&peer_set, None, 10, &backlog);
        assert!(matches!(reply, Reply::XFullResync { .. }));
    }

    #[test]
    fn handle_request_dispatches_by_verb() {
        let s = state();
        let backlog = MemoryBacklog::new(1000);
        let req = SyncRequest::parse("PSYNC replid-1 0").unwrap();
        assert!(matches!(s.handle_request(&req, &backlog), Reply::Continue { .. }));
    }
}
