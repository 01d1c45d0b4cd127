//! Component E: the sync locator, deciding how (and whether) an incoming
//! `PSYNC`/`XSYNC` request's offset can be served given the server's current
//! and previous replication mode.
//!
//! Grounded directly on `locateServerReplMode` in
//! `examples/original_source/xredis/xredis_gtid_rs.c`, which this mirrors as
//! a decision table rather than translating its nested-`if` shape literally.

use tracing::warn;

use crate::repl_mode::{GtidReplMode, ReplMode};

/// Outcome of locating a request's offset against the server's mode history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locate {
    /// The request falls entirely within the current mode's window.
    Current { mode: ReplMode },
    /// The request falls exactly on the mode switch boundary, and the
    /// request's own mode matches the *previous* record; answered as a
    /// continuation under the old mode before handing off.
    Switch { mode: ReplMode },
    /// The request falls strictly inside the previous mode's window; only
    /// `limit` bytes/gnos of that window remain servable before the switch.
    Previous { mode: ReplMode, limit: u64 },
    /// The request cannot be served incrementally; the caller should fall
    /// back to a full resync.
    Invalid { reason: String },
}

/// Locates `request_mode` at `offset` against `state`'s current/previous
/// mode records.
pub fn locate(state: &GtidReplMode, request_mode: ReplMode, offset: u64) -> Locate {
    let result = locate_inner(state, request_mode, offset);
    if let Locate::Invalid { reason } = &result {
        warn!(request_mode = request_mode.as_str(), offset, reason, "sync request classified invalid");
    }
    result
}

fn locate_inner(state: &GtidReplMode, request_mode: ReplMode, offset: u64) -> Locate {
    let cur = state.cur();
    let prev = state.prev();

    if offset > cur.offset {
        if request_mode == cur.mode {
            Locate::Current { mode: cur.mode }
        } else {
            Locate::Invalid {
                reason: format!(
                    "request mode({}) != located mode({})",
                    request_mode.as_str(),
                    cur.mode.as_str()
                ),
            }
        }
    } else if offset == cur.offset {
        if request_mode == cur.mode {
            Locate::Current { mode: cur.mode }
        } else {
            match prev {
                None => Locate::Invalid { reason: "prev repl mode not valid".to_string() },
                Some(_) => Locate::Switch { mode: cur.mode },
            }
        }
    } else {
        match prev {
            None => Locate::Invalid {
                reason: format!("psync offset({offset}) < repl_mode.from({})", cur.offset),
            },
            Some(prev) if offset >= prev.offset => {
                debug_assert!(prev.offset < cur.offset);
                if request_mode == prev.mode {
                    Locate::Previous { mode: prev.mode, limit: cur.offset - offset }
                } else {
                    Locate::Invalid {
                        reason: format!(
                            "request mode({}) != located mode({})",
                            request_mode.as_str(),
                            prev.mode.as_str()
                        ),
                    }
                }
            }
            Some(prev) => Locate::Invalid {
                reason: format!("psync offset({offset}) < prev_repl_mode.from({})", prev.offset),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn state() -> GtidReplMode {
        let mut m = GtidReplMode::new(ReplMode::Psync, 0);
        m.shift_mode(ReplMode::Xsync, 1000);
        m
    }

    #[test]
    fn offset_past_cur_in_cur_mode_is_current() {
        let s = state();
        assert_eq!(locate(&s, ReplMode::Xsync, 2000), Locate::Current { mode: ReplMode::Xsync });
    }

    #[test]
    fn offset_past_cur_with_wrong_mode_is_invalid() {
        let s = state();
        assert!(matches!(locate(&s, ReplMode::Psync, 2000), Locate::Invalid { .. }));
    }

    #[test]
    fn offset_at_boundary_switching_modes() {
        let s = state();
        assert_eq!(locate(&s, ReplMode::Psync, 1000), Locate::Switch { mode: ReplMode::Xsync });
        assert_eq!(locate(&s, ReplMode::Xsync, 1000), Locate::Current { mode: ReplMode::Xsync });
    }

    #[test]
    fn offset_inside_prev_window_is_previous_with_limit() {
        let s = state();
        let r = locate(&s, ReplMode::Psync, 400);
        assert_eq!(r, Locate::Previous { mode: ReplMode::Psync, limit: 600 });
    }

    #[test]
    fn offset_before_prev_window_is_invalid() {
        let mut s = GtidReplMode::new(ReplMode::Psync, 100);
        s.shift_mode(ReplMode::Xsync, 1000);
        assert!(matches!(locate(&s, ReplMode::Psync, 50), Locate::Invalid { .. }));
    }

    #[test]
    fn no_prev_mode_below_cur_is_invalid() {
        let s = GtidReplMode::new(ReplMode::Xsync, 1000);
        assert!(matches!(locate(&s, ReplMode::Xsync, 500), Locate::Invalid { .. }));
    }
}
