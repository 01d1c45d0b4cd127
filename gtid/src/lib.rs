//! GTID bookkeeping core: interval skip lists, uuid/gtid sets, the
//! replication sequence index, and the sync-mode locator that a
//! Redis-compatible server's replication layer is built on top of.

pub mod codec;
pub mod gtid_set;
pub mod locator;
pub mod repl_mode;
pub mod seq;
pub mod skiplist;
pub mod uuid_set;

pub use gtid_set::{GtidSet, GtidStat};
pub use locator::{locate, Locate};
pub use repl_mode::{GtidReplMode, ReplMode, ReplModeRecord};
pub use seq::GtidSeq;
pub use skiplist::{IntervalSkipList, GNO_INITIAL};
pub use uuid_set::UuidSet;
