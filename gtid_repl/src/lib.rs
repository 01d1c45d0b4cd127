//! Replication-facing glue around the GTID bookkeeping core: the backlog
//! collaborator contract, wire request/reply codecs, and the state machine
//! that answers a `PSYNC`/`XSYNC` handshake.

pub mod backlog;
pub mod state;
pub mod wire;

pub use backlog::{Backlog, MemoryBacklog};
pub use state::GtidReplState;
pub use wire::{Reply, SyncRequest, UuidInterest};
