use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::err::ReError;

/// Tunables the core spec leaves as "an implementation constant": segment
/// capacity for the GTID sequence index, the free-segment list cap, and the
/// `maxgap` used when deciding whether an `XSYNC` request can be satisfied
/// incrementally or needs a full resync. Every other behavior of the core is
/// load-bearing and not configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GtidConfig {
    /// §4.D per-segment `deltas[]` fixed capacity.
    pub segment_capacity: usize,

    /// §4.D free segment list cap (`MaxFreeSegs`).
    pub max_free_segments: usize,

    /// §4.E `maxgap`: xsync gap above which a full resync is forced.
    pub max_gap: u64,

    /// Directory used for rolling log files when file logging is enabled.
    pub log_dir: Option<String>,
}

impl Default for GtidConfig {
    fn default() -> Self {
        GtidConfig {
            segment_capacity: 1024,
            max_free_segments: 4,
            max_gap: 128,
            log_dir: None,
        }
    }
}

/// Reads a TOML-encoded `GtidConfig` from `path`, matching the teacher's
/// `common::config::read_config`.
pub fn read_config<P: AsRef<Path>>(path: P) -> Result<GtidConfig, ReError> {
    let mut file = File::open(path.as_ref())?;
    let mut s = String::new();
    file.read_to_string(&mut s)?;
    let config = toml::from_str(&s)?;
    Ok(config)
}
