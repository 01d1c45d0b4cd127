use std::fs;

use common::config::GtidConfig;
use common::err::ReError;
use gtid::{GtidSeq, GtidSet};
use gtid_repl::UuidInterest;
use serde::{Deserialize, Serialize};

pub struct Store {
    pub executed: GtidSet,
    pub lost: GtidSet,
    pub seq: GtidSeq,
    /// Append-ordered `(uuid, gno, offset)` triples backing `seq`, kept
    /// alongside it purely so the index can be rebuilt on load (`GtidSeq`
    /// has no structural `Serialize` of its own).
    seq_log: Vec<(String, i64, u64)>,
    next_offset: u64,
    pub uuid_interested: UuidInterest,
}

/// On-disk shape: `GtidSet` round-trips through its text encoding (its
/// skip-list arena isn't meant to be persisted structurally), and `GtidSeq`
/// round-trips by replaying its append log in order.
#[derive(Serialize, Deserialize)]
struct StoreFile {
    executed: String,
    lost: String,
    seq_log: Vec<(String, i64, u64)>,
    next_offset: u64,
    uuid_interested: String,
}

impl Default for Store {
    fn default() -> Self {
        let config = GtidConfig::default();
        Store {
            executed: GtidSet::new(),
            lost: GtidSet::new(),
            seq: GtidSeq::new(config.segment_capacity, config.max_free_segments),
            seq_log: Vec::new(),
            next_offset: 1,
            uuid_interested: UuidInterest::Any,
        }
    }
}

impl Store {
    pub fn load(path: &str) -> Result<Store, ReError> {
        let text = fs::read_to_string(path)?;
        let file: StoreFile = serde_json::from_str(&text).map_err(|e| ReError::parse(e.to_string()))?;

        let config = GtidConfig::default();
        let mut seq = GtidSeq::new(config.segment_capacity, config.max_free_segments);
        for (uuid, gno, offset) in &file.seq_log {
            seq.append(uuid, *gno, *offset);
        }

        Ok(Store {
            executed: GtidSet::decode(&file.executed)?,
            lost: GtidSet::decode(&file.lost)?,
            seq,
            seq_log: file.seq_log,
            next_offset: file.next_offset,
            uuid_interested: UuidInterest::parse(&file.uuid_interested),
        })
    }

    pub fn save(&self, path: &str) -> Result<(), ReError> {
        let file = StoreFile {
            executed: self.executed.encode(),
            lost: self.lost.encode(),
            seq_log: self.seq_log.clone(),
            next_offset: self.next_offset,
            uuid_interested: self.uuid_interested.as_str().to_string(),
        };
        let text = serde_json::to_string_pretty(&file).map_err(|e| ReError::parse(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Records that `(uuid, gno)` has been durably applied, assigning it the
    /// next synthetic backlog offset. Mirrors `GtidReplState::record_applied`
    /// one gno at a time, since the CLI has no real backlog to read offsets
    /// from.
    pub fn record_applied(&mut self, uuid: &str, gno: i64) {
        let offset = self.next_offset;
        self.seq.append(uuid, gno, offset);
        self.seq_log.push((uuid.to_string(), gno, offset));
        self.next_offset += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_through_a_file() {
        let path = std::env::temp_dir()
            .join(format!("gtidx-cli-test-{}.json", std::process::id()))
            .to_string_lossy()
            .to_string();

        let mut store = Store::default();
        store.executed.add("a", 1, 5);
        store.lost.add("a", 3, 3);
        store.save(&path).unwrap();

        let loaded = Store::load(&path).unwrap();
        assert_eq!(loaded.executed.encode(), "a:1-5");
        assert_eq!(loaded.lost.encode(), "a:3");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn seq_log_round_trips_and_rebuilds_the_index() {
        let path = std::env::temp_dir()
            .join(format!("gtidx-cli-test-seq-{}.json", std::process::id()))
            .to_string_lossy()
            .to_string();

        let mut store = Store::default();
        store.record_applied("a", 1);
        store.record_applied("a", 2);
        store.save(&path).unwrap();

        let loaded = Store::load(&path).unwrap();
        let (offset, cont) = loaded.seq.xsync(&GtidSet::new());
        assert_eq!(offset, 1);
        assert_eq!(cont.encode(), "a:1-2");

        let _ = std::fs::remove_file(&path);
    }
}
