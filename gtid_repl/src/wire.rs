//! Text encode/decode for the sync handshake's wire-level requests and
//! replies, per the core spec's "External Interfaces" section.

use common::err::ReError;
use gtid::repl_mode::ReplMode;
use gtid::GtidSet;
use tracing::warn;

/// Which uuids a replica declares interest in via `XSYNC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UuidInterest {
    /// `*`: every uuid the master knows about.
    Any,
    /// `?`: the master should pick on the replica's behalf.
    Unknown,
    Specific(String),
}

impl UuidInterest {
    pub fn parse(s: &str) -> UuidInterest {
        match s {
            "*" => UuidInterest::Any,
            "?" => UuidInterest::Unknown,
            other => UuidInterest::Specific(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            UuidInterest::Any => "*",
            UuidInterest::Unknown => "?",
            UuidInterest::Specific(u) => u,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRequest {
    Psync { replid: String, offset: u64 },
    Xsync {
        uuid_interested: UuidInterest,
        gtid_set: GtidSetText,
        gtid_lost: Option<GtidSetText>,
        maxgap: Option<u64>,
    },
}

/// A GTID-set carried verbatim in wire text; callers decode it with
/// [`gtid::GtidSet::decode`] once they're ready to operate on it, keeping
/// parse failures local to the field that actually has bad syntax.
pub type GtidSetText = String;

impl SyncRequest {
    pub fn parse(line: &str) -> Result<SyncRequest, ReError> {
        let result = Self::parse_inner(line);
        if let Err(e) = &result {
            warn!(line, error = %e, "sync request classified invalid");
        }
        result
    }

    fn parse_inner(line: &str) -> Result<SyncRequest, ReError> {
        let mut parts = line.trim().split_whitespace();
        let verb = parts.next().ok_or_else(|| ReError::InvalidSync("empty request".into()))?;

        match verb.to_ascii_uppercase().as_str() {
            "PSYNC" => {
                let replid = parts
                    .next()
                    .ok_or_else(|| ReError::InvalidSync("PSYNC missing replid".into()))?
                    .to_string();
                let offset: u64 = parts
                    .next()
                    .ok_or_else(|| ReError::InvalidSync("PSYNC missing offset".into()))?
                    .parse()
                    .map_err(|_| ReError::InvalidSync("PSYNC offset not a number".into()))?;
                Ok(SyncRequest::Psync { replid, offset })
            }
            "XSYNC" => {
                let uuid_interested = UuidInterest::parse(
                    parts.next().ok_or_else(|| ReError::InvalidSync("XSYNC missing uuid field".into()))?,
                );
                let gtid_set = parts
                    .next()
                    .ok_or_else(|| ReError::InvalidSync("XSYNC missing gtid set".into()))?
                    .to_string();

                let mut gtid_lost = None;
                let mut maxgap = None;
                let rest: Vec<&str> = parts.collect();
                let mut i = 0;
                while i < rest.len() {
                    match rest[i].to_ascii_uppercase().as_str() {
                        "GTID.LOST" if i + 1 < rest.len() => {
                            gtid_lost = Some(rest[i + 1].to_string());
                            i += 2;
                        }
                        "MAXGAP" if i + 1 < rest.len() => {
                            maxgap = rest[i + 1].parse().ok();
                            i += 2;
                        }
                        // forward-compatibility: ignore unrecognized options
                        _ => i += 1,
                    }
                }

                Ok(SyncRequest::Xsync { uuid_interested, gtid_set, gtid_lost, maxgap })
            }
            other => Err(ReError::InvalidSync(format!("unknown sync request: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    FullResync { replid: String, offset: u64 },
    Continue { replid: Option<String>, offset: Option<u64> },
    XFullResync { gtid_lost: GtidSet, master_uuid: String, replid: String, repl_offset: u64 },
    XContinue {
        gtid_set: GtidSet,
        gtid_lost: Option<GtidSet>,
        master_uuid: String,
        replid: String,
        repl_offset: u64,
    },
}

impl Reply {
    pub fn encode(&self) -> String {
        match self {
            Reply::FullResync { replid, offset } => format!("+FULLRESYNC {replid} {offset}\r\n"),
            Reply::Continue { replid, offset } => match (replid, offset) {
                (Some(r), Some(o)) => format!("+CONTINUE {r} {o}\r\n"),
                (Some(r), None) => format!("+CONTINUE {r}\r\n"),
                _ => "+CONTINUE\r\n".to_string(),
            },
            Reply::XFullResync { gtid_lost, master_uuid, replid, repl_offset } => format!(
                "+XFULLRESYNC GTID.LOST {} MASTER.UUID {} REPLID {} REPLOFF {}\r\n",
                gtid_lost.encode(),
                master_uuid,
                replid,
                repl_offset
            ),
            Reply::XContinue { gtid_set, gtid_lost, master_uuid, replid, repl_offset } => {
                let mut s = format!("+XCONTINUE GTID.SET {}", gtid_set.encode());
                if let Some(lost) = gtid_lost {
                    s.push_str(&format!(" GTID.LOST {}", lost.encode()));
                }
                s.push_str(&format!(" MASTER.UUID {master_uuid} REPLID {replid} REPLOFF {repl_offset}\r\n"));
                s
            }
        }
    }
}

pub fn mode_verb(mode: ReplMode) -> &'static str {
    mode.as_str()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_psync_request() {
        let r = SyncRequest::parse("PSYNC abc123 4096").unwrap();
        assert_eq!(r, SyncRequest::Psync { replid: "abc123".into(), offset: 4096 });
    }

    #[test]
    fn parses_xsync_request_with_options() {
        let r = SyncRequest::parse("XSYNC * a:1-5 GTID.LOST b:1 MAXGAP 64").unwrap();
        assert_eq!(
            r,
            SyncRequest::Xsync {
                uuid_interested: UuidInterest::Any,
                gtid_set: "a:1-5".to_string(),
                gtid_lost: Some("b:1".to_string()),
                maxgap: Some(64),
            }
        );
    }

    #[test]
    fn xsync_ignores_unrecognized_options() {
        let r = SyncRequest::parse("XSYNC ? a:1-5 FUTURE.OPTION 7 MAXGAP 10").unwrap();
        match r {
            SyncRequest::Xsync { maxgap, uuid_interested, .. } => {
                assert_eq!(maxgap, Some(10));
                assert_eq!(uuid_interested, UuidInterest::Unknown);
            }
            _ => panic!("expected xsync"),
        }
    }

    #[test]
    fn encodes_fullresync() {
        let r = Reply::FullResync { replid: "r1".into(), offset: 10 };
        assert_eq!(r.encode(), "+FULLRESYNC r1 10\r\n");
    }

    #[test]
    fn encodes_xcontinue_without_lost() {
        let mut gtid_set = GtidSet::new();
        gtid_set.add("u", 1, 5);
        let r = Reply::XContinue {
            gtid_set,
            gtid_lost: None,
            master_uuid: "u".into(),
            replid: "r1".into(),
            repl_offset: 99,
        };
        assert_eq!(r.encode(), "+XCONTINUE GTID.SET u:1-5 MASTER.UUID u REPLID r1 REPLOFF 99\r\n");
    }
}
