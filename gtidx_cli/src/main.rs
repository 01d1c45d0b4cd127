//! `gtidx`: a standalone management CLI over the GTID bookkeeping core,
//! exposing the `GTIDX` subcommands the core spec lists as "opaque to the
//! core" (§6) against a JSON-file-backed store.
//!
//! Grounded on the teacher's `binlog_cli/src/main.rs` + `cli_options.rs`
//! clap-derive pattern.

mod store;

use clap::{Parser, Subcommand};
use common::log::TracingFactory;
use gtid::GtidSet;
use gtid_repl::UuidInterest;
use tracing::info;

use store::Store;

#[derive(Parser)]
#[command(name = "gtidx", about = "Inspect and mutate a GTID bookkeeping store")]
struct Cli {
    /// Path to the JSON-encoded state file (created on first use).
    #[arg(long, default_value = "gtidx-state.json")]
    state: String,

    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Set {
    Executed,
    Lost,
}

#[derive(Subcommand)]
enum SeqQuery {
    /// SEQ LOCATE <gtid.set> [<maxlen>]
    Locate {
        gtid_set: String,
        maxlen: Option<usize>,
    },
    /// SEQ GTID.SET
    #[command(name = "gtid-set")]
    GtidSet,
}

#[derive(Subcommand)]
enum UuidInterestedAction {
    /// UUID-INTERESTED SET {*|?}
    Set { value: String },
}

#[derive(Subcommand)]
enum Command {
    /// GTIDX LIST {EXECUTED|LOST} [<uuid>]
    List {
        #[command(subcommand)]
        set: Set,
        uuid: Option<String>,
    },
    /// GTIDX STAT {EXECUTED|LOST} [<uuid>]
    Stat {
        #[command(subcommand)]
        set: Set,
        uuid: Option<String>,
    },
    /// GTIDX ADD {EXECUTED|LOST} <uuid> <start> <end>
    Add {
        #[command(subcommand)]
        set: Set,
        uuid: String,
        start: i64,
        end: i64,
    },
    /// GTIDX REMOVE {EXECUTED|LOST} <uuid> <start> <end>
    Remove {
        #[command(subcommand)]
        set: Set,
        uuid: String,
        start: i64,
        end: i64,
    },
    /// GTIDX SEQ [LOCATE <gtid.set> [<maxlen>] | GTID.SET]
    Seq {
        #[command(subcommand)]
        query: SeqQuery,
    },
    /// GTIDX UUID-INTERESTED SET {*|?}
    UuidInterested {
        #[command(subcommand)]
        action: UuidInterestedAction,
    },
}

fn main() {
    let cli = Cli::parse();
    TracingFactory::init_log(cli.debug);

    let mut store = Store::load(&cli.state).unwrap_or_else(|e| {
        eprintln!("warning: starting from empty state ({e})");
        Store::default()
    });

    let output = run(&mut store, &cli.command);
    println!("{output}");

    if let Err(e) = store.save(&cli.state) {
        eprintln!("error: failed to save state: {e}");
        std::process::exit(1);
    }
    info!(state = %cli.state, "gtidx state persisted");
}

fn set_mut<'a>(store: &'a mut Store, set: &Set) -> &'a mut GtidSet {
    match set {
        Set::Executed => &mut store.executed,
        Set::Lost => &mut store.lost,
    }
}

/// Caps `set`'s total gno count at `maxlen`, walking uuids in append order
/// and truncating the final interval that would overflow the budget.
fn truncate_gno_count(set: &GtidSet, maxlen: usize) -> GtidSet {
    let mut out = GtidSet::new();
    let mut remaining = maxlen;
    'outer: for uuid_set in set.uuid_sets() {
        for (start, end) in uuid_set.iter() {
            if remaining == 0 {
                break 'outer;
            }
            let count = (end - start + 1) as usize;
            if count <= remaining {
                out.add(uuid_set.uuid(), start, end);
                remaining -= count;
            } else {
                out.add(uuid_set.uuid(), start, start + remaining as i64 - 1);
                remaining = 0;
            }
        }
    }
    out
}

fn run(store: &mut Store, command: &Command) -> String {
    match command {
        Command::List { set, uuid } => {
            let gtid_set = match set {
                Set::Executed => &store.executed,
                Set::Lost => &store.lost,
            };
            match uuid {
                Some(u) => gtid_set.find(u).map(|s| {
                    let mut buf = String::new();
                    s.encode(&mut buf);
                    buf
                }).unwrap_or_default(),
                None => gtid_set.encode(),
            }
        }
        Command::Stat { set, uuid } => {
            let gtid_set = match set {
                Set::Executed => &store.executed,
                Set::Lost => &store.lost,
            };
            match uuid {
                Some(u) => match gtid_set.find(u) {
                    Some(s) => format!("uuid={} count={}", u, s.count()),
                    None => format!("uuid={u} not found"),
                },
                None => {
                    let stat = gtid_set.stats();
                    format!(
                        "uuid_count={} gap_count={} gno_count={} used_memory={}",
                        stat.uuid_count, stat.gap_count, stat.gno_count, stat.used_memory
                    )
                }
            }
        }
        Command::Add { set, uuid, start, end } => {
            let track_seq = matches!(set, Set::Executed);
            let newly_applied: Vec<i64> = if track_seq {
                (*start..=*end).filter(|&gno| !store.executed.contains(uuid, gno)).collect()
            } else {
                Vec::new()
            };
            let added = set_mut(store, set).add(uuid, *start, *end);
            for gno in newly_applied {
                store.record_applied(uuid, gno);
            }
            format!("added {added} gnos to {uuid}")
        }
        Command::Remove { set, uuid, start, end } => {
            let removed = set_mut(store, set).remove(uuid, *start, *end);
            format!("removed {removed} gnos from {uuid}")
        }
        Command::Seq { query } => match query {
            SeqQuery::Locate { gtid_set, maxlen } => match GtidSet::decode(gtid_set) {
                Ok(peer) => {
                    let (offset, cont) = store.seq.xsync(&peer);
                    let cont = match maxlen {
                        Some(n) => truncate_gno_count(&cont, *n),
                        None => cont,
                    };
                    format!("offset={offset} cont={}", cont.encode())
                }
                Err(e) => format!("error: invalid gtid.set: {e}"),
            },
            SeqQuery::GtidSet => store.seq.psync(0).encode(),
        },
        Command::UuidInterested { action } => match action {
            UuidInterestedAction::Set { value } => {
                if value != "*" && value != "?" {
                    format!("error: uuid-interested must be '*' or '?', got '{value}'")
                } else {
                    store.uuid_interested = UuidInterest::parse(value);
                    format!("uuid-interested set to {}", store.uuid_interested.as_str())
                }
            }
        },
    }
}
