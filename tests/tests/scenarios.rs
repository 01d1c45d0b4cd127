//! End-to-end exercise of the core spec's concrete scenarios, driven
//! through the public `gtid` API the way an embedding server would.

use tests::gtid_set;

#[test]
fn scenario_coalesce_on_bridge() {
    let mut g = gtid_set("A:2-3:7-9:11-12");
    let added = g.add("A", 1, 14);
    assert_eq!(added, 7);
    assert_eq!(g.encode(), "A:1-14");
}

#[test]
fn scenario_interior_insert() {
    let mut g = gtid_set("A:1-2:7-8:10-11");
    let added = g.add("A", 4, 5);
    assert_eq!(added, 2);
    assert_eq!(g.encode(), "A:1-2:4-5:7-8:10-11");
}

#[test]
fn scenario_idempotent_contained() {
    let mut g = gtid_set("A:1-5:7-8:10-11");
    let added = g.add("A", 2, 3);
    assert_eq!(added, 0);
    assert_eq!(g.encode(), "A:1-5:7-8:10-11");
}

#[test]
fn scenario_remove_bridging_three() {
    let mut g = gtid_set("A:10-15:20-25:30-35");
    let removed = g.remove("A", 13, 33);
    assert_eq!(removed, 13);
    assert_eq!(g.encode(), "A:10-12:34-35");
}

#[test]
fn scenario_next_and_contains() {
    let mut g = gtid_set("");
    let first = g.find_or_append("A").next(true);
    assert_eq!(first, 1);
    g.add("A", 3, 4);
    g.add("A", 10, 11);
    g.add("A", 5, 9);
    assert_eq!(g.encode(), "A:1:3-12");
    let next = g.find_or_append("A").next(false);
    assert_eq!(next, 13);
}

#[test]
fn scenario_xsync_with_peer_behind() {
    let mut seq = gtid::GtidSeq::new(1024, 4);
    seq.append("A", 100, 100_000);
    seq.append("A", 101, 100_100);
    seq.append("B", 100, 200_000);
    seq.append("B", 101, 300_100);
    seq.append("B", 102, 300_200);
    seq.append("B", 103, 300_300);

    let peer = gtid_set("B:1-100");
    let (offset, cont) = seq.xsync(&peer);
    assert_eq!(offset, 300_100);
    assert_eq!(cont.encode(), "B:101-103");
}

#[test]
fn scenario_xsync_with_empty_peer() {
    let mut seq = gtid::GtidSeq::new(1024, 4);
    seq.append("A", 100, 100_000);
    seq.append("A", 101, 100_100);
    seq.append("B", 100, 200_000);
    seq.append("B", 101, 300_100);
    seq.append("B", 102, 300_200);
    seq.append("B", 103, 300_300);

    let peer = gtid_set("");
    let (offset, cont) = seq.xsync(&peer);
    assert_eq!(offset, 100_000);
    assert_eq!(cont.encode(), "B:100-103,A:100-101");
}

#[test]
fn scenario_psync_at_boundary() {
    let mut seq = gtid::GtidSeq::new(1024, 4);
    seq.append("A", 100, 100_000);
    seq.append("A", 101, 100_100);
    seq.append("B", 100, 200_000);
    seq.append("B", 101, 300_100);
    seq.append("B", 102, 300_200);
    seq.append("B", 103, 300_300);

    let set = seq.psync(300_200);
    assert_eq!(set.encode(), "B:102-103");
}
