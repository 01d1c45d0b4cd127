//! Shared helpers for the integration suites under `tests/tests/`.

use gtid::GtidSet;

/// Builds a `GtidSet` from its canonical text form, panicking on malformed
/// input (tests should never feed this bad data).
pub fn gtid_set(text: &str) -> GtidSet {
    GtidSet::decode(text).expect("valid gtid-set text in test fixture")
}
