//! Shared text encode/decode helpers for GNOs, intervals, and `uuid:gno`
//! pairs, reused by [`crate::uuid_set::UuidSet`] and [`crate::gtid_set::GtidSet`].
//!
//! Grounded on `uuidGnoEncode`/`uuidGnoDecode` in
//! `examples/original_source/gtid.c`, which the xredis replication feed path
//! uses to stamp each propagated command with its origin uuid and gno; the
//! distilled core spec only describes the interval/uuid-set text grammar; the
//! `uuid:gno` pair format is a supplemented feature pulled in from that path.

use common::err::ReError;

/// Encodes a single closed interval as `start` (if `start == end`) or
/// `start-end`.
pub fn encode_interval(buf: &mut String, start: i64, end: i64) {
    if start == end {
        buf.push_str(&start.to_string());
    } else {
        buf.push_str(&start.to_string());
        buf.push('-');
        buf.push_str(&end.to_string());
    }
}

/// Upper bound on the bytes `encode_interval` can produce for this range,
/// used by callers sizing an output buffer up front rather than growing a
/// `String` incrementally.
pub fn estimate_interval_encode_size(start: i64, end: i64) -> usize {
    fn digits(n: i64) -> usize {
        n.to_string().len()
    }
    if start == end {
        digits(start)
    } else {
        digits(start) + 1 + digits(end)
    }
}

/// Parses `"start-end"` or `"n"` into a closed interval.
pub fn decode_interval(s: &str) -> Result<(i64, i64), ReError> {
    if let Some((l, r)) = s.split_once('-') {
        let start: i64 = l
            .parse()
            .map_err(|_| ReError::parse(format!("bad interval start: {s}")))?;
        let end: i64 = r
            .parse()
            .map_err(|_| ReError::parse(format!("bad interval end: {s}")))?;
        if start > end {
            return Err(ReError::parse(format!("interval start > end: {s}")));
        }
        Ok((start, end))
    } else {
        let n: i64 = s
            .parse()
            .map_err(|_| ReError::parse(format!("bad gno: {s}")))?;
        Ok((n, n))
    }
}

/// Encodes `uuid:gno`, the form used on the propagation path to tag a
/// replicated command with its origin.
pub fn uuid_gno_encode(uuid: &str, gno: i64) -> String {
    format!("{uuid}:{gno}")
}

/// Decodes a `uuid:gno` pair produced by [`uuid_gno_encode`].
pub fn uuid_gno_decode(s: &str) -> Result<(&str, i64), ReError> {
    let (uuid, gno_s) = s
        .rsplit_once(':')
        .ok_or_else(|| ReError::parse(format!("missing ':' in uuid:gno pair: {s}")))?;
    if uuid.is_empty() {
        return Err(ReError::parse(format!("empty uuid in pair: {s}")));
    }
    let gno: i64 = gno_s
        .parse()
        .map_err(|_| ReError::parse(format!("bad gno in pair: {s}")))?;
    Ok((uuid, gno))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn interval_roundtrip_single() {
        let mut s = String::new();
        encode_interval(&mut s, 7, 7);
        assert_eq!(s, "7");
        assert_eq!(decode_interval(&s).unwrap(), (7, 7));
    }

    #[test]
    fn interval_roundtrip_range() {
        let mut s = String::new();
        encode_interval(&mut s, 3, 9);
        assert_eq!(s, "3-9");
        assert_eq!(decode_interval(&s).unwrap(), (3, 9));
    }

    #[test]
    fn interval_rejects_inverted_range() {
        assert!(decode_interval("9-3").is_err());
    }

    #[test]
    fn estimate_matches_actual_length() {
        let mut s = String::new();
        encode_interval(&mut s, 100, 20000);
        assert_eq!(s.len(), estimate_interval_encode_size(100, 20000));
    }

    #[test]
    fn uuid_gno_roundtrip() {
        let s = uuid_gno_encode("7f15b395", 42);
        assert_eq!(s, "7f15b395:42");
        assert_eq!(uuid_gno_decode(&s).unwrap(), ("7f15b395", 42));
    }

    #[test]
    fn uuid_gno_rejects_missing_colon() {
        assert!(uuid_gno_decode("nocolonhere").is_err());
    }
}
