use binlog_core::time::{ns_since_epoch_to_broken_down_time, ticks_to_nanoseconds};
use binlog_core::visit::{encode_value, visit};
use binlog_core::{deserialize, from_bytes_exact, to_bytes, Classify, Error, Serialize};
use proptest::prelude::*;

type Record = (u64, String, Vec<i16>, Vec<bool>, [f64; 2], Vec<Vec<u8>>);

fn record() -> impl Strategy<Value = Record> {
    (
        any::<u64>(),
        ".{0,40}",
        prop::collection::vec(any::<i16>(), 0..32),
        prop::collection::vec(any::<bool>(), 0..100),
        prop::array::uniform2(-1e12f64..1e12),
        prop::collection::vec(prop::collection::vec(any::<u8>(), 0..8), 0..6),
    )
}

proptest! {
    #[test]
    fn prop_record_survives_encoding(value in record()) {
        let bytes = to_bytes(&value).unwrap();
        prop_assert_eq!(bytes.len(), value.serialized_size());

        let decoded: Record = from_bytes_exact(&bytes).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn prop_every_strict_prefix_is_truncated(value in record(), cut in any::<prop::sample::Index>()) {
        let bytes = to_bytes(&value).unwrap();
        let len = cut.index(bytes.len());

        let result = deserialize::<Record, _>(&mut &bytes[..len]);
        let truncated = matches!(result, Err(Error::TruncatedInput { .. }));
        prop_assert!(truncated, "prefix of {} bytes should be truncated input", len);
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = deserialize::<Record, _>(&mut bytes.as_slice());
        let _ = visit(&<Record as Classify>::shape(), &mut bytes.as_slice());
    }

    #[test]
    fn prop_visit_then_encode_reproduces_bytes(value in record()) {
        let bytes = to_bytes(&value).unwrap();
        let shape = <Record as Classify>::shape();

        let mut source = bytes.as_slice();
        let dynamic = visit(&shape, &mut source).unwrap();
        prop_assert!(source.is_empty());

        let mut encoded = Vec::<u8>::new();
        encode_value(&shape, &dynamic, &mut encoded).unwrap();
        prop_assert_eq!(encoded, bytes);
    }

    #[test]
    fn prop_ticks_are_monotonic(frequency in 1u64.., a in any::<i64>(), b in any::<i64>()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(ticks_to_nanoseconds(frequency, lo) <= ticks_to_nanoseconds(frequency, hi));
    }

    #[test]
    fn prop_ticks_are_odd(frequency in 1_000_000_000u64.., ticks in (i64::MIN + 1)..=i64::MAX) {
        prop_assert_eq!(ticks_to_nanoseconds(frequency, -ticks), -ticks_to_nanoseconds(frequency, ticks));
    }

    #[test]
    fn prop_broken_down_time_reassembles(
        ns in -5_000_000_000_000_000_000i64..7_000_000_000_000_000_000,
        offset in -14 * 3600i32..=14 * 3600,
    ) {
        let t = ns_since_epoch_to_broken_down_time(ns, offset);
        prop_assert!(t.month < 12 && (1..=31).contains(&t.day) && t.weekday < 7);
        prop_assert_eq!(t.to_ns_since_epoch(), Some(ns));
    }
}
