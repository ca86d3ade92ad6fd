//! Property-based tests for the snapshot codec.
//!
//! These tests verify that decode(encode(x)) == x for random non-empty stores
//! and that damaged input is rejected without panicking.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use proptest::prelude::*;
use settings_store::{Store, Value, decode, encode};

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::Int),
        any::<i64>().prop_map(Value::Long),
        // NaN never compares equal, so keep floats finite.
        (-1.0e9f32..1.0e9f32).prop_map(Value::Float),
        "\\PC{0,24}".prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..48).prop_map(Value::Bytes),
    ]
}

fn store_strategy() -> impl Strategy<Value = Store> {
    prop::collection::hash_map("[a-z][a-z0-9_.]{0,15}", value_strategy(), 1..24)
        .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn roundtrip_store(store in store_strategy()) {
        let bytes = encode(&store).unwrap();
        let decoded = decode(&bytes).unwrap();
        prop_assert_eq!(decoded, store);
    }

    #[test]
    fn truncated_snapshot_is_rejected(store in store_strategy(), cut in any::<prop::sample::Index>()) {
        let bytes = encode(&store).unwrap();
        let len = cut.index(bytes.len());
        prop_assert!(decode(&bytes[..len]).is_err());
    }

    #[test]
    fn appended_bytes_are_rejected(store in store_strategy(), extra in prop::collection::vec(any::<u8>(), 1..8)) {
        let mut bytes = encode(&store).unwrap();
        bytes.extend_from_slice(&extra);
        prop_assert!(decode(&bytes).is_err());
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode(&bytes);
    }
}
