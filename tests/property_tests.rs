//! Randomized tests of the lump codec.

use lumpcodec::{decode,encode,DecodeError};
use proptest::prelude::*;

proptest! {
    #[test]
    fn round_trip(data in prop::collection::vec(any::<u8>(), 0..2000)) {
        let compressed = encode(&data);
        prop_assert_eq!(compressed.len() % 4, 0);
        prop_assert_eq!(decode(&compressed, data.len()), Ok(data));
    }
}

proptest! {
    #[test]
    fn round_trip_small_alphabet(data in prop::collection::vec(0..4u8, 0..3000)) {
        // few distinct bytes means lots of runs
        let compressed = encode(&data);
        prop_assert_eq!(decode(&compressed, data.len()), Ok(data));
    }
}

proptest! {
    #[test]
    fn repetitive_patterns(
        pattern in prop::collection::vec(any::<u8>(), 1..20),
        repeat_count in 2..100usize
    ) {
        let data = pattern.repeat(repeat_count);
        let compressed = encode(&data);
        prop_assert_eq!(decode(&compressed, data.len()), Ok(data.clone()));
        prop_assert!(compressed.len() <= data.len() + 16, "expanded too much: {} -> {}", data.len(), compressed.len());
    }
}

proptest! {
    #[test]
    fn encoding_is_deterministic(data in prop::collection::vec(any::<u8>(), 0..500)) {
        prop_assert_eq!(encode(&data), encode(&data));
    }
}

proptest! {
    #[test]
    fn short_capacity_overflows(data in prop::collection::vec(any::<u8>(), 1..500), cut in 1..500usize) {
        let capacity = data.len() - cut.min(data.len());
        let compressed = encode(&data);
        prop_assert_eq!(decode(&compressed, capacity), Err(DecodeError::OutputOverflow { capacity }));
    }
}

proptest! {
    #[test]
    fn decoding_never_panics(data in prop::collection::vec(any::<u8>(), 0..1000), capacity in 0..5000usize) {
        // random bytes are rarely a valid lump, but decoding must return rather than panic,
        // and any walk of the tree lands on a real symbol
        let result = decode(&data, capacity);
        prop_assert!(!matches!(result, Err(DecodeError::InvalidSymbol(_))));
    }
}
