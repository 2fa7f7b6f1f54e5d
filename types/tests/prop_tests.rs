use proptest::prelude::*;

use tokenchain_types::{
    address::PREFIX_STANDARD, BlockHash, Fixed64, ProgramHash, SignedAmount, TxHash, U256,
};

proptest! {
    /// BlockHash roundtrip: new -> as_bytes -> new produces identical hash.
    #[test]
    fn block_hash_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.as_bytes(), &bytes);
    }

    /// TxHash hex display parses back to the same hash.
    #[test]
    fn tx_hash_display_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = TxHash::new(bytes);
        let parsed: TxHash = hash.to_string().parse().unwrap();
        prop_assert_eq!(parsed, hash);
    }

    /// TxHash::is_zero is true only for all-zero bytes.
    #[test]
    fn tx_hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = TxHash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// TxHash bincode serialization roundtrip.
    #[test]
    fn tx_hash_bincode_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = TxHash::new(bytes);
        let encoded = bincode::serialize(&hash).unwrap();
        let decoded: TxHash = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, hash);
    }

    /// Any standard program hash survives address encoding.
    #[test]
    fn address_roundtrip(body in prop::array::uniform20(0u8..)) {
        let hash = ProgramHash::with_prefix(PREFIX_STANDARD, body);
        let decoded = ProgramHash::from_address(&hash.to_address()).unwrap();
        prop_assert_eq!(decoded, hash);
    }

    /// Signed addition agrees with i128 arithmetic over native amounts.
    #[test]
    fn signed_amount_matches_i128(a in -1_000_000_000_000i64..1_000_000_000_000, b in -1_000_000_000_000i64..1_000_000_000_000) {
        let sum = SignedAmount::from(Fixed64::new(a))
            .checked_add(SignedAmount::from(Fixed64::new(b)))
            .unwrap();
        let expected = a as i128 + b as i128;
        prop_assert_eq!(sum.is_negative(), expected < 0);
        prop_assert_eq!(sum.magnitude(), U256::from(expected.unsigned_abs()));
    }

    /// a - b + b == a.
    #[test]
    fn signed_amount_sub_inverse(a in any::<u64>(), b in any::<u64>()) {
        let a = SignedAmount::positive(U256::from(a));
        let b = SignedAmount::positive(U256::from(b));
        let back = a.checked_sub(b).unwrap().checked_add(b).unwrap();
        prop_assert_eq!(back, a);
    }

    /// Ordering agrees with the underlying integers.
    #[test]
    fn signed_amount_ordering(a in any::<i64>(), b in any::<i64>()) {
        let sa = SignedAmount::from(Fixed64::new(a));
        let sb = SignedAmount::from(Fixed64::new(b));
        prop_assert_eq!(sa.cmp(&sb), a.cmp(&b));
    }
}
