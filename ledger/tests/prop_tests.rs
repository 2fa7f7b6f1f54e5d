use std::sync::Arc;

use proptest::prelude::*;

use tokenchain_ledger::{ChainStore, FeeAccountant};
use tokenchain_nullables::fixtures::{block_after, coinbase, identity, transfer};
use tokenchain_nullables::NullStore;
use tokenchain_transactions::{Block, OutPoint, Output};
use tokenchain_types::{ChainParams, Fixed64, SignedAmount};

fn funded_chain(amounts: &[i64]) -> (Arc<NullStore>, ChainStore, Block) {
    let kv = Arc::new(NullStore::new());
    let params = ChainParams::default();
    let native = params.native_asset_id;
    let chain = ChainStore::open(kv.clone(), params).unwrap();
    let outputs = amounts
        .iter()
        .enumerate()
        .map(|(i, a)| Output::native(native, Fixed64::new(*a), identity(i as u8 + 1)))
        .collect();
    let genesis = block_after(None, vec![coinbase(0, outputs)]);
    chain.apply_block(&genesis).unwrap();
    (kv, chain, genesis)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Applying then unapplying a block of transfers restores every byte.
    #[test]
    fn apply_unapply_round_trip(
        amounts in prop::collection::vec(1i64..1_000_000_000, 1..6),
        recipients in prop::collection::vec(1u8..20, 1..4),
    ) {
        let (kv, chain, genesis) = funded_chain(&amounts);
        let native = chain.params().native_asset_id;
        let before = kv.dump();

        let coinbase_id = genesis.transactions[0].hash();
        let spends: Vec<OutPoint> = (0..amounts.len() as u16)
            .map(|i| OutPoint::new(coinbase_id, i))
            .collect();
        let total: i64 = amounts.iter().sum();
        let share = total / recipients.len() as i64;
        let outputs = recipients
            .iter()
            .map(|r| Output::native(native, Fixed64::new(share), identity(*r)))
            .collect();
        let block = block_after(
            Some(&genesis),
            vec![
                coinbase(1, vec![Output::native(native, Fixed64::new(7), identity(30))]),
                transfer(&spends, outputs),
            ],
        );

        chain.apply_block(&block).unwrap();
        prop_assert!(chain.view().audit_unspent_index().unwrap().is_consistent());
        chain.unapply_block(&block).unwrap();
        prop_assert_eq!(kv.dump(), before);
    }

    /// The native fee equals the sum of spent values minus the sum of outputs.
    #[test]
    fn fee_matches_input_output_difference(
        amounts in prop::collection::vec(1i64..1_000_000_000, 1..6),
        outputs in prop::collection::vec(0i64..1_000_000_000, 0..6),
    ) {
        let (_kv, chain, genesis) = funded_chain(&amounts);
        let native = chain.params().native_asset_id;
        let coinbase_id = genesis.transactions[0].hash();
        let spends: Vec<OutPoint> = (0..amounts.len() as u16)
            .map(|i| OutPoint::new(coinbase_id, i))
            .collect();
        let tx = transfer(
            &spends,
            outputs
                .iter()
                .map(|v| Output::native(native, Fixed64::new(*v), identity(40)))
                .collect(),
        );

        let view = chain.view();
        let fee = FeeAccountant::new(&view).native_fee(&tx).unwrap();
        let expected = amounts.iter().sum::<i64>() - outputs.iter().sum::<i64>();
        prop_assert_eq!(fee, SignedAmount::from(Fixed64::new(expected)));
    }
}
