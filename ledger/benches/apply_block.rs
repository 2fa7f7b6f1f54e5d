use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tokenchain_ledger::ChainStore;
use tokenchain_nullables::fixtures::{block_after, coinbase, identity, transfer};
use tokenchain_nullables::NullStore;
use tokenchain_transactions::{Block, OutPoint, Output};
use tokenchain_types::{ChainParams, Fixed64};

/// A chain whose genesis funds `n` outputs, and a block spending each of
/// them in its own transfer.
fn chain_with_spends(n: u16) -> (ChainStore, Block) {
    let params = ChainParams::default();
    let native = params.native_asset_id;
    let chain = ChainStore::open(Arc::new(NullStore::new()), params).unwrap();
    let outputs = (0..n)
        .map(|i| Output::native(native, Fixed64::new(1_000_000), identity((i % 200) as u8 + 1)))
        .collect();
    let genesis = block_after(None, vec![coinbase(0, outputs)]);
    chain.apply_block(&genesis).unwrap();

    let coinbase_id = genesis.transactions[0].hash();
    let mut txs = vec![coinbase(
        1,
        vec![Output::native(native, Fixed64::new(5), identity(250))],
    )];
    txs.extend((0..n).map(|i| {
        transfer(
            &[OutPoint::new(coinbase_id, i)],
            vec![Output::native(native, Fixed64::new(999_900), identity(251))],
        )
    }));
    let block = block_after(Some(&genesis), txs);
    (chain, block)
}

fn bench_apply_unapply(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_store");

    for tx_count in [10u16, 100, 1000] {
        let (chain, block) = chain_with_spends(tx_count);
        group.bench_with_input(
            BenchmarkId::new("apply_unapply", tx_count),
            &tx_count,
            |b, _| {
                b.iter(|| {
                    chain.apply_block(black_box(&block)).unwrap();
                    chain.unapply_block(black_box(&block)).unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_apply_unapply);
criterion_main!(benches);
