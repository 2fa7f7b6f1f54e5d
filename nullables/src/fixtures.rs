//! Builders for deterministic transactions and blocks.
//!
//! Every builder produces structurally valid values; the chain state they
//! are applied to decides whether they are acceptable.

use tokenchain_transactions::{
    AssetDescriptor, AssetType, Block, CrossChainTransferPayload, DepositPayload, ForeignOutput,
    ForeignTransaction, Input, OutPoint, Output, Payload, RegisterAssetPayload, Transaction,
    WithdrawalPayload,
};
use tokenchain_types::address::PREFIX_STANDARD;
use tokenchain_types::{AssetId, BlockHash, Fixed64, ProgramHash, TokenValue, U256};

/// A standard recipient derived from one byte.
pub fn identity(n: u8) -> ProgramHash {
    ProgramHash::with_prefix(PREFIX_STANDARD, [n; 20])
}

/// Whole coins as a native amount.
pub fn coins(n: i64) -> Fixed64 {
    Fixed64::new(n * Fixed64::ONE.raw())
}

/// `n` whole tokens at eighteen decimals.
pub fn tokens(n: u64) -> TokenValue {
    U256::from(n) * U256::exp10(18)
}

pub fn native_output(asset: AssetId, value: Fixed64, to: ProgramHash) -> Output {
    Output::native(asset, value, to)
}

/// A coinbase paying `outputs`. The height goes into the coinbase data so
/// coinbases at different heights never share a hash.
pub fn coinbase(height: u32, outputs: Vec<Output>) -> Transaction {
    Transaction::new(
        Payload::Coinbase {
            coinbase_data: height.to_le_bytes().to_vec(),
        },
        Vec::new(),
        outputs,
    )
}

/// A coinbase giving 30% of `total` to `foundation` and the rest to `miner`.
pub fn split_coinbase(
    height: u32,
    native: AssetId,
    total: Fixed64,
    foundation: ProgramHash,
    miner: ProgramHash,
) -> Transaction {
    let share = Fixed64::new(total.raw() * 3 / 10);
    let rest = Fixed64::new(total.raw() - share.raw());
    coinbase(
        height,
        vec![
            Output::native(native, share, foundation),
            Output::native(native, rest, miner),
        ],
    )
}

pub fn transfer(spends: &[OutPoint], outputs: Vec<Output>) -> Transaction {
    Transaction::new(Payload::Transfer, inputs(spends), outputs)
}

pub fn record(spends: &[OutPoint], outputs: Vec<Output>, data: &[u8]) -> Transaction {
    Transaction::new(
        Payload::Record {
            record_type: "note".to_string(),
            data: data.to_vec(),
        },
        inputs(spends),
        outputs,
    )
}

pub fn asset_descriptor(name: &str, precision: u8) -> AssetDescriptor {
    AssetDescriptor {
        name: name.to_string(),
        description: format!("{name} test asset"),
        precision,
        asset_type: AssetType::Token,
    }
}

/// A registration funded by `spends`, minting `minted` to the controller
/// under the descriptor's asset id.
pub fn register_asset(
    descriptor: AssetDescriptor,
    amount: Fixed64,
    controller: ProgramHash,
    minted: TokenValue,
    spends: &[OutPoint],
    mut outputs: Vec<Output>,
) -> Transaction {
    outputs.push(Output::token(descriptor.id(), minted, controller));
    Transaction::new(
        Payload::RegisterAsset(RegisterAssetPayload {
            asset: descriptor,
            amount,
            controller,
        }),
        inputs(spends),
        outputs,
    )
}

/// A main chain transfer paying `amount` to `target` on the side chain.
pub fn foreign_transfer(native: AssetId, target: &ProgramHash, amount: Fixed64) -> ForeignTransaction {
    ForeignTransaction {
        payload: CrossChainTransferPayload {
            cross_chain_addresses: vec![target.to_address()],
            output_indexes: vec![0],
            cross_chain_amounts: vec![amount],
        },
        outputs: vec![ForeignOutput {
            asset_id: native,
            value: amount,
            program_hash: ProgramHash::BURN,
        }],
    }
}

pub fn deposit(foreign: &ForeignTransaction, outputs: Vec<Output>) -> Transaction {
    Transaction::new(
        Payload::Deposit(DepositPayload {
            merkle_proof: vec![0u8; 32],
            main_chain_transaction: foreign.encode().unwrap_or_default(),
        }),
        Vec::new(),
        outputs,
    )
}

pub fn withdrawal(
    spends: &[OutPoint],
    outputs: Vec<Output>,
    targets: Vec<(String, u64, Fixed64)>,
) -> Transaction {
    let mut payload = WithdrawalPayload::default();
    for (address, index, amount) in targets {
        payload.cross_chain_addresses.push(address);
        payload.output_indexes.push(index);
        payload.cross_chain_amounts.push(amount);
    }
    Transaction::new(Payload::Withdrawal(payload), inputs(spends), outputs)
}

/// A block extending `parent`, or the genesis block when there is none.
pub fn block_after(parent: Option<&Block>, transactions: Vec<Transaction>) -> Block {
    match parent {
        Some(p) => Block::new(p.hash(), p.height() + 1, transactions),
        None => Block::new(BlockHash::ZERO, 0, transactions),
    }
}

fn inputs(spends: &[OutPoint]) -> Vec<Input> {
    spends
        .iter()
        .map(|o| Input::new(o.tx_id, o.index))
        .collect()
}
