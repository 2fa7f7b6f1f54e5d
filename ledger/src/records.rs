//! Records persisted by the chain store.

use serde::{Deserialize, Serialize};
use tokenchain_transactions::{AssetType, Block, OutPoint, Output, Transaction};
use tokenchain_types::{
    token_string, AssetId, BlockHash, Fixed64, ProgramHash, SignedAmount, TokenValue, TxHash,
};

/// The value carried by an unspent output, in its asset's domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UtxoValue {
    Native(Fixed64),
    Token(TokenValue),
}

impl UtxoValue {
    pub fn of_output(output: &Output, native_asset: &AssetId) -> Self {
        if output.asset_id == *native_asset {
            UtxoValue::Native(output.value)
        } else {
            UtxoValue::Token(output.token_value)
        }
    }

    pub fn to_signed(&self) -> SignedAmount {
        match self {
            UtxoValue::Native(v) => SignedAmount::from(*v),
            UtxoValue::Token(v) => SignedAmount::positive(*v),
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            UtxoValue::Native(v) => v.is_positive(),
            UtxoValue::Token(v) => !v.is_zero(),
        }
    }
}

/// One unspent output in an ownership bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoRecord {
    pub tx_id: TxHash,
    pub index: u16,
    pub asset_id: AssetId,
    pub value: UtxoValue,
}

impl UtxoRecord {
    pub fn from_output(tx_id: TxHash, index: u16, output: &Output, native_asset: &AssetId) -> Self {
        Self {
            tx_id,
            index,
            asset_id: output.asset_id,
            value: UtxoValue::of_output(output, native_asset),
        }
    }

    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.tx_id, self.index)
    }

    /// Decimal rendering: eight places for the native asset, eighteen for tokens.
    pub fn value_string(&self) -> String {
        match &self.value {
            UtxoValue::Native(v) => v.to_string(),
            UtxoValue::Token(v) => token_string(v),
        }
    }
}

/// The records stored under one `(owner, asset, height)` key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UtxoBucket {
    pub owner: ProgramHash,
    pub asset_id: AssetId,
    pub height: u32,
    pub records: Vec<UtxoRecord>,
}

/// A registered asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub name: String,
    pub description: String,
    pub precision: u8,
    pub asset_type: AssetType,
    pub controller: ProgramHash,
    pub height: u32,
    pub registered_by: TxHash,
}

/// A committed transaction and the height of its block.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub height: u32,
    pub tx: Transaction,
}

/// The last applied block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTip {
    pub height: u32,
    pub hash: BlockHash,
}

impl ChainTip {
    pub fn of(block: &Block) -> Self {
        Self {
            height: block.height(),
            hash: block.hash(),
        }
    }
}
