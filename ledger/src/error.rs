use thiserror::Error;
use tokenchain_store::StoreError;
use tokenchain_transactions::{OutPoint, TransactionError};
use tokenchain_types::{AssetId, BlockHash, ProgramHash, TxHash};

/// Coarse classification of failures, for callers deciding whether to drop
/// a transaction, penalise a peer or refuse a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed transaction; reject it, the store is untouched.
    Structural,
    /// Unknown or out-of-range previous output.
    Reference,
    /// The stored state contradicts itself or the block being applied.
    LedgerInvariant,
    /// Fee, balance, reward or maturity rule violated.
    Economic,
    /// Deposit already consumed.
    Replay,
    /// Signature or withdrawal authorisation failed.
    Authorization,
    /// Backend or encoding failure.
    Storage,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("referenced transaction {tx} is unknown")]
    UnknownReference { tx: TxHash },

    #[error("reference {outpoint} out of range: transaction has {outputs} outputs")]
    ReferenceOutOfRange { outpoint: OutPoint, outputs: usize },

    #[error("UTXO not found for spend: {outpoint}")]
    UtxoNotFound { outpoint: OutPoint },

    #[error("UTXO bucket missing for {owner:?} asset {asset} at height {height}")]
    UtxoBucketMissing {
        owner: ProgramHash,
        asset: AssetId,
        height: u32,
    },

    #[error("output {outpoint} is not in the unspent index")]
    AlreadySpent { outpoint: OutPoint },

    #[error("output {outpoint} is already in the unspent index")]
    AlreadyUnspent { outpoint: OutPoint },

    #[error("asset name {0:?} is reserved")]
    ReservedAssetName(String),

    #[error("asset name {0:?} is already registered")]
    DuplicateAssetName(String),

    #[error("asset {0} is not registered")]
    AssetNotFound(AssetId),

    #[error("the native asset cannot be unregistered")]
    NativeAssetRollback,

    #[error("transaction {0} is already stored")]
    DuplicateTransaction(TxHash),

    #[error("deposit {0} has already been consumed")]
    DepositAlreadyConsumed(TxHash),

    #[error("block at height {height} does not extend the tip (tip height {tip_height:?})")]
    DoesNotExtendTip { height: u32, tip_height: Option<u32> },

    #[error("block {0} is not the current tip")]
    NotTip(BlockHash),

    #[error("the genesis block cannot be unapplied")]
    GenesisRollback,

    #[error("transaction {tx} has {outputs} outputs, more than an outpoint can address")]
    TooManyOutputs { tx: TxHash, outputs: usize },

    #[error("invalid transaction payload: {0}")]
    Payload(#[from] TransactionError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::UnknownReference { .. } | LedgerError::ReferenceOutOfRange { .. } => {
                ErrorKind::Reference
            }
            LedgerError::DepositAlreadyConsumed(_) => ErrorKind::Replay,
            LedgerError::Payload(_) | LedgerError::TooManyOutputs { .. } => {
                ErrorKind::Structural
            }
            LedgerError::Storage(_) => ErrorKind::Storage,
            _ => ErrorKind::LedgerInvariant,
        }
    }
}

pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}
