use thiserror::Error;

use tokenchain_transactions::OutPoint;
use tokenchain_types::{BlockHash, TxHash};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] tokenchain_ledger::LedgerError),

    #[error("fee error: {0}")]
    Fee(#[from] tokenchain_ledger::FeeError),

    #[error("validation error: {0}")]
    Validation(#[from] tokenchain_validator::ValidationError),

    #[error("store error: {0}")]
    Store(#[from] tokenchain_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] tokenchain_store_lmdb::LmdbError),

    #[error("integrity check failed: {}", .0.join("; "))]
    Integrity(Vec<String>),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("node not initialized")]
    NotInitialized,

    #[error("stored genesis {stored} differs from {expected}")]
    GenesisMismatch { stored: BlockHash, expected: BlockHash },

    #[error("block {0} is not stored")]
    BlockNotFound(BlockHash),

    #[error("transaction {0} is already pooled")]
    AlreadyPooled(TxHash),

    #[error("{outpoint} is already spent by pooled transaction {holder}")]
    PoolConflict { outpoint: OutPoint, holder: TxHash },

    #[error("deposit of {foreign} is already pooled in {holder}")]
    DepositConflict { foreign: TxHash, holder: TxHash },

    #[error("transaction pool is full ({0} entries)")]
    PoolFull(usize),
}
