use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("embedded main chain transaction could not be decoded: {0}")]
    ForeignDecode(#[from] bincode::Error),

    #[error("embedded main chain transaction is not a cross-chain transfer")]
    NotCrossChainTransfer,

    #[error("cross-chain output index {index} out of range ({len} outputs)")]
    ForeignOutputOutOfRange { index: u64, len: usize },

    #[error("cross-chain payload lists differ in length")]
    CrossChainListMismatch,
}
