use thiserror::Error;
use tokenchain_ledger::{ErrorKind, FeeError, LedgerError};
use tokenchain_transactions::{OutPoint, TransactionError};
use tokenchain_types::{AssetId, Fixed64, SignedAmount, TxHash, TxType};

#[derive(Debug, Error)]
pub enum ValidationError {
    // Shape of the transaction itself.
    #[error("{tx_type} transaction carries a {payload} payload")]
    PayloadMismatch { tx_type: TxType, payload: TxType },

    #[error("{0} transaction must not have inputs")]
    UnexpectedInputs(TxType),

    #[error("transaction has no inputs")]
    NoInputs,

    #[error("transaction has no outputs")]
    NoOutputs,

    #[error("transaction has {count} outputs, limit is {limit}")]
    TooManyOutputs { count: usize, limit: usize },

    #[error("coinbase output {index} pays asset {asset}, only the native asset is minted")]
    CoinbaseTokenOutput { index: usize, asset: AssetId },

    #[error("coinbase needs at least 2 outputs, has {0}")]
    CoinbaseOutputs(usize),

    #[error("output {index}: value in the wrong field for asset {asset}")]
    InvalidOutputValue { index: usize, asset: AssetId },

    #[error("output {index}: cross-chain transactions may only move the native asset")]
    CrossChainTokenOutput { index: usize },

    #[error("output {index}: recipient is not a recognised address class")]
    InvalidRecipient { index: usize },

    #[error("output {index}: asset {asset} is not registered")]
    UnknownAsset { index: usize, asset: AssetId },

    #[error("output {index}: amount is finer than the asset precision {precision}")]
    InvalidPrecision { index: usize, precision: u8 },

    #[error("asset precision {0} is out of range")]
    InvalidAssetPrecision(u8),

    #[error("asset name or description is not ASCII")]
    NonAsciiAsset,

    #[error("asset name {0:?} is already registered")]
    AssetNameTaken(String),

    #[error("withdrawal payload lists differ in length")]
    WithdrawalListMismatch,

    #[error("malformed deposit: {0}")]
    MalformedDeposit(#[from] TransactionError),

    #[error("coinbase transactions cannot be submitted on their own")]
    CoinbaseNotSubmittable,

    #[error("transaction {0} is already known")]
    DuplicateTransaction(TxHash),

    // References to previous outputs.
    #[error("output {outpoint} is already spent")]
    DoubleSpend { outpoint: OutPoint },

    // Economic rules.
    #[error("foundation receives {foundation} of coinbase total {total}, below 30%")]
    FoundationReward { foundation: Fixed64, total: Fixed64 },

    #[error("coinbase output {outpoint} has {confirmations} confirmations, needs {required}")]
    IneffectiveCoinbase {
        outpoint: OutPoint,
        confirmations: u32,
        required: u32,
    },

    #[error("input spending {outpoint} must use the locked sequence")]
    InvalidInputSequence { outpoint: OutPoint },

    #[error("output {outpoint} is locked until {lock}")]
    OutputLocked { outpoint: OutPoint, lock: u32 },

    #[error("native fee {actual} below minimum {required}")]
    InsufficientFee {
        required: Fixed64,
        actual: SignedAmount,
    },

    #[error("asset {asset} is not balanced: fee {fee}")]
    TokenImbalance { asset: AssetId, fee: SignedAmount },

    #[error("output {index} of the registration does not pay the controller")]
    RegistrationController { index: usize },

    #[error("registration mints {actual}, payload declares {expected}")]
    RegistrationAmount { expected: String, actual: String },

    #[error("coinbase pays {reward}, block fees total {fees}")]
    RewardMismatch { reward: Fixed64, fees: SignedAmount },

    // Ledger state.
    #[error("referenced output {outpoint} holds no value")]
    InvalidReferencedOutput { outpoint: OutPoint },

    #[error("deposit {0} has already been consumed")]
    DepositReplay(TxHash),

    // Authorisation.
    #[error("program verification failed")]
    SignatureRejected,

    #[error("invalid withdrawal: {0}")]
    InvalidWithdrawal(String),

    // Block level.
    #[error("block has no transactions")]
    EmptyBlock,

    #[error("block has {count} transactions, limit is {limit}")]
    TooManyTransactions { count: usize, limit: usize },

    #[error("first transaction of the block is not a coinbase")]
    MissingCoinbase,

    #[error("second coinbase at position {0}")]
    CoinbaseMisplaced(usize),

    #[error("merkle root does not match the transactions")]
    MerkleMismatch,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Fee(#[from] FeeError),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        use ValidationError::*;
        match self {
            PayloadMismatch { .. }
            | UnexpectedInputs(_)
            | NoInputs
            | NoOutputs
            | TooManyOutputs { .. }
            | CoinbaseTokenOutput { .. }
            | CoinbaseOutputs(_)
            | InvalidOutputValue { .. }
            | CrossChainTokenOutput { .. }
            | InvalidRecipient { .. }
            | UnknownAsset { .. }
            | InvalidPrecision { .. }
            | InvalidAssetPrecision(_)
            | NonAsciiAsset
            | AssetNameTaken(_)
            | WithdrawalListMismatch
            | MalformedDeposit(_)
            | CoinbaseNotSubmittable
            | DuplicateTransaction(_)
            | EmptyBlock
            | TooManyTransactions { .. }
            | MissingCoinbase
            | CoinbaseMisplaced(_)
            | MerkleMismatch => ErrorKind::Structural,
            DoubleSpend { .. } => ErrorKind::Reference,
            FoundationReward { .. }
            | IneffectiveCoinbase { .. }
            | InvalidInputSequence { .. }
            | OutputLocked { .. }
            | InsufficientFee { .. }
            | TokenImbalance { .. }
            | RegistrationController { .. }
            | RegistrationAmount { .. }
            | RewardMismatch { .. } => ErrorKind::Economic,
            InvalidReferencedOutput { .. } => ErrorKind::LedgerInvariant,
            DepositReplay(_) => ErrorKind::Replay,
            SignatureRejected | InvalidWithdrawal(_) => ErrorKind::Authorization,
            Ledger(e) => e.kind(),
            Fee(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenchain_store::StoreError;

    #[test]
    fn wrapped_errors_keep_their_kind() {
        let missing = ValidationError::from(LedgerError::UnknownReference { tx: TxHash::ZERO });
        assert_eq!(missing.kind(), ErrorKind::Reference);

        let storage = ValidationError::from(FeeError::Ledger(LedgerError::Storage(
            StoreError::Backend("down".into()),
        )));
        assert_eq!(storage.kind(), ErrorKind::Storage);

        assert_eq!(ValidationError::DepositReplay(TxHash::ZERO).kind(), ErrorKind::Replay);
    }
}
