//! Transactions and blocks of the token sidechain.
//!
//! Transaction types:
//! - **Coinbase**: block reward, split between miner and foundation
//! - **RegisterAsset**: declares a new token and mints its supply to a controller
//! - **Transfer**: moves native coin and tokens between identities
//! - **Record**: carries arbitrary data, moves value like a transfer
//! - **Deposit**: mints native coin against a proven main chain transfer
//! - **Withdrawal**: sends native coin back to main chain addresses

pub mod block;
mod codec;
pub mod error;
pub mod foreign;
pub mod output;
pub mod payload;
pub mod transaction;
pub mod verify;

pub use block::{merkle_root, Block, Header};
pub use error::TransactionError;
pub use foreign::{CrossChainTransferPayload, ForeignOutput, ForeignTransaction};
pub use output::{Input, OutPoint, Output, LOCKED_INPUT_SEQUENCE, MAX_OUTPUTS};
pub use payload::{
    AssetDescriptor, AssetType, DepositPayload, Payload, RegisterAssetPayload,
    WithdrawalPayload,
};
pub use tokenchain_types::TxType;
pub use transaction::{Attribute, Program, Transaction};
pub use verify::ProgramVerifier;
