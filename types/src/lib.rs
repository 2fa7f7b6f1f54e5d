//! Fundamental types for the token sidechain.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! hashes, recipient identities, amounts, transaction type tags and chain parameters.

pub mod address;
pub mod amount;
pub mod block;
pub mod error;
pub mod hash;
pub mod params;
pub mod tx_type;

pub use address::ProgramHash;
pub use amount::{
    token_string, Fixed64, SignedAmount, TokenValue, NATIVE_PRECISION, TOKEN_PRECISION,
};
pub use block::BlockHash;
pub use error::TypesError;
pub use hash::{double_sha256, AssetId, TxHash};
pub use params::{ChainParams, NATIVE_ASSET_NAME};
pub use tx_type::TxType;

/// Re-exported so downstream crates share one `U256`.
pub use primitive_types::U256;
