//! Errors raised while decoding fundamental types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("address checksum mismatch")]
    AddressChecksum,

    #[error("unknown transaction type: {0}")]
    UnknownTxType(String),
}
