//! Transaction type tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// The kind of a transaction. Determines which payload it carries and which
/// validation rules apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    Coinbase,
    RegisterAsset,
    Transfer,
    Record,
    /// Cross-chain deposit from the main chain.
    Deposit,
    /// Cross-chain withdrawal to the main chain.
    Withdrawal,
}

impl TxType {
    pub const ALL: [TxType; 6] = [
        TxType::Coinbase,
        TxType::RegisterAsset,
        TxType::Transfer,
        TxType::Record,
        TxType::Deposit,
        TxType::Withdrawal,
    ];

    /// Wire tag.
    pub fn as_u8(self) -> u8 {
        match self {
            TxType::Coinbase => 0x00,
            TxType::RegisterAsset => 0x01,
            TxType::Transfer => 0x02,
            TxType::Record => 0x03,
            TxType::Deposit => 0x06,
            TxType::Withdrawal => 0x08,
        }
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_u8() == tag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TxType::Coinbase => "coinbase",
            TxType::RegisterAsset => "register_asset",
            TxType::Transfer => "transfer",
            TxType::Record => "record",
            TxType::Deposit => "deposit",
            TxType::Withdrawal => "withdrawal",
        }
    }

    /// Deposit and withdrawal move the native asset across chains.
    pub fn is_cross_chain(self) -> bool {
        matches!(self, TxType::Deposit | TxType::Withdrawal)
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TypesError::UnknownTxType(s.to_string()))
    }
}
