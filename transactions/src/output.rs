//! Inputs, outpoints and outputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokenchain_types::{AssetId, Fixed64, ProgramHash, TokenValue, TxHash};

/// Sequence value that opts an input into output-lock checking.
pub const LOCKED_INPUT_SEQUENCE: u32 = 0xffff_fffe;

/// Outpoint indices are `u16`, which bounds the outputs of one transaction.
pub const MAX_OUTPUTS: usize = u16::MAX as usize + 1;

/// A reference to one output of a prior transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub tx_id: TxHash,
    pub index: u16,
}

impl OutPoint {
    pub fn new(tx_id: TxHash, index: u16) -> Self {
        Self { tx_id, index }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.index)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub previous: OutPoint,
    pub sequence: u32,
}

impl Input {
    pub fn new(tx_id: TxHash, index: u16) -> Self {
        Self {
            previous: OutPoint::new(tx_id, index),
            sequence: u32::MAX,
        }
    }
}

/// A transaction output.
///
/// Exactly one of `value` (native asset) and `token_value` (any other asset)
/// is meaningful, selected by `asset_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub asset_id: AssetId,
    pub value: Fixed64,
    pub token_value: TokenValue,
    /// Height before which the output cannot be spent; zero means unlocked.
    pub output_lock: u32,
    pub program_hash: ProgramHash,
}

impl Output {
    pub fn native(asset_id: AssetId, value: Fixed64, program_hash: ProgramHash) -> Self {
        Self {
            asset_id,
            value,
            token_value: TokenValue::zero(),
            output_lock: 0,
            program_hash,
        }
    }

    pub fn token(asset_id: AssetId, token_value: TokenValue, program_hash: ProgramHash) -> Self {
        Self {
            asset_id,
            value: Fixed64::ZERO,
            token_value,
            output_lock: 0,
            program_hash,
        }
    }

    pub fn with_lock(mut self, output_lock: u32) -> Self {
        self.output_lock = output_lock;
        self
    }
}
