//! Recipient identities (program hashes) and their address encoding.
//!
//! A program hash is 21 bytes: a one-byte class prefix followed by the
//! 20-byte hash of the redeem program. Addresses are the base58 encoding of
//! the program hash followed by a 4-byte double SHA-256 checksum. Ledger
//! bookkeeping works on raw program hashes; addresses only appear where an
//! external party names a recipient by string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::hash::double_sha256;
use crate::TypesError;

pub const PROGRAM_HASH_LEN: usize = 21;

/// Standard single-signature address class.
pub const PREFIX_STANDARD: u8 = 0x21;
/// Multi-signature address class.
pub const PREFIX_MULTISIG: u8 = 0x12;
/// Cross-chain (withdrawal) address class.
pub const PREFIX_CROSS_CHAIN: u8 = 0x4b;
/// Identity registration address class.
pub const PREFIX_REGISTER_ID: u8 = 0x67;

/// The identity an output pays to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProgramHash([u8; PROGRAM_HASH_LEN]);

impl Default for ProgramHash {
    fn default() -> Self {
        Self::BURN
    }
}

impl ProgramHash {
    /// The all-zero identity. Outputs paid here are unspendable.
    pub const BURN: Self = Self([0u8; PROGRAM_HASH_LEN]);

    pub fn new(bytes: [u8; PROGRAM_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a program hash of the given class from a 20-byte body.
    pub fn with_prefix(prefix: u8, body: [u8; 20]) -> Self {
        let mut bytes = [0u8; PROGRAM_HASH_LEN];
        bytes[0] = prefix;
        bytes[1..].copy_from_slice(&body);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PROGRAM_HASH_LEN] {
        &self.0
    }

    pub fn prefix(&self) -> u8 {
        self.0[0]
    }

    pub fn is_burn(&self) -> bool {
        *self == Self::BURN
    }

    /// Whether this identity belongs to one of the recognised address
    /// classes, or is the burn identity.
    pub fn is_valid_recipient(&self) -> bool {
        matches!(
            self.prefix(),
            PREFIX_STANDARD | PREFIX_MULTISIG | PREFIX_CROSS_CHAIN | PREFIX_REGISTER_ID
        ) || self.is_burn()
    }

    /// Encode as a base58 address string.
    pub fn to_address(&self) -> String {
        let checksum = double_sha256(&self.0);
        let mut data = Vec::with_capacity(PROGRAM_HASH_LEN + 4);
        data.extend_from_slice(&self.0);
        data.extend_from_slice(&checksum[..4]);
        bs58::encode(data).into_string()
    }

    /// Decode a base58 address string, verifying its checksum.
    pub fn from_address(address: &str) -> Result<Self, TypesError> {
        let data = bs58::decode(address)
            .into_vec()
            .map_err(|e| TypesError::InvalidAddress(e.to_string()))?;
        if data.len() != PROGRAM_HASH_LEN + 4 {
            return Err(TypesError::InvalidLength {
                expected: PROGRAM_HASH_LEN + 4,
                actual: data.len(),
            });
        }
        let (body, checksum) = data.split_at(PROGRAM_HASH_LEN);
        if double_sha256(body)[..4] != *checksum {
            return Err(TypesError::AddressChecksum);
        }
        let mut bytes = [0u8; PROGRAM_HASH_LEN];
        bytes.copy_from_slice(body);
        Ok(Self(bytes))
    }
}

impl fmt::Debug for ProgramHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProgramHash({})", hex::encode(&self.0[..5]))
    }
}

impl fmt::Display for ProgramHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

impl FromStr for ProgramHash {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_address(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trip() {
        let hash = ProgramHash::with_prefix(PREFIX_STANDARD, [7u8; 20]);
        let address = hash.to_address();
        assert_eq!(ProgramHash::from_address(&address).unwrap(), hash);
    }

    #[test]
    fn corrupted_address_fails_checksum() {
        let hash = ProgramHash::with_prefix(PREFIX_STANDARD, [7u8; 20]);
        let mut data = bs58::decode(hash.to_address()).into_vec().unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        let corrupted = bs58::encode(data).into_string();
        assert_eq!(
            ProgramHash::from_address(&corrupted),
            Err(TypesError::AddressChecksum)
        );
    }

    #[test]
    fn recognised_classes() {
        assert!(ProgramHash::BURN.is_valid_recipient());
        assert!(ProgramHash::with_prefix(PREFIX_MULTISIG, [1; 20]).is_valid_recipient());
        assert!(ProgramHash::with_prefix(PREFIX_CROSS_CHAIN, [1; 20]).is_valid_recipient());
        assert!(!ProgramHash::with_prefix(0x99, [1; 20]).is_valid_recipient());
    }
}
