//! Type-specific transaction payloads.

use serde::{Deserialize, Serialize};
use tokenchain_types::{AssetId, Fixed64, ProgramHash, TxHash, TxType};

use crate::codec::Encoder;
use crate::foreign::ForeignTransaction;
use crate::TransactionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Token,
    Share,
}

/// The declared attributes of an asset, as carried by a registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub name: String,
    pub description: String,
    pub precision: u8,
    pub asset_type: AssetType,
}

impl AssetDescriptor {
    /// The asset id: double SHA-256 over the descriptor.
    pub fn id(&self) -> AssetId {
        let mut enc = Encoder::new();
        enc.var_bytes(self.name.as_bytes())
            .var_bytes(self.description.as_bytes())
            .u8(self.precision)
            .u8(match self.asset_type {
                AssetType::Token => 0,
                AssetType::Share => 1,
            });
        AssetId::from(TxHash::digest(&enc.finish()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAssetPayload {
    pub asset: AssetDescriptor,
    /// Mint amount in whole-asset fixed-point units (10^-8).
    pub amount: Fixed64,
    /// Identity allowed to receive the minted value.
    pub controller: ProgramHash,
}

/// A deposit from the main chain, proven by the embedded main chain transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPayload {
    pub merkle_proof: Vec<u8>,
    pub main_chain_transaction: Vec<u8>,
}

impl DepositPayload {
    /// Hash identifying the main chain transaction for replay protection.
    pub fn foreign_tx_hash(&self) -> TxHash {
        TxHash::digest(&self.main_chain_transaction)
    }

    pub fn decode_foreign(&self) -> Result<ForeignTransaction, TransactionError> {
        ForeignTransaction::decode(&self.main_chain_transaction)
    }
}

/// A withdrawal to main chain addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalPayload {
    pub cross_chain_addresses: Vec<String>,
    pub output_indexes: Vec<u64>,
    pub cross_chain_amounts: Vec<Fixed64>,
}

impl WithdrawalPayload {
    pub fn lists_consistent(&self) -> bool {
        self.cross_chain_addresses.len() == self.output_indexes.len()
            && self.output_indexes.len() == self.cross_chain_amounts.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Coinbase { coinbase_data: Vec<u8> },
    RegisterAsset(RegisterAssetPayload),
    Transfer,
    Record { record_type: String, data: Vec<u8> },
    Deposit(DepositPayload),
    Withdrawal(WithdrawalPayload),
}

impl Payload {
    /// The transaction type this payload belongs to.
    pub fn tx_type(&self) -> TxType {
        match self {
            Payload::Coinbase { .. } => TxType::Coinbase,
            Payload::RegisterAsset(_) => TxType::RegisterAsset,
            Payload::Transfer => TxType::Transfer,
            Payload::Record { .. } => TxType::Record,
            Payload::Deposit(_) => TxType::Deposit,
            Payload::Withdrawal(_) => TxType::Withdrawal,
        }
    }

    pub(crate) fn encode(&self, enc: &mut Encoder) {
        enc.u8(self.tx_type().as_u8());
        match self {
            Payload::Coinbase { coinbase_data } => {
                enc.var_bytes(coinbase_data);
            }
            Payload::RegisterAsset(p) => {
                enc.fixed(p.asset.id().as_bytes())
                    .i64(p.amount.raw())
                    .fixed(p.controller.as_bytes());
            }
            Payload::Transfer => {}
            Payload::Record { record_type, data } => {
                enc.var_bytes(record_type.as_bytes()).var_bytes(data);
            }
            Payload::Deposit(p) => {
                enc.var_bytes(&p.merkle_proof)
                    .var_bytes(&p.main_chain_transaction);
            }
            Payload::Withdrawal(p) => {
                enc.u32(p.cross_chain_addresses.len() as u32);
                for address in &p.cross_chain_addresses {
                    enc.var_bytes(address.as_bytes());
                }
                enc.u32(p.output_indexes.len() as u32);
                for index in &p.output_indexes {
                    enc.u64(*index);
                }
                enc.u32(p.cross_chain_amounts.len() as u32);
                for amount in &p.cross_chain_amounts {
                    enc.i64(amount.raw());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, precision: u8) -> AssetDescriptor {
        AssetDescriptor {
            name: name.to_string(),
            description: "test token".to_string(),
            precision,
            asset_type: AssetType::Token,
        }
    }

    #[test]
    fn asset_id_depends_on_name_and_precision() {
        let a = descriptor("GOLD", 8);
        assert_eq!(a.id(), descriptor("GOLD", 8).id());
        assert_ne!(a.id(), descriptor("SILVER", 8).id());
        assert_ne!(a.id(), descriptor("GOLD", 6).id());
    }

    #[test]
    fn payload_reports_its_type() {
        assert_eq!(Payload::Transfer.tx_type(), TxType::Transfer);
        assert_eq!(
            Payload::Withdrawal(WithdrawalPayload::default()).tx_type(),
            TxType::Withdrawal
        );
    }

    #[test]
    fn withdrawal_list_consistency() {
        let mut p = WithdrawalPayload {
            cross_chain_addresses: vec!["a".into()],
            output_indexes: vec![0],
            cross_chain_amounts: vec![Fixed64::new(1)],
        };
        assert!(p.lists_consistent());
        p.output_indexes.push(1);
        assert!(!p.lists_consistent());
    }
}
