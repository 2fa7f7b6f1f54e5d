//! The main chain transaction embedded in a deposit.
//!
//! Only the parts needed to price a deposit are modelled: the cross-chain
//! transfer payload naming side chain target addresses, and the main chain
//! outputs those targets are paid from.

use serde::{Deserialize, Serialize};
use tokenchain_types::{AssetId, Fixed64, ProgramHash};

use crate::TransactionError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainTransferPayload {
    /// Side chain target addresses.
    pub cross_chain_addresses: Vec<String>,
    /// For each target, the index of the main chain output funding it.
    pub output_indexes: Vec<u64>,
    pub cross_chain_amounts: Vec<Fixed64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignOutput {
    pub asset_id: AssetId,
    pub value: Fixed64,
    pub program_hash: ProgramHash,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignTransaction {
    pub payload: CrossChainTransferPayload,
    pub outputs: Vec<ForeignOutput>,
}

impl ForeignTransaction {
    pub fn encode(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TransactionError> {
        let tx: Self = bincode::deserialize(bytes)?;
        let p = &tx.payload;
        if p.cross_chain_addresses.len() != p.output_indexes.len() {
            return Err(TransactionError::CrossChainListMismatch);
        }
        Ok(tx)
    }

    /// Main chain value funding the `i`-th cross-chain target.
    pub fn target_amount(&self, i: usize) -> Result<Fixed64, TransactionError> {
        let index = *self
            .payload
            .output_indexes
            .get(i)
            .ok_or(TransactionError::CrossChainListMismatch)?;
        self.outputs
            .get(index as usize)
            .map(|o| o.value)
            .ok_or(TransactionError::ForeignOutputOutOfRange {
                index,
                len: self.outputs.len(),
            })
    }
}
