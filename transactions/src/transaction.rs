//! The transaction body.

use serde::{Deserialize, Serialize};
use tokenchain_types::{Fixed64, TxHash, TxType};

use crate::codec::Encoder;
use crate::output::{Input, OutPoint, Output};
use crate::payload::{DepositPayload, Payload, RegisterAssetPayload, WithdrawalPayload};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub usage: u8,
    pub data: Vec<u8>,
}

/// An unlocking program: the redeem script and its signature parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub code: Vec<u8>,
    pub parameter: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_type: TxType,
    pub payload_version: u8,
    pub payload: Payload,
    pub attributes: Vec<Attribute>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub lock_time: u32,
    pub programs: Vec<Program>,
    /// Native fee, filled in once the transaction has been validated.
    #[serde(skip)]
    fee: Option<Fixed64>,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash() && self.programs == other.programs
    }
}

impl Eq for Transaction {}

impl Transaction {
    /// A transaction whose type follows its payload.
    pub fn new(payload: Payload, inputs: Vec<Input>, outputs: Vec<Output>) -> Self {
        Self {
            tx_type: payload.tx_type(),
            payload_version: 0,
            payload,
            attributes: Vec::new(),
            inputs,
            outputs,
            lock_time: 0,
            programs: Vec::new(),
            fee: None,
        }
    }

    /// Hash over everything except the unlocking programs and cached fee.
    pub fn hash(&self) -> TxHash {
        TxHash::digest(&self.encode_unsigned())
    }

    pub fn encode_unsigned(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.u8(self.tx_type.as_u8()).u8(self.payload_version);
        self.payload.encode(&mut enc);
        enc.u32(self.attributes.len() as u32);
        for attr in &self.attributes {
            enc.u8(attr.usage).var_bytes(&attr.data);
        }
        enc.u32(self.inputs.len() as u32);
        for input in &self.inputs {
            enc.fixed(input.previous.tx_id.as_bytes())
                .u16(input.previous.index)
                .u32(input.sequence);
        }
        enc.u32(self.outputs.len() as u32);
        for output in &self.outputs {
            enc.fixed(output.asset_id.as_bytes())
                .i64(output.value.raw())
                .token(&output.token_value)
                .u32(output.output_lock)
                .fixed(output.program_hash.as_bytes());
        }
        enc.u32(self.lock_time);
        enc.finish()
    }

    pub fn is_coinbase(&self) -> bool {
        self.tx_type == TxType::Coinbase
    }

    pub fn is_register_asset(&self) -> bool {
        self.tx_type == TxType::RegisterAsset
    }

    pub fn is_deposit(&self) -> bool {
        self.tx_type == TxType::Deposit
    }

    pub fn is_withdrawal(&self) -> bool {
        self.tx_type == TxType::Withdrawal
    }

    pub fn register_asset_payload(&self) -> Option<&RegisterAssetPayload> {
        match &self.payload {
            Payload::RegisterAsset(p) => Some(p),
            _ => None,
        }
    }

    pub fn deposit_payload(&self) -> Option<&DepositPayload> {
        match &self.payload {
            Payload::Deposit(p) => Some(p),
            _ => None,
        }
    }

    pub fn withdrawal_payload(&self) -> Option<&WithdrawalPayload> {
        match &self.payload {
            Payload::Withdrawal(p) => Some(p),
            _ => None,
        }
    }

    pub fn outpoints(&self) -> impl Iterator<Item = &OutPoint> {
        self.inputs.iter().map(|i| &i.previous)
    }

    pub fn fee(&self) -> Option<Fixed64> {
        self.fee
    }

    pub fn set_fee(&mut self, fee: Fixed64) {
        self.fee = Some(fee);
    }

    pub fn with_lock_time(mut self, lock_time: u32) -> Self {
        self.lock_time = lock_time;
        self
    }
}
