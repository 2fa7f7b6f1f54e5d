//! Chain parameters shared by the ledger, the validator and the node.
//!
//! Loaded from the `[chain]` table of the node configuration. Every field has
//! a default so an empty table is valid.

use serde::{Deserialize, Serialize};

use crate::{AssetId, Fixed64, ProgramHash, TxType};

/// Reserved name of the native asset.
pub const NATIVE_ASSET_NAME: &str = "ELA";

/// Default id of the native asset (hash of the genesis registration).
pub const DEFAULT_NATIVE_ASSET_ID: &str =
    "b037db964a231458d2d6ffd5ea18944c4f90e63d547c5d3b9874df66a4ead0a3";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    /// Id of the native asset, hex encoded in configuration files.
    #[serde(with = "hex_asset_id")]
    pub native_asset_id: AssetId,

    /// Recipient that must receive at least 30% of every coinbase, given as
    /// an address string in configuration files.
    #[serde(rename = "foundation_address", with = "address_string")]
    pub foundation: ProgramHash,

    /// Minimum native fee for ordinary transactions.
    pub min_tx_fee: Fixed64,

    /// Minimum native fee for deposit and withdrawal transactions.
    pub min_cross_chain_tx_fee: Fixed64,

    /// Minimum native fee for asset registration.
    pub min_register_asset_tx_fee: Fixed64,

    /// Confirmations a coinbase output needs before it can be spent.
    pub spend_coinbase_span: u32,

    /// Main chain to side chain conversion rate for deposits.
    pub exchange_rate: f64,

    /// Lowest precision a registered asset may declare.
    pub min_precision: u8,

    pub max_tx_per_block: usize,

    /// Transaction types allowed to create token value (negative token fee).
    pub token_mint_tx_types: Vec<TxType>,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            native_asset_id: DEFAULT_NATIVE_ASSET_ID
                .parse()
                .unwrap_or(AssetId::ZERO),
            foundation: ProgramHash::BURN,
            min_tx_fee: Fixed64::new(100),
            min_cross_chain_tx_fee: Fixed64::new(10_000),
            min_register_asset_tx_fee: Fixed64::new(1_000_000_000),
            spend_coinbase_span: 100,
            exchange_rate: 1.0,
            min_precision: 0,
            max_tx_per_block: 10_000,
            token_mint_tx_types: vec![TxType::RegisterAsset],
        }
    }
}

impl ChainParams {
    pub fn is_native(&self, asset: &AssetId) -> bool {
        *asset == self.native_asset_id
    }

    /// Whether transactions of this type may end with a negative token fee.
    pub fn may_mint_tokens(&self, tx_type: TxType) -> bool {
        self.token_mint_tx_types.contains(&tx_type)
    }

    /// Minimum native fee for a transaction of the given type.
    pub fn min_fee_for(&self, tx_type: TxType) -> Fixed64 {
        match tx_type {
            TxType::RegisterAsset => self.min_register_asset_tx_fee,
            TxType::Deposit | TxType::Withdrawal => self.min_cross_chain_tx_fee,
            _ => self.min_tx_fee,
        }
    }
}

mod hex_asset_id {
    use crate::AssetId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &AssetId, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<AssetId, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

mod address_string {
    use crate::ProgramHash;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &ProgramHash, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hash.to_address())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ProgramHash, D::Error> {
        let s = String::deserialize(d)?;
        ProgramHash::from_address(&s).map_err(serde::de::Error::custom)
    }
}
