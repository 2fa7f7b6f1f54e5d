//! Persisted key layout.
//!
//! Every record lives in one keyspace and is distinguished by a one-byte
//! tag. Heights are big-endian so range scans order by height.
//!
//! | tag | key | value |
//! |---|---|---|
//! | `BLOCK` | block hash | block |
//! | `TRANSACTION` | tx hash | stored transaction (height + body) |
//! | `META` | name | raw bytes |
//! | `HEIGHT` | height (BE u32) | block hash |
//! | `UNSPENT` | tx hash | unspent output indices |
//! | `UTXO` | owner, asset id, height (BE u32) | UTXO record list |
//! | `DEPOSIT` | main chain tx hash | deposit height |
//! | `ASSET` | asset id | asset record |

use tokenchain_types::{AssetId, BlockHash, ProgramHash, TxHash};

use crate::StoreError;

pub const BLOCK: u8 = 0x01;
pub const TRANSACTION: u8 = 0x02;
pub const META: u8 = 0x40;
pub const HEIGHT: u8 = 0x80;
pub const UNSPENT: u8 = 0x90;
pub const UTXO: u8 = 0x91;
pub const DEPOSIT: u8 = 0x92;
pub const ASSET: u8 = 0xc0;

/// Every tag, with a label for reports.
pub const ALL_TAGS: [(u8, &str); 8] = [
    (BLOCK, "blocks"),
    (TRANSACTION, "transactions"),
    (META, "meta"),
    (HEIGHT, "heights"),
    (UNSPENT, "unspent"),
    (UTXO, "utxo_buckets"),
    (DEPOSIT, "deposits"),
    (ASSET, "assets"),
];

pub const META_TIP: &str = "tip";
pub const META_SCHEMA_VERSION: &str = "schema_version";

const OWNER_LEN: usize = 21;
const UTXO_KEY_LEN: usize = 1 + OWNER_LEN + 32 + 4;

fn tagged(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + body.len());
    key.push(tag);
    key.extend_from_slice(body);
    key
}

pub fn block_key(hash: &BlockHash) -> Vec<u8> {
    tagged(BLOCK, hash.as_bytes())
}

pub fn transaction_key(hash: &TxHash) -> Vec<u8> {
    tagged(TRANSACTION, hash.as_bytes())
}

pub fn meta_key(name: &str) -> Vec<u8> {
    tagged(META, name.as_bytes())
}

pub fn height_key(height: u32) -> Vec<u8> {
    tagged(HEIGHT, &height.to_be_bytes())
}

pub fn unspent_key(tx: &TxHash) -> Vec<u8> {
    tagged(UNSPENT, tx.as_bytes())
}

pub fn deposit_key(foreign_tx: &TxHash) -> Vec<u8> {
    tagged(DEPOSIT, foreign_tx.as_bytes())
}

pub fn asset_key(id: &AssetId) -> Vec<u8> {
    tagged(ASSET, id.as_bytes())
}

/// Ownership bucket key: `{UTXO}{owner}{asset}{height BE}`.
pub fn utxo_bucket_key(owner: &ProgramHash, asset: &AssetId, height: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(UTXO_KEY_LEN);
    key.push(UTXO);
    key.extend_from_slice(owner.as_bytes());
    key.extend_from_slice(asset.as_bytes());
    key.extend_from_slice(&height.to_be_bytes());
    key
}

/// Prefix covering every bucket owned by `owner`.
pub fn utxo_owner_prefix(owner: &ProgramHash) -> Vec<u8> {
    tagged(UTXO, owner.as_bytes())
}

/// Split an ownership bucket key back into its parts.
pub fn decode_utxo_bucket_key(key: &[u8]) -> Result<(ProgramHash, AssetId, u32), StoreError> {
    if key.len() != UTXO_KEY_LEN || key[0] != UTXO {
        return Err(StoreError::Corruption(format!(
            "malformed utxo bucket key of {} bytes",
            key.len()
        )));
    }
    let mut owner = [0u8; OWNER_LEN];
    owner.copy_from_slice(&key[1..1 + OWNER_LEN]);
    let mut asset = [0u8; 32];
    asset.copy_from_slice(&key[1 + OWNER_LEN..1 + OWNER_LEN + 32]);
    let mut height = [0u8; 4];
    height.copy_from_slice(&key[UTXO_KEY_LEN - 4..]);
    Ok((
        ProgramHash::new(owner),
        AssetId::new(asset),
        u32::from_be_bytes(height),
    ))
}

/// Recover the transaction hash from an `UNSPENT` key.
pub fn decode_unspent_key(key: &[u8]) -> Result<TxHash, StoreError> {
    if key.len() != 33 || key[0] != UNSPENT {
        return Err(StoreError::Corruption(format!(
            "malformed unspent key of {} bytes",
            key.len()
        )));
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&key[1..]);
    Ok(TxHash::new(hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenchain_types::address::PREFIX_STANDARD;

    #[test]
    fn bucket_key_round_trip() {
        let owner = ProgramHash::with_prefix(PREFIX_STANDARD, [3; 20]);
        let asset = AssetId::new([9; 32]);
        let key = utxo_bucket_key(&owner, &asset, 0x0102_0304);
        assert!(key.starts_with(&utxo_owner_prefix(&owner)));
        assert_eq!(&key[key.len() - 4..], &[1, 2, 3, 4]);
        assert_eq!(
            decode_utxo_bucket_key(&key).unwrap(),
            (owner, asset, 0x0102_0304)
        );
    }

    #[test]
    fn bucket_keys_order_by_height() {
        let owner = ProgramHash::BURN;
        let asset = AssetId::ZERO;
        assert!(utxo_bucket_key(&owner, &asset, 255) < utxo_bucket_key(&owner, &asset, 256));
    }

    #[test]
    fn malformed_keys_are_corruption() {
        assert!(matches!(
            decode_utxo_bucket_key(&[UTXO, 1, 2]),
            Err(StoreError::Corruption(_))
        ));
        assert!(decode_unspent_key(&unspent_key(&TxHash::ZERO)).is_ok());
        assert!(decode_unspent_key(&asset_key(&AssetId::ZERO)).is_err());
    }
}
