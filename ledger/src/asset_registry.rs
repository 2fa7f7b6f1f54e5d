//! Asset Registry: asset id to declared attributes.

use tokenchain_store::keys::{asset_key, ASSET};
use tokenchain_store::StoreError;
use tokenchain_transactions::{AssetType, RegisterAssetPayload};
use tokenchain_types::{AssetId, ProgramHash, TxHash, NATIVE_ASSET_NAME, NATIVE_PRECISION};

use crate::error::{decode, encode};
use crate::pending::{KvRead, PendingBatch};
use crate::records::AssetInfo;
use crate::LedgerError;

pub struct AssetRegistry;

impl AssetRegistry {
    pub(crate) fn get(
        store: &impl KvRead,
        id: &AssetId,
    ) -> Result<Option<AssetInfo>, LedgerError> {
        match store.read(&asset_key(id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn list(store: &impl KvRead) -> Result<Vec<(AssetId, AssetInfo)>, LedgerError> {
        store
            .read_prefix(&[ASSET])?
            .into_iter()
            .map(|(key, value)| -> Result<(AssetId, AssetInfo), LedgerError> {
                let id: [u8; 32] = key[1..].try_into().map_err(|_| {
                    StoreError::Corruption(format!("malformed asset key of {} bytes", key.len()))
                })?;
                Ok((AssetId::new(id), decode(&value)?))
            })
            .collect()
    }

    pub(crate) fn name_exists(store: &impl KvRead, name: &str) -> Result<bool, LedgerError> {
        Ok(Self::list(store)?.iter().any(|(_, info)| info.name == name))
    }

    /// Record a registration. Refuses the reserved native name and names
    /// already taken.
    pub(crate) fn register(
        batch: &mut PendingBatch<'_>,
        registration: &RegisterAssetPayload,
        registering_tx: TxHash,
        height: u32,
    ) -> Result<AssetId, LedgerError> {
        let name = &registration.asset.name;
        if name == NATIVE_ASSET_NAME {
            return Err(LedgerError::ReservedAssetName(name.clone()));
        }
        if Self::name_exists(&*batch, name)? {
            return Err(LedgerError::DuplicateAssetName(name.clone()));
        }
        let id = registration.asset.id();
        let info = AssetInfo {
            name: name.clone(),
            description: registration.asset.description.clone(),
            precision: registration.asset.precision,
            asset_type: registration.asset.asset_type,
            controller: registration.controller,
            height,
            registered_by: registering_tx,
        };
        batch.put(asset_key(&id), encode(&info)?);
        Ok(id)
    }

    /// Remove a registration during rollback. The native asset is permanent.
    pub(crate) fn unregister(
        batch: &mut PendingBatch<'_>,
        id: &AssetId,
        native_asset: &AssetId,
    ) -> Result<(), LedgerError> {
        if id == native_asset {
            return Err(LedgerError::NativeAssetRollback);
        }
        if Self::get(&*batch, id)?.is_none() {
            return Err(LedgerError::AssetNotFound(*id));
        }
        batch.delete(asset_key(id));
        Ok(())
    }

    /// The record seeded for the native asset on first open.
    pub(crate) fn native_record() -> AssetInfo {
        AssetInfo {
            name: NATIVE_ASSET_NAME.to_string(),
            description: String::new(),
            precision: NATIVE_PRECISION,
            asset_type: AssetType::Token,
            controller: ProgramHash::BURN,
            height: 0,
            registered_by: TxHash::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::Committed;
    use tokenchain_nullables::NullStore;
    use tokenchain_store::KvStore;
    use tokenchain_transactions::AssetDescriptor;
    use tokenchain_types::Fixed64;

    fn registration(name: &str) -> RegisterAssetPayload {
        RegisterAssetPayload {
            asset: AssetDescriptor {
                name: name.to_string(),
                description: "d".to_string(),
                precision: 8,
                asset_type: AssetType::Token,
            },
            amount: Fixed64::new(1000),
            controller: ProgramHash::BURN,
        }
    }

    #[test]
    fn reserved_name_always_fails() {
        let store = NullStore::new();
        let mut batch = PendingBatch::new(&store);
        let err = AssetRegistry::register(&mut batch, &registration("ELA"), TxHash::ZERO, 1)
            .unwrap_err();
        assert!(matches!(err, LedgerError::ReservedAssetName(_)));
    }

    #[test]
    fn reserved_name_is_case_sensitive() {
        let store = NullStore::new();
        let mut batch = PendingBatch::new(&store);
        assert!(AssetRegistry::register(&mut batch, &registration("ela"), TxHash::ZERO, 1).is_ok());
    }

    #[test]
    fn duplicate_name_in_same_batch_fails() {
        let store = NullStore::new();
        let mut batch = PendingBatch::new(&store);
        AssetRegistry::register(&mut batch, &registration("GOLD"), TxHash::ZERO, 1).unwrap();
        let err = AssetRegistry::register(&mut batch, &registration("GOLD"), TxHash::ZERO, 1)
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateAssetName(_)));
    }

    #[test]
    fn register_then_unregister() {
        let store = NullStore::new();
        let native = AssetId::new([0xee; 32]);
        let mut batch = PendingBatch::new(&store);
        let id = AssetRegistry::register(&mut batch, &registration("GOLD"), TxHash::ZERO, 3)
            .unwrap();
        store.commit(batch.into_write_batch()).unwrap();

        let info = AssetRegistry::get(&Committed(&store), &id).unwrap().unwrap();
        assert_eq!(info.height, 3);
        assert_eq!(AssetRegistry::list(&Committed(&store)).unwrap().len(), 1);

        let mut batch = PendingBatch::new(&store);
        AssetRegistry::unregister(&mut batch, &id, &native).unwrap();
        store.commit(batch.into_write_batch()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn native_asset_cannot_be_unregistered() {
        let store = NullStore::new();
        let native = AssetId::new([0xee; 32]);
        let mut batch = PendingBatch::new(&store);
        assert!(matches!(
            AssetRegistry::unregister(&mut batch, &native, &native),
            Err(LedgerError::NativeAssetRollback)
        ));
    }
}
