//! Chain Store: applies blocks to the asset registry and the unspent output
//! index as one atomic batch, and reverses them on rollback.
//!
//! Block application and rollback hold the write side of a lock for their
//! whole duration. Every read used for validation or queries goes through a
//! [`LedgerView`], which holds the read side, so readers observe either the
//! state before a block or the state after it, never a mix.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use serde::Serialize;
use tokenchain_store::keys::{
    asset_key, block_key, deposit_key, height_key, meta_key, transaction_key, META_TIP,
};
use tokenchain_store::KvStore;
use tokenchain_transactions::{Block, OutPoint, Output, Transaction};
use tokenchain_types::{AssetId, BlockHash, ChainParams, ProgramHash, TxHash};

use crate::asset_registry::AssetRegistry;
use crate::error::{decode, encode};
use crate::pending::{Committed, KvRead, PendingBatch};
use crate::records::{AssetInfo, ChainTip, StoredTransaction, UtxoBucket, UtxoRecord};
use crate::unspent_index::{BucketCursor, Flow, UnspentIndex, UtxoPage};
use crate::LedgerError;

/// An input together with the output it spends.
#[derive(Clone, Debug)]
pub struct ResolvedInput {
    pub outpoint: OutPoint,
    pub output: Output,
    /// Height of the block that created the output.
    pub height: u32,
    pub from_coinbase: bool,
}

/// Borrowed form of [`StoredTransaction`], encoded identically.
#[derive(Serialize)]
struct StoredTransactionRef<'a> {
    height: u32,
    tx: &'a Transaction,
}

/// Ownership buckets touched while staging one block.
#[derive(Default)]
struct BucketCache {
    buckets: BTreeMap<(ProgramHash, AssetId, u32), Vec<UtxoRecord>>,
}

impl BucketCache {
    fn load(
        &mut self,
        store: &impl KvRead,
        owner: ProgramHash,
        asset: AssetId,
        height: u32,
        flow: Flow,
    ) -> Result<&mut Vec<UtxoRecord>, LedgerError> {
        match self.buckets.entry((owner, asset, height)) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let records = UnspentIndex::snapshot(store, &owner, &asset, height, flow)?;
                Ok(e.insert(records))
            }
        }
    }

    fn flush(self, batch: &mut PendingBatch<'_>) -> Result<(), LedgerError> {
        for ((owner, asset, height), records) in self.buckets {
            UnspentIndex::write_bucket(batch, &owner, &asset, height, records)?;
        }
        Ok(())
    }
}

pub struct ChainStore {
    kv: Arc<dyn KvStore>,
    params: ChainParams,
    tip: RwLock<Option<ChainTip>>,
}

impl ChainStore {
    /// Open the chain store over `kv`, reloading the tip and making sure the
    /// native asset is registered.
    pub fn open(kv: Arc<dyn KvStore>, params: ChainParams) -> Result<Self, LedgerError> {
        let tip: Option<ChainTip> = match kv.get(&meta_key(META_TIP))? {
            Some(bytes) => Some(decode(&bytes)?),
            None => None,
        };
        let native_key = asset_key(&params.native_asset_id);
        if kv.get(&native_key)?.is_none() {
            kv.put(&native_key, &encode(&AssetRegistry::native_record())?)?;
            tracing::debug!(asset = %params.native_asset_id, "seeded native asset");
        }
        tracing::debug!(tip = ?tip.map(|t| t.height), "opened chain store");
        Ok(Self {
            kv,
            params,
            tip: RwLock::new(tip),
        })
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// A consistent read-only view. Blocks are not applied while it lives.
    pub fn view(&self) -> LedgerView<'_> {
        LedgerView {
            store: self,
            tip: self.tip.read().unwrap_or_else(PoisonError::into_inner),
        }
    }

    pub fn tip(&self) -> Option<ChainTip> {
        *self.tip.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a block on top of the tip. Either every effect is committed or
    /// none is.
    pub fn apply_block(&self, block: &Block) -> Result<(), LedgerError> {
        let mut tip = self.tip.write().unwrap_or_else(PoisonError::into_inner);
        let height = block.height();
        let extends = match *tip {
            None => height == 0,
            Some(t) => t.height.checked_add(1) == Some(height) && block.header.previous == t.hash,
        };
        if !extends {
            return Err(LedgerError::DoesNotExtendTip {
                height,
                tip_height: tip.map(|t| t.height),
            });
        }

        let new_tip = ChainTip::of(block);
        let mut batch = PendingBatch::new(self.kv.as_ref());
        self.stage_apply(&mut batch, block)?;
        batch.put(block_key(&new_tip.hash), encode(block)?);
        batch.put(height_key(height), new_tip.hash.as_bytes().to_vec());
        batch.put(meta_key(META_TIP), encode(&new_tip)?);

        self.kv.commit(batch.into_write_batch())?;
        *tip = Some(new_tip);
        tracing::debug!(
            height,
            hash = %new_tip.hash,
            txs = block.transactions.len(),
            "applied block"
        );
        Ok(())
    }

    /// Roll back the tip block, restoring the state from before it was
    /// applied.
    pub fn unapply_block(&self, block: &Block) -> Result<(), LedgerError> {
        let mut tip = self.tip.write().unwrap_or_else(PoisonError::into_inner);
        let hash = block.hash();
        match *tip {
            Some(t) if t.hash == hash => {}
            _ => return Err(LedgerError::NotTip(hash)),
        }
        let height = block.height();
        if height == 0 {
            return Err(LedgerError::GenesisRollback);
        }

        let new_tip = ChainTip {
            height: height - 1,
            hash: block.header.previous,
        };
        let mut batch = PendingBatch::new(self.kv.as_ref());
        self.stage_unapply(&mut batch, block)?;
        batch.delete(block_key(&hash));
        batch.delete(height_key(height));
        batch.put(meta_key(META_TIP), encode(&new_tip)?);

        self.kv.commit(batch.into_write_batch())?;
        *tip = Some(new_tip);
        tracing::debug!(height, hash = %hash, "unapplied block");
        Ok(())
    }

    fn stage_apply(&self, batch: &mut PendingBatch<'_>, block: &Block) -> Result<(), LedgerError> {
        let native = self.params.native_asset_id;
        let height = block.height();
        let hashes: Vec<TxHash> = block.transactions.iter().map(|tx| tx.hash()).collect();
        let mut buckets = BucketCache::default();

        // New outputs land in this block's height bucket.
        let mut seen = HashSet::new();
        for (tx, tx_id) in block.transactions.iter().zip(&hashes) {
            if !seen.insert(*tx_id) || batch.read(&transaction_key(tx_id))?.is_some() {
                return Err(LedgerError::DuplicateTransaction(*tx_id));
            }
            for (index, output) in tx.outputs.iter().enumerate() {
                let record =
                    UtxoRecord::from_output(*tx_id, output_index(tx_id, index)?, output, &native);
                buckets
                    .load(&*batch, output.program_hash, output.asset_id, height, Flow::Insert)?
                    .push(record);
            }
        }

        // Spent outputs leave the bucket of the height that created them.
        for tx in block.transactions.iter().filter(|tx| !tx.is_coinbase()) {
            for input in &tx.inputs {
                let outpoint = input.previous;
                let (output, created_at) = self.referenced_output(&*batch, &outpoint)?;
                let bucket = buckets.load(
                    &*batch,
                    output.program_hash,
                    output.asset_id,
                    created_at,
                    Flow::Remove,
                )?;
                let pos = bucket
                    .iter()
                    .position(|r| r.outpoint() == outpoint)
                    .ok_or(LedgerError::UtxoNotFound { outpoint })?;
                bucket.remove(pos);
            }
        }
        buckets.flush(batch)?;

        for (tx, tx_id) in block.transactions.iter().zip(&hashes) {
            batch.put(
                transaction_key(tx_id),
                encode(&StoredTransactionRef { height, tx })?,
            );
            if let Some(registration) = tx.register_asset_payload() {
                // The genesis registration of the native asset is seeded on open.
                if AssetId::from(*tx_id) != native {
                    AssetRegistry::register(batch, registration, *tx_id, height)?;
                }
            }
            if let Some(deposit) = tx.deposit_payload() {
                let foreign = deposit.foreign_tx_hash();
                let key = deposit_key(&foreign);
                if batch.read(&key)?.is_some() {
                    return Err(LedgerError::DepositAlreadyConsumed(foreign));
                }
                batch.put(key, height.to_be_bytes().to_vec());
            }
        }

        for (tx, tx_id) in block.transactions.iter().zip(&hashes) {
            let indices = (0..tx.outputs.len())
                .map(|index| output_index(tx_id, index))
                .collect::<Result<_, _>>()?;
            UnspentIndex::write_unspent(batch, tx_id, indices)?;
        }
        for tx in block.transactions.iter().filter(|tx| !tx.is_coinbase()) {
            for input in &tx.inputs {
                UnspentIndex::mark_spent(batch, &input.previous)?;
            }
        }
        Ok(())
    }

    fn stage_unapply(
        &self,
        batch: &mut PendingBatch<'_>,
        block: &Block,
    ) -> Result<(), LedgerError> {
        let native = self.params.native_asset_id;
        let height = block.height();
        let mut buckets = BucketCache::default();

        for tx in block.transactions.iter().rev() {
            let tx_id = tx.hash();
            for (index, output) in tx.outputs.iter().enumerate() {
                let outpoint = OutPoint::new(tx_id, output_index(&tx_id, index)?);
                let bucket = buckets.load(
                    &*batch,
                    output.program_hash,
                    output.asset_id,
                    height,
                    Flow::Remove,
                )?;
                let pos = bucket
                    .iter()
                    .position(|r| r.outpoint() == outpoint)
                    .ok_or(LedgerError::UtxoNotFound { outpoint })?;
                bucket.remove(pos);
            }
            UnspentIndex::write_unspent(batch, &tx_id, Vec::new())?;

            if !tx.is_coinbase() {
                for input in &tx.inputs {
                    let outpoint = input.previous;
                    let (output, created_at) = self.referenced_output(&*batch, &outpoint)?;
                    let record =
                        UtxoRecord::from_output(outpoint.tx_id, outpoint.index, &output, &native);
                    buckets
                        .load(
                            &*batch,
                            output.program_hash,
                            output.asset_id,
                            created_at,
                            Flow::Insert,
                        )?
                        .push(record);
                    UnspentIndex::mark_unspent(batch, &outpoint)?;
                }
            }

            if let Some(registration) = tx.register_asset_payload() {
                if AssetId::from(tx_id) != native {
                    AssetRegistry::unregister(batch, &registration.asset.id(), &native)?;
                }
            }
            if let Some(deposit) = tx.deposit_payload() {
                batch.delete(deposit_key(&deposit.foreign_tx_hash()));
            }
            batch.delete(transaction_key(&tx_id));
        }
        buckets.flush(batch)
    }

    fn referenced_output(
        &self,
        store: &impl KvRead,
        outpoint: &OutPoint,
    ) -> Result<(Output, u32), LedgerError> {
        let stored = load_transaction(store, &outpoint.tx_id)?
            .ok_or(LedgerError::UnknownReference { tx: outpoint.tx_id })?;
        let outputs = stored.tx.outputs.len();
        let output = stored
            .tx
            .outputs
            .into_iter()
            .nth(outpoint.index as usize)
            .ok_or(LedgerError::ReferenceOutOfRange {
                outpoint: *outpoint,
                outputs,
            })?;
        Ok((output, stored.height))
    }

    pub fn get_asset(&self, id: &AssetId) -> Result<Option<AssetInfo>, LedgerError> {
        self.view().get_asset(id)
    }

    pub fn list_assets(&self) -> Result<Vec<(AssetId, AssetInfo)>, LedgerError> {
        self.view().list_assets()
    }

    pub fn owned_by(
        &self,
        owner: &ProgramHash,
    ) -> Result<BTreeMap<AssetId, Vec<UtxoRecord>>, LedgerError> {
        self.view().owned_by(owner)
    }
}

fn load_transaction(
    store: &impl KvRead,
    hash: &TxHash,
) -> Result<Option<StoredTransaction>, LedgerError> {
    match store.read(&transaction_key(hash))? {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}

fn output_index(tx: &TxHash, index: usize) -> Result<u16, LedgerError> {
    u16::try_from(index).map_err(|_| LedgerError::TooManyOutputs {
        tx: *tx,
        outputs: index + 1,
    })
}

/// Read access to committed ledger state under the shared lock.
pub struct LedgerView<'a> {
    store: &'a ChainStore,
    tip: RwLockReadGuard<'a, Option<ChainTip>>,
}

impl<'a> LedgerView<'a> {
    fn committed(&self) -> Committed<'_> {
        Committed(self.store.kv.as_ref())
    }

    pub fn params(&self) -> &ChainParams {
        &self.store.params
    }

    pub fn tip(&self) -> Option<ChainTip> {
        *self.tip
    }

    /// Height of the tip, zero on an empty chain.
    pub fn height(&self) -> u32 {
        self.tip.map(|t| t.height).unwrap_or(0)
    }

    pub fn get_transaction(&self, hash: &TxHash) -> Result<Option<StoredTransaction>, LedgerError> {
        load_transaction(&self.committed(), hash)
    }

    pub fn contains_transaction(&self, hash: &TxHash) -> Result<bool, LedgerError> {
        Ok(self.store.kv.contains(&transaction_key(hash))?)
    }

    /// Resolve every input of `tx` to the output it spends.
    pub fn resolve_inputs(&self, tx: &Transaction) -> Result<Vec<ResolvedInput>, LedgerError> {
        tx.inputs
            .iter()
            .map(|input| -> Result<ResolvedInput, LedgerError> {
                let outpoint = input.previous;
                let stored = self
                    .get_transaction(&outpoint.tx_id)?
                    .ok_or(LedgerError::UnknownReference { tx: outpoint.tx_id })?;
                let outputs = stored.tx.outputs.len();
                let from_coinbase = stored.tx.is_coinbase();
                let output = stored
                    .tx
                    .outputs
                    .into_iter()
                    .nth(outpoint.index as usize)
                    .ok_or(LedgerError::ReferenceOutOfRange { outpoint, outputs })?;
                Ok(ResolvedInput {
                    outpoint,
                    output,
                    height: stored.height,
                    from_coinbase,
                })
            })
            .collect()
    }

    /// Whether `outpoint` is still listed in the per-transaction unspent index.
    pub fn is_unspent(&self, outpoint: &OutPoint) -> Result<bool, LedgerError> {
        Ok(self.unspent_indices(&outpoint.tx_id)?.contains(&outpoint.index))
    }

    pub fn unspent_indices(&self, tx: &TxHash) -> Result<Vec<u16>, LedgerError> {
        UnspentIndex::unspent_indices(&self.committed(), tx)
    }

    pub fn is_deposit_consumed(&self, foreign_tx: &TxHash) -> Result<bool, LedgerError> {
        Ok(self.store.kv.contains(&deposit_key(foreign_tx))?)
    }

    pub fn get_asset(&self, id: &AssetId) -> Result<Option<AssetInfo>, LedgerError> {
        AssetRegistry::get(&self.committed(), id)
    }

    pub fn list_assets(&self) -> Result<Vec<(AssetId, AssetInfo)>, LedgerError> {
        AssetRegistry::list(&self.committed())
    }

    pub fn asset_name_exists(&self, name: &str) -> Result<bool, LedgerError> {
        AssetRegistry::name_exists(&self.committed(), name)
    }

    pub fn owned_by(
        &self,
        owner: &ProgramHash,
    ) -> Result<BTreeMap<AssetId, Vec<UtxoRecord>>, LedgerError> {
        UnspentIndex::owned_by(self.store.kv.as_ref(), owner)
    }

    pub fn owned_by_paged(
        &self,
        owner: &ProgramHash,
        start_after: Option<BucketCursor>,
        limit: usize,
    ) -> Result<UtxoPage, LedgerError> {
        UnspentIndex::owned_by_paged(self.store.kv.as_ref(), owner, start_after, limit)
    }

    /// Every ownership bucket of `owner`, with creation heights.
    pub fn buckets_of(&self, owner: &ProgramHash) -> Result<Vec<UtxoBucket>, LedgerError> {
        let mut buckets = Vec::new();
        UnspentIndex::for_each_bucket(self.store.kv.as_ref(), owner, None, &mut |bucket| {
            buckets.push(bucket);
            std::ops::ControlFlow::Continue(())
        })?;
        Ok(buckets)
    }

    pub fn get_block(&self, hash: &BlockHash) -> Result<Option<Block>, LedgerError> {
        match self.store.kv.get(&block_key(hash))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn block_hash_at(&self, height: u32) -> Result<Option<BlockHash>, LedgerError> {
        match self.store.kv.get(&height_key(height))? {
            Some(bytes) => {
                let hash: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    tokenchain_store::StoreError::Corruption(format!(
                        "height index entry of {} bytes",
                        bytes.len()
                    ))
                })?;
                Ok(Some(BlockHash::new(hash)))
            }
            None => Ok(None),
        }
    }

    pub(crate) fn kv(&self) -> &dyn KvStore {
        self.store.kv.as_ref()
    }
}
