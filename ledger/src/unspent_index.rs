//! Unspent Output Index.
//!
//! Two views of the same set of unspent outputs:
//! - ownership buckets keyed `(owner, asset, creation height)`, each holding
//!   the records written by one block, for balance and listing queries;
//! - per-transaction lists of still-unspent output indices, for O(1)
//!   spent checks.
//!
//! Both are sorted on write so that applying and then unapplying a block
//! restores byte-identical values.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use tokenchain_store::keys::{
    decode_utxo_bucket_key, unspent_key, utxo_bucket_key, utxo_owner_prefix,
};
use tokenchain_store::KvStore;
use tokenchain_transactions::OutPoint;
use tokenchain_types::{AssetId, ProgramHash, TxHash};

use crate::error::{decode, encode};
use crate::pending::{KvRead, PendingBatch};
use crate::records::{UtxoBucket, UtxoRecord};
use crate::LedgerError;

/// Whether a bucket read happens while inserting or removing records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// A missing bucket is simply empty.
    Insert,
    /// A missing bucket means the index is corrupt.
    Remove,
}

/// Position after which a paged ownership scan resumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketCursor {
    pub asset_id: AssetId,
    pub height: u32,
}

#[derive(Clone, Debug, Default)]
pub struct UtxoPage {
    pub buckets: Vec<UtxoBucket>,
    /// Present when more buckets may follow.
    pub next: Option<BucketCursor>,
}

pub struct UnspentIndex;

impl UnspentIndex {
    pub(crate) fn snapshot(
        store: &impl KvRead,
        owner: &ProgramHash,
        asset: &AssetId,
        height: u32,
        flow: Flow,
    ) -> Result<Vec<UtxoRecord>, LedgerError> {
        match store.read(&utxo_bucket_key(owner, asset, height))? {
            Some(bytes) => Ok(decode(&bytes)?),
            None if flow == Flow::Insert => Ok(Vec::new()),
            None => Err(LedgerError::UtxoBucketMissing {
                owner: *owner,
                asset: *asset,
                height,
            }),
        }
    }

    /// Replace a bucket wholesale. An empty list deletes the key.
    pub(crate) fn write_bucket(
        batch: &mut PendingBatch<'_>,
        owner: &ProgramHash,
        asset: &AssetId,
        height: u32,
        mut records: Vec<UtxoRecord>,
    ) -> Result<(), LedgerError> {
        let key = utxo_bucket_key(owner, asset, height);
        if records.is_empty() {
            batch.delete(key);
            return Ok(());
        }
        records.sort_by_key(|r| (r.tx_id, r.index));
        batch.put(key, encode(&records)?);
        Ok(())
    }

    pub(crate) fn unspent_indices(
        store: &impl KvRead,
        tx: &TxHash,
    ) -> Result<Vec<u16>, LedgerError> {
        match store.read(&unspent_key(tx))? {
            Some(bytes) => Ok(decode(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) fn write_unspent(
        batch: &mut PendingBatch<'_>,
        tx: &TxHash,
        mut indices: Vec<u16>,
    ) -> Result<(), LedgerError> {
        let key = unspent_key(tx);
        if indices.is_empty() {
            batch.delete(key);
            return Ok(());
        }
        indices.sort_unstable();
        batch.put(key, encode(&indices)?);
        Ok(())
    }

    pub(crate) fn mark_spent(
        batch: &mut PendingBatch<'_>,
        outpoint: &OutPoint,
    ) -> Result<(), LedgerError> {
        let mut indices = Self::unspent_indices(&*batch, &outpoint.tx_id)?;
        let pos = indices
            .iter()
            .position(|i| *i == outpoint.index)
            .ok_or(LedgerError::AlreadySpent {
                outpoint: *outpoint,
            })?;
        indices.remove(pos);
        Self::write_unspent(batch, &outpoint.tx_id, indices)
    }

    pub(crate) fn mark_unspent(
        batch: &mut PendingBatch<'_>,
        outpoint: &OutPoint,
    ) -> Result<(), LedgerError> {
        let mut indices = Self::unspent_indices(&*batch, &outpoint.tx_id)?;
        if indices.contains(&outpoint.index) {
            return Err(LedgerError::AlreadyUnspent {
                outpoint: *outpoint,
            });
        }
        indices.push(outpoint.index);
        Self::write_unspent(batch, &outpoint.tx_id, indices)
    }

    /// Every unspent output of `owner`, grouped by asset. Buckets are
    /// streamed from the store one at a time.
    pub(crate) fn owned_by(
        kv: &dyn KvStore,
        owner: &ProgramHash,
    ) -> Result<BTreeMap<AssetId, Vec<UtxoRecord>>, LedgerError> {
        let mut owned: BTreeMap<AssetId, Vec<UtxoRecord>> = BTreeMap::new();
        Self::for_each_bucket(kv, owner, None, &mut |bucket| {
            owned
                .entry(bucket.asset_id)
                .or_default()
                .extend(bucket.records);
            ControlFlow::Continue(())
        })?;
        Ok(owned)
    }

    /// Up to `limit` buckets of `owner`, resuming after `start_after`.
    pub(crate) fn owned_by_paged(
        kv: &dyn KvStore,
        owner: &ProgramHash,
        start_after: Option<BucketCursor>,
        limit: usize,
    ) -> Result<UtxoPage, LedgerError> {
        let mut page = UtxoPage::default();
        if limit == 0 {
            return Ok(page);
        }
        Self::for_each_bucket(kv, owner, start_after, &mut |bucket| {
            page.buckets.push(bucket);
            if page.buckets.len() >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        if page.buckets.len() >= limit {
            page.next = page.buckets.last().map(|b| BucketCursor {
                asset_id: b.asset_id,
                height: b.height,
            });
        }
        Ok(page)
    }

    pub(crate) fn for_each_bucket(
        kv: &dyn KvStore,
        owner: &ProgramHash,
        start_after: Option<BucketCursor>,
        visit: &mut dyn FnMut(UtxoBucket) -> ControlFlow<()>,
    ) -> Result<(), LedgerError> {
        let prefix = utxo_owner_prefix(owner);
        let start = start_after.map(|c| utxo_bucket_key(owner, &c.asset_id, c.height));
        kv.scan_prefix_from(&prefix, start.as_deref(), &mut |key, value| {
            let (owner, asset_id, height) = decode_utxo_bucket_key(key)?;
            let records: Vec<UtxoRecord> = decode(value)?;
            Ok(visit(UtxoBucket {
                owner,
                asset_id,
                height,
                records,
            }))
        })?;
        Ok(())
    }
}
